//! Servo layout compiled in from servos.toml
//!
//! `build.rs` validates the file and generates the constants below, so a
//! malformed layout fails the build instead of the boot.

use servomux_core::config::{PulseRange, TimingConfig};

/// One configured servo output
#[derive(Debug, Clone, Copy)]
pub struct ServoSpec {
    /// GPIO number
    pub pin: u8,
    /// Pulse bounds for 0 and 180 degrees
    pub range: PulseRange,
    /// Swept back and forth by the sweep task
    pub sweep: bool,
}

include!(concat!(env!("OUT_DIR"), "/servo_layout.rs"));
