//! Board-agnostic core of the servo pulse engine
//!
//! One periodic timer interrupt drives up to 16 hobby-servo control signals
//! on plain GPIO pins. This crate contains everything that does not depend on
//! a specific chip:
//!
//! - Timing and pulse-range configuration
//! - The servo table (slot arena, position/pulse-width mapping)
//! - The tick pass run from the timer interrupt
//! - The scheduler that guards both behind one critical section and manages
//!   the timer binding
//!
//! Pins and the timer are reached through the `servomux-hal` traits.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

#[macro_use]
mod fmt;

pub mod config;
pub mod error;
pub mod scheduler;
pub mod table;
pub mod tick;

#[cfg(test)]
mod mock;

pub use config::{ConfigError, PulseRange, TimingConfig, MAX_SERVOS};
pub use error::ServoError;
pub use scheduler::{ServoScheduler, TimerState};
pub use table::{Channel, ServoTable};
