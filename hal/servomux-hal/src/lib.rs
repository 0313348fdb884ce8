//! servomux Hardware Abstraction Layer
//!
//! This crate defines the two collaborators the servo engine depends on.
//! Chip-specific HALs implement them; the engine itself never touches
//! registers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (servomux-firmware, etc.)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  servomux-core (table + tick scheduler) │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  servomux-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!           ┌───────────────────┐
//!           │ servomux-hal-     │
//!           │    rp2040         │
//!           └───────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::ServoPins`] - Output pins addressed by number
//! - [`timer::PeriodicTimer`] - Periodic interrupt source
//! - [`timer::TickHandler`] - Callback invoked from the timer interrupt

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod timer;

// Re-export key traits at crate root for convenience
pub use gpio::{Level, ServoPins};
pub use timer::{PeriodicTimer, TickHandler, TimerError};
