//! RP2040-specific adapters for the servo pulse engine
//!
//! This crate provides RP2040 implementations of the shared `servomux-hal`
//! traits:
//!
//! - GPIO pin bank keyed by pin number, for config-driven servo layouts
//! - Periodic tick source on the Cortex-M SysTick exception

#![no_std]

pub mod pins;
pub mod systick;

pub use pins::{PinBank, PinError};
pub use systick::SysTickTimer;
