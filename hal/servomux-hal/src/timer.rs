//! Periodic timer abstractions
//!
//! The engine needs exactly one primitive from the timer: "call this handler
//! every N microseconds until told to stop". Re-arming after each interrupt is
//! the implementation's job.

/// Errors that can occur when binding a periodic timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerError {
    /// Requested interval cannot be produced by this timer
    InvalidInterval,
    /// Timer resource is missing or already claimed
    Unavailable,
}

/// Callback invoked from the timer interrupt
///
/// `on_tick` runs in interrupt context. Implementations must return in a
/// small, bounded fraction of the tick interval: no blocking, no allocation,
/// no logging.
pub trait TickHandler: Sync {
    /// Handle one timer period
    fn on_tick(&self);
}

/// Periodic interrupt source
pub trait PeriodicTimer {
    /// Start calling `handler` every `interval_us` microseconds
    ///
    /// Attaching while already attached replaces the handler and restarts the
    /// period.
    fn attach(
        &mut self,
        interval_us: u32,
        handler: &'static dyn TickHandler,
    ) -> Result<(), TimerError>;

    /// Stop calling the handler
    ///
    /// No-op if nothing is attached.
    fn detach(&mut self);
}
