//! Tick scheduler
//!
//! [`ServoScheduler`] owns the servo table, the cycle counter, the pins and
//! the timer behind a single `critical_section::Mutex`. Caller-facing
//! operations and the interrupt handler both go through that one critical
//! section, so a channel's `on_ticks` and `enabled` always change together
//! from the tick pass's point of view.
//!
//! On targets where the critical-section implementation masks interrupts and
//! takes a cross-core lock (RP2040 via embassy-rp), this excludes the timer
//! interrupt on the local core as well as callers on the other core.
//!
//! # Timer binding
//!
//! The timer is attached lazily by the first call to
//! [`ServoScheduler::assign`] whose pin and pulse range pass validation. Binding needs a `'static` handler, so the
//! scheduler is expected to live in a `static` or `StaticCell`.
//!
//! If the timer refuses to attach, the assignment still succeeds and the
//! slot is reserved, but no pulses are produced. The failure is logged and
//! reported by [`ServoScheduler::timer_state`]; [`ServoScheduler::reattach`]
//! retries.

use core::cell::RefCell;

use critical_section::Mutex;
use servomux_hal::{Level, PeriodicTimer, ServoPins, TickHandler, TimerError};

use crate::config::{ConfigError, PulseRange, TimingConfig};
use crate::error::ServoError;
use crate::table::{Channel, ServoTable};
use crate::tick::{self, CycleCounter};

/// Timer binding state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerState {
    /// No servo assigned yet, timer never attached
    Unbound,
    /// Handler attached, pulses are being generated
    Running,
    /// Detached on request, table untouched
    Detached,
    /// Last attach attempt failed
    Failed(TimerError),
}

struct Inner<P, T> {
    table: ServoTable,
    counter: CycleCounter,
    pins: P,
    timer: T,
    timer_state: TimerState,
}

/// Servo table plus the interrupt-driven tick pass
pub struct ServoScheduler<P: ServoPins, T: PeriodicTimer> {
    inner: Mutex<RefCell<Inner<P, T>>>,
    tick_interval_us: u32,
}

impl<P, T> ServoScheduler<P, T>
where
    P: ServoPins + Send + 'static,
    T: PeriodicTimer + Send + 'static,
{
    /// Create a scheduler with custom timing
    ///
    /// Nothing is attached until the first servo is assigned.
    pub fn new(pins: P, timer: T, timing: TimingConfig) -> Result<Self, ConfigError> {
        timing.validate()?;
        Ok(Self::new_unchecked(pins, timer, timing))
    }

    /// Create a scheduler with 10 µs ticks and a 20 ms refresh cycle
    pub fn with_default_timing(pins: P, timer: T) -> Self {
        Self::new_unchecked(pins, timer, TimingConfig::default())
    }

    fn new_unchecked(pins: P, timer: T, timing: TimingConfig) -> Self {
        let cycle_ticks = timing.cycle_ticks() as u16;
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                table: ServoTable::new(timing, P::MAX_PIN),
                counter: CycleCounter::new(cycle_ticks),
                pins,
                timer,
                timer_state: TimerState::Unbound,
            })),
            tick_interval_us: timing.tick_interval_us,
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut Inner<P, T>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    fn with_table<R>(&self, f: impl FnOnce(&mut ServoTable) -> R) -> R {
        self.with(|inner| f(&mut inner.table))
    }

    /// Assign `pin` to the lowest free slot with the default pulse range
    pub fn assign(&'static self, pin: u8) -> Result<u8, ServoError> {
        self.assign_with_range(pin, PulseRange::default())
    }

    /// Assign `pin` to the lowest free slot
    ///
    /// Attaches the timer on first use. The pin is configured as an output
    /// and driven low. Returns the slot index.
    pub fn assign_with_range(&'static self, pin: u8, range: PulseRange) -> Result<u8, ServoError> {
        let (result, bind) = self.with(|inner| {
            if !inner.table.is_valid_pin(pin) {
                return (Err(ServoError::InvalidPin), None);
            }
            if !range.is_valid_for(inner.table.timing()) {
                return (Err(ServoError::InvalidPulseRange), None);
            }

            let bind = if inner.timer_state == TimerState::Unbound {
                Some(self.bind(inner))
            } else {
                None
            };

            let result = inner.table.assign(pin, range);
            if result.is_ok() {
                inner.pins.set_output(pin);
                inner.pins.write(pin, Level::Low);
            }
            (result, bind)
        });

        match bind {
            Some(Ok(())) => debug!("servo timer attached, {} us ticks", self.tick_interval_us),
            Some(Err(e)) => error!("servo timer attach failed: {:?}", e),
            None => {}
        }
        match result {
            Ok(index) => debug!("servo {} assigned to pin {}", index, pin),
            Err(e) => warn!("servo assign on pin {} failed: {:?}", pin, e),
        }
        result
    }

    /// Attach the timer, restarting the cycle
    fn bind(&'static self, inner: &mut Inner<P, T>) -> Result<(), TimerError> {
        inner.counter.reset();
        let result = inner.timer.attach(self.tick_interval_us, self);
        inner.timer_state = match result {
            Ok(()) => TimerState::Running,
            Err(e) => TimerState::Failed(e),
        };
        result
    }

    /// Free a slot
    ///
    /// No-op for free or out-of-range slots. The pin keeps whatever level it
    /// was last driven to.
    pub fn release(&self, index: u8) {
        if self.with_table(|table| table.release(index)) {
            debug!("servo {} released", index);
        }
    }

    /// Move to `degrees` (0-180, larger values are clamped)
    pub fn set_position(&self, index: u8, degrees: u16) -> Result<(), ServoError> {
        self.with_table(|table| table.set_position(index, degrees))
    }

    /// Set the pulse width (µs), clamped to the slot's range
    ///
    /// Returns the width applied.
    pub fn set_pulse_width(&self, index: u8, width_us: u16) -> Result<u16, ServoError> {
        self.with_table(|table| table.set_pulse_width(index, width_us))
    }

    /// Move to the middle of the slot's pulse range
    pub fn center(&self, index: u8) -> Result<u16, ServoError> {
        self.with_table(|table| {
            let center = table
                .channel(index)
                .ok_or(ServoError::InvalidIndex)?
                .range
                .center();
            table.set_pulse_width(index, center)
        })
    }

    /// Last commanded angle (degrees)
    pub fn position(&self, index: u8) -> Result<u16, ServoError> {
        self.with_table(|table| table.position(index))
    }

    /// Current pulse width (µs)
    pub fn pulse_width(&self, index: u8) -> Result<u16, ServoError> {
        self.with_table(|table| table.pulse_width(index))
    }

    /// Resume pulses on a slot
    pub fn enable(&self, index: u8) -> Result<(), ServoError> {
        self.with_table(|table| table.enable(index))
    }

    /// Withhold pulses on a slot
    ///
    /// The pin stays at its current level; a slot disabled mid-pulse is left
    /// high.
    pub fn disable(&self, index: u8) -> Result<(), ServoError> {
        self.with_table(|table| table.disable(index))
    }

    /// Enable or disable a slot
    pub fn set_enabled(&self, index: u8, enabled: bool) -> Result<(), ServoError> {
        self.with_table(|table| table.set_enabled(index, enabled))
    }

    /// Enable every assigned slot whose pulse is at or above its minimum
    pub fn enable_all(&self) {
        self.with_table(ServoTable::enable_all);
    }

    /// Disable every slot
    pub fn disable_all(&self) {
        self.with_table(ServoTable::disable_all);
    }

    /// Flip a slot's enabled flag
    pub fn toggle(&self, index: u8) -> Result<(), ServoError> {
        self.with_table(|table| table.toggle(index))
    }

    /// Check if a slot is producing pulses
    pub fn is_enabled(&self, index: u8) -> bool {
        self.with_table(|table| table.is_enabled(index))
    }

    /// Number of assigned slots
    pub fn count_assigned(&self) -> u8 {
        self.with_table(|table| table.count_assigned())
    }

    /// Number of free slots
    pub fn count_free(&self) -> u8 {
        self.with_table(|table| table.count_free())
    }

    /// Copy of a slot for display
    pub fn channel(&self, index: u8) -> Option<Channel> {
        self.with_table(|table| table.channel(index))
    }

    /// Current position within the refresh cycle
    pub fn cycle_count(&self) -> u16 {
        self.with(|inner| inner.counter.count())
    }

    /// Timer binding state
    pub fn timer_state(&self) -> TimerState {
        self.with(|inner| inner.timer_state)
    }

    /// Stop the timer
    ///
    /// Pins stop changing; the table and cycle counter are left as they are.
    pub fn detach(&self) {
        let detached = self.with(|inner| {
            if inner.timer_state != TimerState::Running {
                return false;
            }
            inner.timer.detach();
            inner.timer_state = TimerState::Detached;
            true
        });
        if detached {
            debug!("servo timer detached");
        }
    }

    /// Attach the timer again with the same interval
    ///
    /// The cycle restarts at count 1. Also retries a failed first attach.
    pub fn reattach(&'static self) -> Result<(), TimerError> {
        let result = self.with(|inner| {
            if inner.timer_state == TimerState::Running {
                inner.timer.detach();
            }
            self.bind(inner)
        });
        match result {
            Ok(()) => debug!("servo timer reattached"),
            Err(e) => error!("servo timer reattach failed: {:?}", e),
        }
        result
    }

    /// Detach the timer for teardown
    pub fn shutdown(&self) {
        self.detach();
    }
}

impl<P, T> TickHandler for ServoScheduler<P, T>
where
    P: ServoPins + Send + 'static,
    T: PeriodicTimer + Send + 'static,
{
    /// Run one tick pass
    ///
    /// Called from the timer interrupt. Bounded work: one pass over 16 slots
    /// and at most 16 pin writes.
    fn on_tick(&self) {
        critical_section::with(|cs| {
            let mut inner = self.inner.borrow_ref_mut(cs);
            let Inner {
                table,
                counter,
                pins,
                ..
            } = &mut *inner;
            tick::run(table, counter, pins);
        });
    }
}

impl<P: ServoPins, T: PeriodicTimer> Drop for ServoScheduler<P, T> {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().get_mut();
        if inner.timer_state == TimerState::Running {
            inner.timer.detach();
            inner.timer_state = TimerState::Detached;
        }
    }
}
