//! Test doubles for the pin and timer collaborators
//!
//! Both mocks report through a leaked, critical-section guarded log so tests
//! can inspect them after moving the mock into a scheduler.

use core::cell::RefCell;

use critical_section::Mutex;
use servomux_hal::{Level, PeriodicTimer, ServoPins, TickHandler, TimerError};
use std::boxed::Box;
use std::vec::Vec;

/// Everything written to the mock pins
#[derive(Debug, Default)]
pub struct PinRecord {
    /// Pins configured as outputs, in call order
    pub outputs: Vec<u8>,
    /// Writes not yet taken, in call order
    pub writes: Vec<(u8, Level)>,
}

/// Shared log behind [`MockPins`]
pub struct PinLog(Mutex<RefCell<PinRecord>>);

impl PinLog {
    /// Allocate a log that lives for the rest of the test
    pub fn leak() -> &'static Self {
        Box::leak(Box::new(Self(Mutex::new(RefCell::new(PinRecord::default())))))
    }

    /// Drain recorded writes
    pub fn take_writes(&self) -> Vec<(u8, Level)> {
        critical_section::with(|cs| core::mem::take(&mut self.0.borrow_ref_mut(cs).writes))
    }

    /// Pins configured as outputs so far
    pub fn outputs(&self) -> Vec<u8> {
        critical_section::with(|cs| self.0.borrow_ref(cs).outputs.clone())
    }
}

/// Pin bank that records instead of driving hardware
pub struct MockPins {
    log: &'static PinLog,
}

impl MockPins {
    pub fn new(log: &'static PinLog) -> Self {
        Self { log }
    }
}

impl ServoPins for MockPins {
    const MAX_PIN: u8 = 39;

    fn set_output(&mut self, pin: u8) {
        critical_section::with(|cs| self.log.0.borrow_ref_mut(cs).outputs.push(pin));
    }

    fn write(&mut self, pin: u8, level: Level) {
        critical_section::with(|cs| self.log.0.borrow_ref_mut(cs).writes.push((pin, level)));
    }
}

/// State of the mock timer
#[derive(Default)]
pub struct TimerRecord {
    pub handler: Option<&'static dyn TickHandler>,
    pub interval_us: u32,
    pub attach_calls: u32,
    pub detach_calls: u32,
    /// Error returned by the next `attach` calls, if set
    pub fail_with: Option<TimerError>,
}

/// Shared log behind [`MockTimer`]
pub struct TimerLog(Mutex<RefCell<TimerRecord>>);

impl TimerLog {
    /// Allocate a log that lives for the rest of the test
    pub fn leak() -> &'static Self {
        Box::leak(Box::new(Self(Mutex::new(RefCell::new(TimerRecord::default())))))
    }

    /// Make `attach` fail with `error`, or succeed again with `None`
    pub fn fail_with(&self, error: Option<TimerError>) {
        critical_section::with(|cs| self.0.borrow_ref_mut(cs).fail_with = error);
    }

    pub fn is_attached(&self) -> bool {
        critical_section::with(|cs| self.0.borrow_ref(cs).handler.is_some())
    }

    pub fn interval_us(&self) -> u32 {
        critical_section::with(|cs| self.0.borrow_ref(cs).interval_us)
    }

    pub fn attach_calls(&self) -> u32 {
        critical_section::with(|cs| self.0.borrow_ref(cs).attach_calls)
    }

    pub fn detach_calls(&self) -> u32 {
        critical_section::with(|cs| self.0.borrow_ref(cs).detach_calls)
    }

    /// Invoke the attached handler `times` times, as the interrupt would
    ///
    /// Returns `false` if nothing is attached.
    pub fn fire(&self, times: u32) -> bool {
        let handler = critical_section::with(|cs| self.0.borrow_ref(cs).handler);
        let Some(handler) = handler else {
            return false;
        };
        for _ in 0..times {
            handler.on_tick();
        }
        true
    }
}

/// Periodic timer driven by hand from tests
pub struct MockTimer {
    log: &'static TimerLog,
}

impl MockTimer {
    pub fn new(log: &'static TimerLog) -> Self {
        Self { log }
    }
}

impl PeriodicTimer for MockTimer {
    fn attach(
        &mut self,
        interval_us: u32,
        handler: &'static dyn TickHandler,
    ) -> Result<(), TimerError> {
        critical_section::with(|cs| {
            let mut record = self.log.0.borrow_ref_mut(cs);
            record.attach_calls += 1;
            if let Some(error) = record.fail_with {
                return Err(error);
            }
            record.handler = Some(handler);
            record.interval_us = interval_us;
            Ok(())
        })
    }

    fn detach(&mut self) {
        critical_section::with(|cs| {
            let mut record = self.log.0.borrow_ref_mut(cs);
            record.detach_calls += 1;
            record.handler = None;
        });
    }
}
