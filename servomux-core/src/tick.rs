//! Tick pass
//!
//! One call per timer interrupt. The cycle counter runs `1..=N` where `N` is
//! the number of ticks in a refresh cycle. Each enabled channel goes high at
//! count 1 and low at count `on_ticks`, so every channel emits exactly one
//! pulse per cycle off a single shared timer.
//!
//! Everything here runs in interrupt context: no allocation, no logging, no
//! fallible lookups.

use servomux_hal::{Level, ServoPins};

use crate::table::ServoTable;

/// Position within the refresh cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleCounter {
    /// Current tick, `1..=cycle_ticks`
    count: u16,
    /// Ticks per refresh cycle
    cycle_ticks: u16,
}

impl CycleCounter {
    /// Create a counter at the start of a cycle
    ///
    /// `cycle_ticks` comes from a validated [`TimingConfig`], so it is at
    /// least 2.
    ///
    /// [`TimingConfig`]: crate::config::TimingConfig
    pub const fn new(cycle_ticks: u16) -> Self {
        Self {
            count: 1,
            cycle_ticks,
        }
    }

    /// Current tick within the cycle
    pub fn count(&self) -> u16 {
        self.count
    }

    /// Ticks per refresh cycle
    pub fn cycle_ticks(&self) -> u16 {
        self.cycle_ticks
    }

    /// Move back to the start of a cycle
    pub fn reset(&mut self) {
        self.count = 1;
    }

    /// Step to the next tick, wrapping to 1 after the last
    pub fn advance(&mut self) {
        if self.count >= self.cycle_ticks {
            self.count = 1;
        } else {
            self.count += 1;
        }
    }
}

/// Apply the current tick to every channel, then advance the counter
///
/// The "end of pulse" check wins over "start of pulse", so a channel with
/// `on_ticks == 1` is never driven high.
pub fn run<P: ServoPins>(table: &ServoTable, counter: &mut CycleCounter, pins: &mut P) {
    let count = counter.count();

    for channel in table.channels() {
        if !channel.enabled {
            continue;
        }
        let Some(pin) = channel.pin else {
            continue;
        };
        if !table.is_valid_pin(pin) {
            continue;
        }

        if count == channel.on_ticks {
            pins.write(pin, Level::Low);
        } else if count == 1 {
            pins.write(pin, Level::High);
        }
    }

    counter.advance();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PulseRange, TimingConfig};
    use crate::mock::{MockPins, PinLog};
    use proptest::prelude::*;
    use std::vec::Vec;

    /// Transitions observed on one pin: `(count, level)`
    fn run_cycles(
        table: &ServoTable,
        counter: &mut CycleCounter,
        pins: &mut MockPins,
        log: &PinLog,
        pin: u8,
        ticks: u32,
    ) -> Vec<(u16, Level)> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            let count = counter.count();
            run(table, counter, pins);
            for (p, level) in log.take_writes() {
                if p == pin {
                    events.push((count, level));
                }
            }
        }
        events
    }

    fn setup() -> (ServoTable, CycleCounter, MockPins, &'static PinLog) {
        let timing = TimingConfig::default();
        let table = ServoTable::new(timing, MockPins::MAX_PIN);
        let counter = CycleCounter::new(timing.cycle_ticks() as u16);
        let log = PinLog::leak();
        (table, counter, MockPins::new(log), log)
    }

    #[test]
    fn test_counter_wraps() {
        let mut counter = CycleCounter::new(3);
        assert_eq!(counter.count(), 1);
        counter.advance();
        assert_eq!(counter.count(), 2);
        counter.advance();
        assert_eq!(counter.count(), 3);
        counter.advance();
        assert_eq!(counter.count(), 1);

        counter.advance();
        counter.reset();
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn test_1500us_pulse_on_pin_5() {
        let (mut table, mut counter, mut pins, log) = setup();
        let index = table.assign(5, PulseRange::default()).unwrap();
        table.set_pulse_width(index, 1500).unwrap();
        assert_eq!(table.channel(index).unwrap().on_ticks, 150);

        let events = run_cycles(&table, &mut counter, &mut pins, log, 5, 2000);
        assert_eq!(events, [(1, Level::High), (150, Level::Low)]);
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn test_one_pulse_per_cycle_over_many_cycles() {
        let (mut table, mut counter, mut pins, log) = setup();
        let index = table.assign(3, PulseRange::default()).unwrap();
        table.set_position(index, 180).unwrap(); // 2400 µs -> 240 ticks

        let events = run_cycles(&table, &mut counter, &mut pins, log, 3, 3 * 2000);
        assert_eq!(
            events,
            [
                (1, Level::High),
                (240, Level::Low),
                (1, Level::High),
                (240, Level::Low),
                (1, Level::High),
                (240, Level::Low),
            ]
        );
    }

    #[test]
    fn test_channels_are_independent() {
        let (mut table, mut counter, mut pins, log) = setup();
        let a = table.assign(2, PulseRange::default()).unwrap();
        let b = table.assign(4, PulseRange::default()).unwrap();
        table.set_pulse_width(a, 1000).unwrap();
        table.set_pulse_width(b, 2000).unwrap();

        let mut lows = Vec::new();
        for _ in 0..2000 {
            let count = counter.count();
            run(&table, &mut counter, &mut pins);
            for (pin, level) in log.take_writes() {
                if level == Level::Low {
                    lows.push((pin, count));
                }
            }
        }
        assert_eq!(lows, [(2, 100), (4, 200)]);
    }

    #[test]
    fn test_disabled_and_free_channels_are_silent() {
        let (mut table, mut counter, mut pins, log) = setup();
        let index = table.assign(6, PulseRange::default()).unwrap();
        table.disable(index).unwrap();
        table.toggle(9).unwrap(); // free slot flagged enabled

        for _ in 0..2000 {
            run(&table, &mut counter, &mut pins);
        }
        assert!(log.take_writes().is_empty());
    }

    #[test]
    fn test_single_tick_pulse_never_goes_high() {
        let timing = TimingConfig::default();
        let mut table = ServoTable::new(timing, MockPins::MAX_PIN);
        let mut counter = CycleCounter::new(timing.cycle_ticks() as u16);
        let log = PinLog::leak();
        let mut pins = MockPins::new(log);

        // 10-15 µs range yields on_ticks == 1
        let index = table.assign(7, PulseRange::new(10, 15)).unwrap();
        assert_eq!(table.channel(index).unwrap().on_ticks, 1);

        let events = run_cycles(&table, &mut counter, &mut pins, log, 7, 2 * 2000);
        assert_eq!(events, [(1, Level::Low), (1, Level::Low)]);
    }

    proptest! {
        #[test]
        fn prop_one_high_one_low_per_cycle(on_ticks in 2u16..200, cycle_ticks in 200u16..400) {
            let timing = TimingConfig {
                tick_interval_us: 10,
                refresh_interval_us: u32::from(cycle_ticks) * 10,
            };
            let mut table = ServoTable::new(timing, MockPins::MAX_PIN);
            let index = table.assign(1, PulseRange::new(10, 1990)).unwrap();
            table.set_pulse_width(index, on_ticks * 10).unwrap();

            let mut counter = CycleCounter::new(cycle_ticks);
            let log = PinLog::leak();
            let mut pins = MockPins::new(log);

            let events = run_cycles(&table, &mut counter, &mut pins, log, 1, u32::from(cycle_ticks));
            prop_assert_eq!(events, [(1, Level::High), (on_ticks, Level::Low)]);
        }
    }
}
