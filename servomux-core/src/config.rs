//! Timing and pulse-range configuration
//!
//! Defaults match standard analog hobby servos: a 20 ms frame, 544-2400 µs
//! pulses, sliced into 10 µs ticks.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of servo channels in the table
pub const MAX_SERVOS: usize = 16;

/// Default tick interval (µs)
pub const DEFAULT_TICK_INTERVAL_US: u32 = 10;

/// Default refresh interval, one pulse per channel per frame (µs)
pub const DEFAULT_REFRESH_INTERVAL_US: u32 = 20_000;

/// Shortest pulse sent to a servo by default (µs)
pub const DEFAULT_MIN_PULSE_US: u16 = 544;

/// Longest pulse sent to a servo by default (µs)
pub const DEFAULT_MAX_PULSE_US: u16 = 2400;

/// Center pulse for a default-range servo (µs)
pub const DEFAULT_PULSE_US: u16 = 1500;

/// Full travel of a positional servo (degrees)
pub const MAX_DEGREES: u16 = 180;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Tick interval is zero
    ZeroTickInterval,
    /// Refresh interval is not a whole number of ticks
    RefreshNotMultipleOfTick,
    /// Refresh cycle is shorter than 2 ticks or longer than `u16::MAX` ticks
    CycleLengthOutOfRange,
}

/// Tick and refresh timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimingConfig {
    /// Timer period (µs)
    pub tick_interval_us: u32,
    /// Frame length, one pulse per channel per frame (µs)
    pub refresh_interval_us: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_interval_us: DEFAULT_TICK_INTERVAL_US,
            refresh_interval_us: DEFAULT_REFRESH_INTERVAL_US,
        }
    }
}

impl TimingConfig {
    /// Ticks per refresh cycle (N)
    ///
    /// Only meaningful on a validated config; returns 0 for a zero tick.
    pub fn cycle_ticks(&self) -> u32 {
        self.refresh_interval_us
            .checked_div(self.tick_interval_us)
            .unwrap_or(0)
    }

    /// Whole ticks covered by `micros`, rounded down
    pub fn micros_to_ticks(&self, micros: u16) -> u16 {
        u32::from(micros)
            .checked_div(self.tick_interval_us)
            .map(|t| t as u16)
            .unwrap_or(0)
    }

    /// Microseconds covered by `ticks`
    pub fn ticks_to_micros(&self, ticks: u16) -> u32 {
        u32::from(ticks).saturating_mul(self.tick_interval_us)
    }

    /// Check the timing is usable by the tick scheduler
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_us == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        if self.refresh_interval_us % self.tick_interval_us != 0 {
            return Err(ConfigError::RefreshNotMultipleOfTick);
        }
        let ticks = self.cycle_ticks();
        if ticks < 2 || ticks > u32::from(u16::MAX) {
            return Err(ConfigError::CycleLengthOutOfRange);
        }
        Ok(())
    }
}

/// Pulse-width bounds for one servo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PulseRange {
    /// Pulse width at 0 degrees (µs)
    pub min_us: u16,
    /// Pulse width at 180 degrees (µs)
    pub max_us: u16,
}

impl Default for PulseRange {
    fn default() -> Self {
        Self {
            min_us: DEFAULT_MIN_PULSE_US,
            max_us: DEFAULT_MAX_PULSE_US,
        }
    }
}

impl PulseRange {
    /// Create a range from explicit bounds
    pub const fn new(min_us: u16, max_us: u16) -> Self {
        Self { min_us, max_us }
    }

    /// Check the range is non-empty, fits in one refresh cycle and its
    /// minimum covers at least one tick
    ///
    /// A channel at zero ticks would be driven high and never low.
    pub fn is_valid_for(&self, timing: &TimingConfig) -> bool {
        self.min_us < self.max_us
            && u32::from(self.max_us) < timing.refresh_interval_us
            && timing.micros_to_ticks(self.min_us) >= 1
    }

    /// Clamp `width_us` into `[min_us, max_us]`
    pub fn clamp(&self, width_us: u16) -> u16 {
        width_us.clamp(self.min_us, self.max_us)
    }

    /// Midpoint of the range (µs)
    pub fn center(&self) -> u16 {
        self.min_us + self.max_us.saturating_sub(self.min_us) / 2
    }

    /// Map an angle in `[0, 180]` linearly onto the range
    ///
    /// Integer arithmetic, truncating toward `min_us`.
    pub fn degrees_to_micros(&self, degrees: u16) -> u16 {
        let span = u32::from(self.max_us.saturating_sub(self.min_us));
        let offset = u32::from(degrees) * span / u32::from(MAX_DEGREES);
        (u32::from(self.min_us) + offset) as u16
    }

    /// Map a pulse width in the range linearly back onto `[0, 180]`
    pub fn micros_to_degrees(&self, width_us: u16) -> u16 {
        let span = u32::from(self.max_us.saturating_sub(self.min_us));
        if span == 0 {
            return 0;
        }
        let offset = u32::from(width_us.saturating_sub(self.min_us));
        (offset * u32::from(MAX_DEGREES) / span) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timing() {
        let timing = TimingConfig::default();
        assert_eq!(timing.cycle_ticks(), 2000);
        assert!(timing.validate().is_ok());
    }

    #[test]
    fn test_timing_validation() {
        let zero = TimingConfig {
            tick_interval_us: 0,
            refresh_interval_us: 20_000,
        };
        assert_eq!(zero.validate(), Err(ConfigError::ZeroTickInterval));

        let uneven = TimingConfig {
            tick_interval_us: 7,
            refresh_interval_us: 20_000,
        };
        assert_eq!(uneven.validate(), Err(ConfigError::RefreshNotMultipleOfTick));

        let too_long = TimingConfig {
            tick_interval_us: 1,
            refresh_interval_us: 100_000,
        };
        assert_eq!(too_long.validate(), Err(ConfigError::CycleLengthOutOfRange));

        let one_tick = TimingConfig {
            tick_interval_us: 10,
            refresh_interval_us: 10,
        };
        assert_eq!(one_tick.validate(), Err(ConfigError::CycleLengthOutOfRange));
    }

    #[test]
    fn test_tick_conversion() {
        let timing = TimingConfig::default();
        assert_eq!(timing.micros_to_ticks(1500), 150);
        assert_eq!(timing.micros_to_ticks(544), 54); // truncates
        assert_eq!(timing.ticks_to_micros(150), 1500);
    }

    #[test]
    fn test_pulse_range_validity() {
        let timing = TimingConfig::default();
        assert!(PulseRange::default().is_valid_for(&timing));
        assert!(!PulseRange::new(1500, 1500).is_valid_for(&timing));
        assert!(!PulseRange::new(2000, 1000).is_valid_for(&timing));
        assert!(!PulseRange::new(500, 20_000).is_valid_for(&timing));
    }

    #[test]
    fn test_pulse_range_minimum_covers_a_tick() {
        let timing = TimingConfig::default();
        assert!(!PulseRange::new(0, 2000).is_valid_for(&timing));
        assert!(!PulseRange::new(9, 2000).is_valid_for(&timing));
        assert!(PulseRange::new(10, 2000).is_valid_for(&timing));
    }

    #[test]
    fn test_degree_mapping() {
        let range = PulseRange::default();
        assert_eq!(range.degrees_to_micros(0), 544);
        assert_eq!(range.degrees_to_micros(180), 2400);
        assert_eq!(range.degrees_to_micros(90), 1472);

        assert_eq!(range.micros_to_degrees(544), 0);
        assert_eq!(range.micros_to_degrees(2400), 180);
        assert_eq!(range.micros_to_degrees(1500), 92);
    }

    #[test]
    fn test_clamp_and_center() {
        let range = PulseRange::new(1000, 2000);
        assert_eq!(range.clamp(500), 1000);
        assert_eq!(range.clamp(2500), 2000);
        assert_eq!(range.clamp(1234), 1234);
        assert_eq!(range.center(), 1500);
    }
}
