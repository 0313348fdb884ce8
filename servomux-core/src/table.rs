//! Servo table
//!
//! Fixed arena of [`MAX_SERVOS`] channel slots indexed by `u8`. The table is
//! plain data: it knows nothing about interrupts or pins. [`ServoScheduler`]
//! owns one behind its critical section and drives the pins from it.
//!
//! [`ServoScheduler`]: crate::scheduler::ServoScheduler

use crate::config::{PulseRange, TimingConfig, MAX_DEGREES, MAX_SERVOS};
use crate::error::ServoError;

/// One servo channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Channel {
    /// Output pin, `None` when the slot is free
    pub pin: Option<u8>,
    /// Whether the channel currently produces pulses
    pub enabled: bool,
    /// Pulse-width bounds
    pub range: PulseRange,
    /// Last commanded angle (degrees, 0-180)
    pub position: u16,
    /// Ticks per refresh cycle the pin is held high
    pub on_ticks: u16,
}

impl Channel {
    /// A free slot
    pub const UNASSIGNED: Self = Self {
        pin: None,
        enabled: false,
        range: PulseRange::new(0, 0),
        position: 0,
        on_ticks: 0,
    };

    /// Check if a pin is assigned to this slot
    pub fn is_assigned(&self) -> bool {
        self.pin.is_some()
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self::UNASSIGNED
    }
}

/// Fixed-capacity servo registry
#[derive(Debug, Clone)]
pub struct ServoTable {
    channels: [Channel; MAX_SERVOS],
    /// Number of assigned slots
    assigned: u8,
    timing: TimingConfig,
    /// Highest valid pin number
    max_pin: u8,
}

impl ServoTable {
    /// Create an empty table
    pub fn new(timing: TimingConfig, max_pin: u8) -> Self {
        Self {
            channels: [Channel::UNASSIGNED; MAX_SERVOS],
            assigned: 0,
            timing,
            max_pin,
        }
    }

    /// Timing the table converts pulse widths with
    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// Check `pin` is within the chip's pin range
    pub fn is_valid_pin(&self, pin: u8) -> bool {
        pin <= self.max_pin
    }

    /// Bind `pin` to the lowest free slot
    ///
    /// The new channel starts enabled at its minimum pulse width, position 0.
    /// Returns the slot index.
    pub fn assign(&mut self, pin: u8, range: PulseRange) -> Result<u8, ServoError> {
        if !self.is_valid_pin(pin) {
            return Err(ServoError::InvalidPin);
        }
        if !range.is_valid_for(&self.timing) {
            return Err(ServoError::InvalidPulseRange);
        }

        let index = self
            .channels
            .iter()
            .position(|c| !c.is_assigned())
            .ok_or(ServoError::NoFreeSlot)?;

        self.channels[index] = Channel {
            pin: Some(pin),
            enabled: true,
            range,
            position: 0,
            on_ticks: self.timing.micros_to_ticks(range.min_us),
        };
        self.assigned += 1;

        Ok(index as u8)
    }

    /// Free a slot
    ///
    /// Returns `true` if the slot was assigned. Free or out-of-range slots
    /// are left alone.
    pub fn release(&mut self, index: u8) -> bool {
        match self.channels.get_mut(usize::from(index)) {
            Some(channel) if channel.is_assigned() => {
                *channel = Channel::UNASSIGNED;
                self.assigned = self.assigned.saturating_sub(1);
                true
            }
            _ => false,
        }
    }

    /// Move to `degrees`, mapped linearly onto the channel's pulse range
    ///
    /// Angles above 180 are clamped to 180.
    pub fn set_position(&mut self, index: u8, degrees: u16) -> Result<(), ServoError> {
        let timing = self.timing;
        let channel = self.active_mut(index)?;
        let degrees = degrees.min(MAX_DEGREES);
        let micros = channel.range.degrees_to_micros(degrees);

        channel.position = degrees;
        channel.on_ticks = timing.micros_to_ticks(micros);
        Ok(())
    }

    /// Set the pulse width in microseconds, clamped to the channel's range
    ///
    /// The stored position is recomputed from the clamped width. Returns the
    /// width actually applied.
    pub fn set_pulse_width(&mut self, index: u8, width_us: u16) -> Result<u16, ServoError> {
        let timing = self.timing;
        let channel = self.active_mut(index)?;
        let width_us = channel.range.clamp(width_us);

        channel.on_ticks = timing.micros_to_ticks(width_us);
        channel.position = channel.range.micros_to_degrees(width_us);
        Ok(width_us)
    }

    /// Last commanded angle (degrees)
    pub fn position(&self, index: u8) -> Result<u16, ServoError> {
        self.active(index).map(|c| c.position)
    }

    /// Current pulse width (µs), as produced by the tick scheduler
    ///
    /// Whole ticks can fall just short of the range minimum (544 µs is 54
    /// ticks at 10 µs), so the result is clamped back into the range.
    pub fn pulse_width(&self, index: u8) -> Result<u16, ServoError> {
        let channel = self.active(index)?;
        let micros = self.timing.ticks_to_micros(channel.on_ticks);
        Ok(channel
            .range
            .clamp(u16::try_from(micros).unwrap_or(u16::MAX)))
    }

    /// Resume pulses on a slot
    ///
    /// Fails with [`ServoError::BelowMinimum`] if the channel's pulse is
    /// under its minimum, which only happens for a slot never configured.
    pub fn enable(&mut self, index: u8) -> Result<(), ServoError> {
        self.check_index(index)?;
        if !self.heal(index) {
            return Err(ServoError::NotAssigned);
        }

        let timing = self.timing;
        let channel = &mut self.channels[usize::from(index)];
        if channel.on_ticks < timing.micros_to_ticks(channel.range.min_us) {
            return Err(ServoError::BelowMinimum);
        }
        channel.enabled = true;
        Ok(())
    }

    /// Withhold pulses on a slot
    ///
    /// Succeeds for any in-range slot, assigned or not.
    pub fn disable(&mut self, index: u8) -> Result<(), ServoError> {
        self.check_index(index)?;
        self.heal(index);
        self.channels[usize::from(index)].enabled = false;
        Ok(())
    }

    /// [`enable`](Self::enable) or [`disable`](Self::disable) a slot
    pub fn set_enabled(&mut self, index: u8, enabled: bool) -> Result<(), ServoError> {
        if enabled {
            self.enable(index)
        } else {
            self.disable(index)
        }
    }

    /// Enable every assigned channel that has a pulse at or above its minimum
    pub fn enable_all(&mut self) {
        let timing = self.timing;
        for channel in self.channels.iter_mut() {
            let ready = channel.on_ticks >= timing.micros_to_ticks(channel.range.min_us);
            if channel.is_assigned() && ready {
                channel.enabled = true;
            }
        }
    }

    /// Disable every slot
    pub fn disable_all(&mut self) {
        for channel in self.channels.iter_mut() {
            channel.enabled = false;
        }
    }

    /// Flip a slot's enabled flag
    ///
    /// Only the index is checked. Flipping a free slot on has no effect on
    /// the outputs since it has no pin.
    pub fn toggle(&mut self, index: u8) -> Result<(), ServoError> {
        self.check_index(index)?;
        let channel = &mut self.channels[usize::from(index)];
        channel.enabled = !channel.enabled;
        Ok(())
    }

    /// Check if a slot is producing pulses
    ///
    /// A slot whose stored pin is out of range is reset to free as a side
    /// effect.
    pub fn is_enabled(&mut self, index: u8) -> bool {
        if self.check_index(index).is_err() || !self.heal(index) {
            return false;
        }
        self.channels[usize::from(index)].enabled
    }

    /// Number of assigned slots
    pub fn count_assigned(&self) -> u8 {
        self.assigned
    }

    /// Number of free slots
    pub fn count_free(&self) -> u8 {
        MAX_SERVOS as u8 - self.assigned
    }

    /// Copy of a slot, assigned or not
    pub fn channel(&self, index: u8) -> Option<Channel> {
        self.channels.get(usize::from(index)).copied()
    }

    /// All slots, in index order
    pub fn channels(&self) -> &[Channel; MAX_SERVOS] {
        &self.channels
    }

    fn check_index(&self, index: u8) -> Result<(), ServoError> {
        if usize::from(index) < MAX_SERVOS {
            Ok(())
        } else {
            Err(ServoError::InvalidIndex)
        }
    }

    /// Reset a slot whose pin is out of range
    ///
    /// Returns `true` if the slot holds a valid pin afterwards.
    fn heal(&mut self, index: u8) -> bool {
        let max_pin = self.max_pin;
        let Some(channel) = self.channels.get_mut(usize::from(index)) else {
            return false;
        };
        match channel.pin {
            Some(pin) if pin <= max_pin => true,
            Some(_) => {
                *channel = Channel::UNASSIGNED;
                self.assigned = self.assigned.saturating_sub(1);
                false
            }
            None => false,
        }
    }

    /// Assigned, enabled channel with a valid pin
    fn active(&self, index: u8) -> Result<&Channel, ServoError> {
        let channel = self
            .channels
            .get(usize::from(index))
            .ok_or(ServoError::InvalidIndex)?;
        match channel.pin {
            Some(pin) if pin <= self.max_pin => {}
            _ => return Err(ServoError::NotAssigned),
        }
        if !channel.enabled {
            return Err(ServoError::Disabled);
        }
        Ok(channel)
    }

    fn active_mut(&mut self, index: u8) -> Result<&mut Channel, ServoError> {
        self.active(index)?;
        Ok(&mut self.channels[usize::from(index)])
    }
}
