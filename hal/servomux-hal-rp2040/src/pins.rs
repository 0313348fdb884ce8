//! GPIO pin bank for servo outputs
//!
//! Servo pins are chosen by number in the firmware's layout file, so the bank
//! stores them in a table indexed by GPIO number and the engine addresses
//! them the same way.

use embassy_rp::gpio::{AnyPin, Flex, Level as RpLevel};
use embassy_rp::Peri;
use servomux_hal::{Level, ServoPins};

/// Number of user GPIOs on the RP2040
const PIN_COUNT: usize = 30;

/// Error when adding a pin to the bank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin number out of range (0-29 valid)
    InvalidPin,
    /// A pin with this number is already in the bank
    AlreadyTaken,
}

/// Servo output pins indexed by GPIO number
///
/// Pins start out as inputs; the engine switches each one to a push-pull
/// output when a servo is assigned to it.
pub struct PinBank {
    pins: [Option<Flex<'static>>; PIN_COUNT],
}

impl PinBank {
    /// Create an empty bank
    pub fn new() -> Self {
        Self {
            pins: [const { None }; PIN_COUNT],
        }
    }

    /// Hand a GPIO to the bank under its pin number
    pub fn insert(&mut self, pin_num: u8, pin: Peri<'static, AnyPin>) -> Result<(), PinError> {
        let slot = self
            .pins
            .get_mut(pin_num as usize)
            .ok_or(PinError::InvalidPin)?;
        if slot.is_some() {
            return Err(PinError::AlreadyTaken);
        }
        *slot = Some(Flex::new(pin));
        Ok(())
    }

    fn get_mut(&mut self, pin_num: u8) -> Option<&mut Flex<'static>> {
        self.pins.get_mut(pin_num as usize)?.as_mut()
    }
}

impl Default for PinBank {
    fn default() -> Self {
        Self::new()
    }
}

impl ServoPins for PinBank {
    const MAX_PIN: u8 = (PIN_COUNT - 1) as u8;

    fn set_output(&mut self, pin: u8) {
        if let Some(flex) = self.get_mut(pin) {
            flex.set_low();
            flex.set_as_output();
        }
    }

    fn write(&mut self, pin: u8, level: Level) {
        if let Some(flex) = self.get_mut(pin) {
            flex.set_level(RpLevel::from(bool::from(level)));
        }
    }
}
