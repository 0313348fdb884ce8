//! Servo table errors

/// Errors returned by servo table operations
///
/// None of these are fatal. Callers are free to ignore them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServoError {
    /// Slot index is not below [`MAX_SERVOS`](crate::config::MAX_SERVOS)
    InvalidIndex,
    /// Pin number is above the chip's highest pin
    InvalidPin,
    /// Pulse bounds are empty, inverted, or longer than the refresh cycle
    InvalidPulseRange,
    /// All slots are assigned
    NoFreeSlot,
    /// Slot has no pin assigned
    NotAssigned,
    /// Slot is assigned but its pulse is withheld
    Disabled,
    /// Channel's pulse is below its configured minimum
    BelowMinimum,
}
