//! GPIO pin abstractions
//!
//! The servo engine addresses pins by logical number, so the trait here is a
//! bank of outputs rather than a single typed pin.

/// Output level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    /// Logic 0
    Low,
    /// Logic 1
    High,
}

impl From<Level> for bool {
    fn from(level: Level) -> Self {
        matches!(level, Level::High)
    }
}

/// Bank of digital outputs addressed by pin number
///
/// Implementations own the physical pins and should handle the register
/// access for the specific chip. Both operations are assumed infallible and
/// synchronous. `write` is called from interrupt context and must complete in
/// bounded time without blocking or allocating.
pub trait ServoPins {
    /// Highest valid pin number on this chip
    const MAX_PIN: u8;

    /// Configure `pin` as a push-pull output
    fn set_output(&mut self, pin: u8);

    /// Drive `pin` to `level`
    ///
    /// Pins that were never configured are ignored.
    fn write(&mut self, pin: u8, level: Level);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_to_bool() {
        assert!(bool::from(Level::High));
        assert!(!bool::from(Level::Low));
    }
}
