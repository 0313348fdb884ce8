//! Sweep task
//!
//! Moves every servo marked `sweep = true` from 0 to 180 degrees and back,
//! one step per refresh frame.

use defmt::*;
use embassy_time::{Duration, Ticker};
use heapless::Vec;
use servomux_core::config::MAX_DEGREES;
use servomux_core::MAX_SERVOS;

use crate::Scheduler;

/// Time between position updates in milliseconds
pub const SWEEP_STEP_MS: u64 = 20;

/// Degrees moved per update
const SWEEP_STEP_DEGREES: u16 = 2;

/// Next angle and direction of a back-and-forth sweep
fn next_angle(angle: u16, rising: bool) -> (u16, bool) {
    if rising {
        let next = angle.saturating_add(SWEEP_STEP_DEGREES).min(MAX_DEGREES);
        (next, next < MAX_DEGREES)
    } else {
        let next = angle.saturating_sub(SWEEP_STEP_DEGREES);
        (next, next == 0)
    }
}

#[embassy_executor::task]
pub async fn sweep_task(scheduler: &'static Scheduler, slots: Vec<u8, MAX_SERVOS>) {
    info!("Sweep task started with {} servos", slots.len());

    let mut ticker = Ticker::every(Duration::from_millis(SWEEP_STEP_MS));
    let mut angle = 0;
    let mut rising = true;

    loop {
        ticker.next().await;

        for &slot in &slots {
            // A released or healed slot just stops moving
            if let Err(e) = scheduler.set_position(slot, angle) {
                debug!("Sweep skipped slot {}: {}", slot, e);
            }
        }

        (angle, rising) = next_angle(angle, rising);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_rises() {
        assert_eq!(next_angle(0, true), (2, true));
        assert_eq!(next_angle(90, true), (92, true));
    }

    #[test]
    fn test_sweep_turns_at_max() {
        assert_eq!(next_angle(178, true), (180, false));
        assert_eq!(next_angle(179, true), (180, false));
        assert_eq!(next_angle(180, false), (178, false));
    }

    #[test]
    fn test_sweep_turns_at_zero() {
        assert_eq!(next_angle(2, false), (0, true));
        assert_eq!(next_angle(1, false), (0, true));
        assert_eq!(next_angle(0, true), (2, true));
    }
}
