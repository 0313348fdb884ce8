//! servomux - timer-multiplexed servo demo firmware
//!
//! Drives the servos listed in servos.toml from a single SysTick interrupt
//! on an RP2040. Sweeping servos move back and forth; the rest hold center.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use heapless::Vec;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use servomux_core::{ServoScheduler, TimerState, MAX_SERVOS};
use servomux_hal_rp2040::{PinBank, SysTickTimer};

#[macro_use]
mod layout;
mod tasks;

/// Scheduler type for this board
pub type Scheduler = ServoScheduler<PinBank, SysTickTimer>;

/// Heartbeat interval in milliseconds
const HEARTBEAT_INTERVAL_MS: u64 = 5_000;

// The SysTick handler holds a `'static` reference to the scheduler
static SCHEDULER: StaticCell<Scheduler> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("servomux firmware starting...");

    let p = embassy_rp::init(Default::default());

    let mut bank = PinBank::new();
    for (pin_num, pin) in take_servo_pins!(p) {
        if let Err(e) = bank.insert(pin_num, pin) {
            warn!("GPIO {} not added to pin bank: {}", pin_num, e);
        }
    }

    let Some(core) = cortex_m::Peripherals::take() else {
        error!("Core peripherals already taken, SysTick unavailable");
        return;
    };
    let core_hz = embassy_rp::clocks::clk_sys_freq();
    let timer = SysTickTimer::new(core.SYST, core_hz);
    info!(
        "SysTick at {} Hz, tick {} us, frame {} us",
        core_hz,
        layout::TIMING.tick_interval_us,
        layout::TIMING.refresh_interval_us
    );

    let scheduler: &'static Scheduler = match Scheduler::new(bank, timer, layout::TIMING) {
        Ok(scheduler) => SCHEDULER.init(scheduler),
        Err(e) => {
            error!("Invalid timing configuration: {}", e);
            return;
        }
    };

    let mut sweepers: Vec<u8, MAX_SERVOS> = Vec::new();
    for spec in layout::SERVOS {
        let slot = match scheduler.assign_with_range(spec.pin, spec.range) {
            Ok(slot) => slot,
            Err(e) => {
                error!("Servo on GPIO {} not assigned: {}", spec.pin, e);
                continue;
            }
        };

        match scheduler.center(slot) {
            Ok(width) => info!(
                "Servo on GPIO {} -> slot {}, centered at {} us",
                spec.pin, slot, width
            ),
            Err(e) => warn!("Servo slot {} not centered: {}", slot, e),
        }

        if spec.sweep && sweepers.push(slot).is_err() {
            warn!("Sweep list full, slot {} held at center", slot);
        }
    }

    if let TimerState::Failed(e) = scheduler.timer_state() {
        error!("Timer not running: {}", e);
    }

    if !sweepers.is_empty() {
        spawner.spawn(tasks::sweep_task(scheduler, sweepers)).unwrap();
    }

    info!("All tasks spawned, entering heartbeat loop");

    loop {
        Timer::after(Duration::from_millis(HEARTBEAT_INTERVAL_MS)).await;

        let state = scheduler.timer_state();
        info!(
            "Heartbeat: {} assigned, {} free, timer {}",
            scheduler.count_assigned(),
            scheduler.count_free(),
            state
        );

        if let TimerState::Failed(_) = state {
            if let Err(e) = scheduler.reattach() {
                warn!("Timer reattach failed: {}", e);
            }
        }
    }
}
