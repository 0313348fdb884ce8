//! Periodic tick source on the Cortex-M SysTick exception
//!
//! embassy-rp keeps its time driver on the RP2040 TIMER peripheral, which
//! leaves SysTick free for the engine. The handler reference lives in a
//! static slot because the exception has no other way to reach it.

use core::cell::Cell;

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::SYST;
use cortex_m_rt::exception;
use critical_section::Mutex;
use servomux_hal::{PeriodicTimer, TickHandler, TimerError};

/// SysTick reload register width
const MAX_RELOAD: u32 = 0x00FF_FFFF;

static HANDLER: Mutex<Cell<Option<&'static dyn TickHandler>>> = Mutex::new(Cell::new(None));

/// SysTick clocked from the processor core
pub struct SysTickTimer {
    syst: SYST,
    core_hz: u32,
}

impl SysTickTimer {
    /// Take ownership of SysTick
    ///
    /// `core_hz` is the processor clock, e.g. `embassy_rp::clocks::clk_sys_freq()`.
    pub fn new(syst: SYST, core_hz: u32) -> Self {
        Self { syst, core_hz }
    }

    /// Reload value producing one exception every `interval_us`
    pub fn reload_for(core_hz: u32, interval_us: u32) -> Result<u32, TimerError> {
        let cycles = u64::from(core_hz) * u64::from(interval_us) / 1_000_000;
        if cycles == 0 || cycles - 1 > u64::from(MAX_RELOAD) {
            return Err(TimerError::InvalidInterval);
        }
        Ok((cycles - 1) as u32)
    }

    fn stop(&mut self) {
        self.syst.disable_interrupt();
        self.syst.disable_counter();
    }
}

impl PeriodicTimer for SysTickTimer {
    fn attach(
        &mut self,
        interval_us: u32,
        handler: &'static dyn TickHandler,
    ) -> Result<(), TimerError> {
        let reload = Self::reload_for(self.core_hz, interval_us)?;

        self.stop();
        critical_section::with(|cs| HANDLER.borrow(cs).set(Some(handler)));

        self.syst.set_clock_source(SystClkSource::Core);
        self.syst.set_reload(reload);
        self.syst.clear_current();
        self.syst.enable_interrupt();
        self.syst.enable_counter();
        Ok(())
    }

    fn detach(&mut self) {
        self.stop();
        critical_section::with(|cs| HANDLER.borrow(cs).set(None));
    }
}

#[exception]
fn SysTick() {
    let handler = critical_section::with(|cs| HANDLER.borrow(cs).get());
    if let Some(handler) = handler {
        handler.on_tick();
    }
}
