//! Cycle-counter clock and the embassy-time watchdog deadline

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};
use embedded_hal::delay::DelayNs;
use textpanel_hal::{Clock, DeadlineTimer};

/// Clock and delays from the DWT cycle counter
///
/// The counter must be enabled (`DCB::enable_trace`,
/// `DWT::enable_cycle_counter`) before use.
pub struct CycleClock {
    cycles_per_us: u32,
}

impl CycleClock {
    pub const fn new(sysclk_hz: u32) -> Self {
        Self {
            cycles_per_us: sysclk_hz / 1_000_000,
        }
    }
}

impl Clock for CycleClock {
    fn now(&self) -> u32 {
        cortex_m::peripheral::DWT::cycle_count()
    }

    fn ticks_per_us(&self) -> u32 {
        self.cycles_per_us
    }
}

impl DelayNs for CycleClock {
    fn delay_ns(&mut self, ns: u32) {
        let cycles = u64::from(ns) * u64::from(self.cycles_per_us) / 1000;
        cortex_m::asm::delay(cycles.min(u64::from(u32::MAX)) as u32);
    }
}

/// Deadline requests from the engine to [`run_deadline`]: `None` cancels
pub type DeadlineSignal = Signal<CriticalSectionRawMutex, Option<Instant>>;

/// Watchdog timer backed by an embassy-time task
pub struct SignalDeadline {
    signal: &'static DeadlineSignal,
}

impl SignalDeadline {
    pub const fn new(signal: &'static DeadlineSignal) -> Self {
        Self { signal }
    }
}

impl DeadlineTimer for SignalDeadline {
    fn arm(&mut self, timeout_ms: u32) {
        let at = Instant::now() + Duration::from_millis(u64::from(timeout_ms));
        self.signal.signal(Some(at));
    }

    fn cancel(&mut self) {
        self.signal.signal(None);
    }
}

/// Wait on deadline requests and call `expire` when one passes
///
/// A newer request replaces the pending one.
pub async fn run_deadline(signal: &'static DeadlineSignal, mut expire: impl FnMut()) -> ! {
    let mut deadline = None;
    loop {
        deadline = match deadline {
            None => signal.wait().await,
            Some(at) => match select(Timer::at(at), signal.wait()).await {
                Either::First(()) => {
                    expire();
                    None
                }
                Either::Second(next) => next,
            },
        };
    }
}
