//! Time sources
//!
//! Blocking delays use [`embedded_hal::delay::DelayNs`]; this module adds
//! the free-running tick counter used for bounded polling and the watchdog
//! deadline timer.

/// Free-running tick counter
pub trait Clock {
    /// Current tick count; wraps at `u32::MAX`
    fn now(&self) -> u32;

    /// Ticks per microsecond
    fn ticks_per_us(&self) -> u32;

    /// Microseconds elapsed since the tick count `since`
    ///
    /// Correct across one wrap of the counter.
    fn elapsed_us(&self, since: u32) -> u32 {
        self.now().wrapping_sub(since) / self.ticks_per_us().max(1)
    }
}

/// Single-shot deadline timer
///
/// When an armed deadline passes, the platform delivers a timeout event to
/// the engine (for the STM32 firmware: by pending the I2C error interrupt).
pub trait DeadlineTimer {
    /// Arm (or re-arm) the deadline `timeout_ms` from now
    fn arm(&mut self, timeout_ms: u32);

    /// Cancel the deadline; a no-op if not armed
    fn cancel(&mut self);
}
