//! Fault bookkeeping and the transfer watchdog
//!
//! Faults never stop the display loop: the engine tears the peripheral down
//! and brings it back up. What's kept here is the evidence, for diagnostics.

use portable_atomic::{AtomicBool, Ordering};
use textpanel_hal::{DeadlineTimer, InterruptControl, IrqLine, StatusFlags};

/// A run-time fault in the refresh loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fault {
    /// A transfer or transaction opening outlived its deadline
    Timeout,
    /// The peripheral raised error flags
    Bus(StatusFlags),
}

/// Fault counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FaultStats {
    /// Faults of any kind
    pub total: u32,
    /// Watchdog expiries
    pub timeouts: u32,
    /// Error-flag faults
    pub bus_errors: u32,
    /// Error flags of the most recent fault (empty for a pure timeout)
    pub last_status: StatusFlags,
}

impl FaultStats {
    /// Create empty counters
    pub const fn new() -> Self {
        Self {
            total: 0,
            timeouts: 0,
            bus_errors: 0,
            last_status: StatusFlags::empty(),
        }
    }

    /// Count a fault; `status` is the error flags cleared while handling it
    pub fn record(&mut self, fault: Fault, status: StatusFlags) {
        self.total = self.total.saturating_add(1);
        match fault {
            Fault::Timeout => self.timeouts = self.timeouts.saturating_add(1),
            Fault::Bus(_) => self.bus_errors = self.bus_errors.saturating_add(1),
        }
        self.last_status = status;
    }
}

/// Single-shot deadline that remembers whether it is armed
///
/// A deadline that fires after [`cancel`](Self::cancel) (the timer
/// interrupt was already on its way) is stale and must be ignored.
#[derive(Debug)]
pub struct Watchdog<T> {
    timer: T,
    timeout_ms: u32,
    armed: bool,
}

impl<T: DeadlineTimer> Watchdog<T> {
    /// Wrap a timer; every arm uses `timeout_ms`
    pub fn new(timer: T, timeout_ms: u32) -> Self {
        Self {
            timer,
            timeout_ms,
            armed: false,
        }
    }

    /// Arm or re-arm the deadline
    pub fn arm(&mut self) {
        self.timer.arm(self.timeout_ms);
        self.armed = true;
    }

    /// Disarm the deadline
    pub fn cancel(&mut self) {
        self.timer.cancel();
        self.armed = false;
    }

    /// Whether a deadline is pending
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Consume a timer expiry: true if it was live, false if stale
    pub fn expire(&mut self) -> bool {
        core::mem::replace(&mut self.armed, false)
    }

    /// Underlying timer
    pub fn timer(&self) -> &T {
        &self.timer
    }
}

/// Carries a deadline expiry from the timer context into the I2C error
/// interrupt
///
/// Expiries and bus errors share the error vector; the handler uses
/// [`take`](Self::take) to tell them apart.
#[derive(Debug)]
pub struct ExpiryLatch {
    fired: AtomicBool,
}

impl ExpiryLatch {
    pub const fn new() -> Self {
        Self {
            fired: AtomicBool::new(false),
        }
    }

    /// Record an expiry and pend the error line
    pub fn fire(&self, irq: &mut impl InterruptControl) {
        self.fired.store(true, Ordering::Release);
        irq.set_pending(IrqLine::I2cError);
    }

    /// Consume a recorded expiry
    pub fn take(&self) -> bool {
        self.fired.swap(false, Ordering::AcqRel)
    }
}

impl Default for ExpiryLatch {
    fn default() -> Self {
        Self::new()
    }
}
