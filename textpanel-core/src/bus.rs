//! Polled I2C access with bounded waits
//!
//! Used by discovery and protocol bring-up, and by the OLED reopen step to
//! close the previous transaction. Every status wait goes through
//! [`BlockingBus::wait_for`], which gives up after a fixed bound and marks
//! the bus as locked up.

use embedded_hal::delay::DelayNs;
use textpanel_hal::{BusError, Clock, I2cController, StatusFlags};

/// Polled master-transmit over an [`I2cController`]
pub struct BlockingBus<'b, I, C> {
    i2c: &'b mut I,
    clock: &'b mut C,
    bound_us: u32,
    locked_up: bool,
}

impl<'b, I, C> BlockingBus<'b, I, C>
where
    I: I2cController,
    C: Clock + DelayNs,
{
    /// Wrap a controller; each wait gives up after `bound_us`
    pub fn new(i2c: &'b mut I, clock: &'b mut C, bound_us: u32) -> Self {
        Self {
            i2c,
            clock,
            bound_us,
            locked_up: false,
        }
    }

    /// Whether any wait has timed out (sticky)
    pub fn locked_up(&self) -> bool {
        self.locked_up
    }

    /// Spin until every flag in `flags` is set
    ///
    /// Error flags end the wait early: they are cleared and reported.
    pub fn wait_for(&mut self, flags: StatusFlags) -> Result<(), BusError> {
        let start = self.clock.now();
        loop {
            let status = self.i2c.status();
            if status.contains(flags) {
                return Ok(());
            }
            if status.has_errors() {
                let cleared = self.i2c.clear_errors();
                return Err(BusError::from_flags(status | cleared).unwrap_or(BusError::Other));
            }
            if self.clock.elapsed_us(start) > self.bound_us {
                self.locked_up = true;
                return Err(BusError::Timeout);
            }
        }
    }

    /// Spin until a requested STOP has gone out
    pub fn wait_for_stop(&mut self) -> Result<(), BusError> {
        let start = self.clock.now();
        while self.i2c.stop_pending() {
            if self.clock.elapsed_us(start) > self.bound_us {
                self.locked_up = true;
                return Err(BusError::Timeout);
            }
        }
        Ok(())
    }

    /// START, then address `address` for writing
    pub fn start(&mut self, address: u8) -> Result<(), BusError> {
        self.i2c.generate_start();
        self.wait_for(StatusFlags::START)?;
        self.i2c.write_data(address << 1);
        self.wait_for(StatusFlags::ADDRESS)?;
        self.i2c.acknowledge_address();
        Ok(())
    }

    /// Send one data byte and wait for it to clock out
    pub fn send(&mut self, byte: u8) -> Result<(), BusError> {
        self.i2c.write_data(byte);
        self.wait_for(StatusFlags::BYTE_TRANSFERRED)
    }

    /// Send several data bytes
    pub fn send_all(&mut self, bytes: &[u8]) -> Result<(), BusError> {
        bytes.iter().try_for_each(|&b| self.send(b))
    }

    /// STOP and wait for it to go out
    pub fn stop(&mut self) -> Result<(), BusError> {
        self.i2c.generate_stop();
        self.wait_for_stop()
    }

    /// Wait for the last byte of a DMA transfer to clock out, then STOP
    pub fn finish(&mut self) -> Result<(), BusError> {
        self.wait_for(StatusFlags::BYTE_TRANSFERRED)?;
        self.stop()
    }

    /// Check whether a device acknowledges `address`
    ///
    /// START, address, one zero byte, STOP. Any error means no.
    pub fn probe(&mut self, address: u8) -> bool {
        let acked = self.start(address).and_then(|()| self.send(0)).is_ok();
        if acked {
            // A stuck STOP is caught by the next probe's START wait
            let _ = self.stop();
        }
        acked
    }

    /// Blocking delay
    pub fn delay_us(&mut self, us: u32) {
        self.clock.delay_us(us);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{I2cOp, MockClock, MockI2c};

    #[test]
    fn test_probe_acknowledged() {
        let mut i2c = MockI2c::with_device(0x27);
        let mut clock = MockClock::new();
        let mut bus = BlockingBus::new(&mut i2c, &mut clock, 10_000);
        assert!(bus.probe(0x27));
        assert!(!bus.locked_up());
        assert_eq!(
            i2c.ops,
            vec![
                I2cOp::Start,
                I2cOp::Write(0x27 << 1),
                I2cOp::AckAddress,
                I2cOp::Write(0),
                I2cOp::Stop,
            ]
        );
    }

    #[test]
    fn test_probe_nack_clears_error() {
        let mut i2c = MockI2c::with_device(0x27);
        let mut clock = MockClock::new();
        let mut bus = BlockingBus::new(&mut i2c, &mut clock, 10_000);
        assert!(!bus.probe(0x26));
        assert!(!bus.locked_up());
        assert!(!i2c.status().has_errors());
    }

    #[test]
    fn test_wait_times_out() {
        let mut i2c = MockI2c::with_device(0x27);
        i2c.start_hangs = true;
        let mut clock = MockClock::new();
        let mut bus = BlockingBus::new(&mut i2c, &mut clock, 10_000);
        assert_eq!(bus.start(0x27), Err(BusError::Timeout));
        assert!(bus.locked_up());
        assert!(clock.now() >= 10_000);
    }
}
