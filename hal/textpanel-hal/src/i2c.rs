//! I2C master abstractions
//!
//! The engine drives the peripheral at register level: it needs to see the
//! individual START/address/byte-transferred events and hand the data phase
//! to DMA, which a transaction-level `write()` API cannot express.

/// I2C configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl I2cConfig {
    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self { frequency: 100_000 };

    /// Fast mode (400 kHz)
    pub const FAST: Self = Self { frequency: 400_000 };

    /// Check whether this configuration needs fast-mode timing
    pub const fn is_fast(&self) -> bool {
        self.frequency > Self::STANDARD.frequency
    }
}

/// Snapshot of the peripheral status flags
///
/// Bit positions follow the STM32 `I2C_SR1` layout so that implementations
/// on that family can pass the register through unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusFlags(pub u16);

impl StatusFlags {
    /// START condition generated
    pub const START: Self = Self(1 << 0);
    /// Address sent and acknowledged
    pub const ADDRESS: Self = Self(1 << 1);
    /// Byte transfer finished (data and shift registers empty)
    pub const BYTE_TRANSFERRED: Self = Self(1 << 2);
    /// Misplaced START/STOP seen on the bus
    pub const BUS_ERROR: Self = Self(1 << 8);
    /// Arbitration lost
    pub const ARBITRATION_LOST: Self = Self(1 << 9);
    /// Acknowledge failure
    pub const NACK: Self = Self(1 << 10);
    /// Overrun/underrun
    pub const OVERRUN: Self = Self(1 << 11);
    /// PEC error in reception
    pub const PEC: Self = Self(1 << 12);
    /// SCL held low too long
    pub const TIMEOUT: Self = Self(1 << 14);
    /// SMBus alert
    pub const SMBUS_ALERT: Self = Self(1 << 15);

    /// Every error flag
    pub const ERRORS: Self = Self(
        Self::BUS_ERROR.0
            | Self::ARBITRATION_LOST.0
            | Self::NACK.0
            | Self::OVERRUN.0
            | Self::PEC.0
            | Self::TIMEOUT.0
            | Self::SMBUS_ALERT.0,
    );

    /// No flags set
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Raw bits
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Check that every flag in `other` is set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Check that any flag in `other` is set
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Only the error flags
    pub const fn errors(self) -> Self {
        Self(self.0 & Self::ERRORS.0)
    }

    /// Check if any error flag is set
    pub const fn has_errors(self) -> bool {
        self.intersects(Self::ERRORS)
    }
}

impl core::ops::BitOr for StatusFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Error from a polled I2C operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Bus error (misplaced START/STOP)
    Bus,
    /// Arbitration lost
    ArbitrationLost,
    /// NACK received
    Nack,
    /// Overrun
    Overrun,
    /// A bounded wait expired; the bus looks locked up
    Timeout,
    /// Other error
    Other,
}

impl BusError {
    /// Classify the error flags of a status snapshot
    ///
    /// Returns `None` when no error flag is set.
    pub fn from_flags(flags: StatusFlags) -> Option<Self> {
        if !flags.has_errors() {
            None
        } else if flags.contains(StatusFlags::NACK) {
            Some(BusError::Nack)
        } else if flags.contains(StatusFlags::BUS_ERROR) {
            Some(BusError::Bus)
        } else if flags.contains(StatusFlags::ARBITRATION_LOST) {
            Some(BusError::ArbitrationLost)
        } else if flags.contains(StatusFlags::OVERRUN) {
            Some(BusError::Overrun)
        } else if flags.contains(StatusFlags::TIMEOUT) {
            Some(BusError::Timeout)
        } else {
            Some(BusError::Other)
        }
    }

    /// The status flag that reports this error, if the peripheral has one
    ///
    /// [`BusError::Timeout`] maps to the SCL-low timeout flag; a polling
    /// bound expiring leaves no trace in the status register.
    pub fn flag(self) -> StatusFlags {
        match self {
            BusError::Bus => StatusFlags::BUS_ERROR,
            BusError::ArbitrationLost => StatusFlags::ARBITRATION_LOST,
            BusError::Nack => StatusFlags::NACK,
            BusError::Overrun => StatusFlags::OVERRUN,
            BusError::Timeout => StatusFlags::TIMEOUT,
            BusError::Other => StatusFlags::empty(),
        }
    }
}

/// Register-level I2C master
///
/// Every method is a single register poke or peek; sequencing and waiting
/// is the caller's business.
pub trait I2cController {
    /// Power the peripheral, apply bus timing and enable it
    ///
    /// Interrupt and DMA request enables are cleared.
    fn configure(&mut self, config: I2cConfig);

    /// Force a software reset of the peripheral
    fn reset(&mut self);

    /// Disable the peripheral and gate its clock
    fn release(&mut self);

    /// Read the status flags
    fn status(&self) -> StatusFlags;

    /// Clear the error flags, returning the ones that were set
    fn clear_errors(&mut self) -> StatusFlags;

    /// Request a START condition
    fn generate_start(&mut self);

    /// Request a STOP condition
    fn generate_stop(&mut self);

    /// Check whether a requested STOP has yet to go out on the wire
    fn stop_pending(&self) -> bool;

    /// Write the data register (address byte or payload byte)
    fn write_data(&mut self, byte: u8);

    /// Complete the address phase by clearing the address flag
    fn acknowledge_address(&mut self);

    /// Enable or disable the per-event interrupt (START, address)
    fn set_event_interrupt(&mut self, enabled: bool);

    /// Enable or disable the error interrupt
    fn set_error_interrupt(&mut self, enabled: bool);

    /// Enable or disable DMA requests from the data register
    fn set_dma_requests(&mut self, enabled: bool);
}
