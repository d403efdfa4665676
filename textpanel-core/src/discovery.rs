//! Bus recovery and device discovery
//!
//! Runs in the foreground before the interrupt loop starts:
//!
//! 1. [`unwedge`]: if a slave was interrupted mid-acknowledge it is still
//!    holding SDA low; end its cycle and drive a STOP by hand.
//! 2. [`check_wiring`]: with the external pull-ups fitted, the weak internal
//!    pull-downs cannot drag either line low.
//! 3. [`probe`]: walk the address windows until something acknowledges.

use embedded_hal::delay::DelayNs;
use textpanel_hal::{BusLine, Clock, I2cController, LineMode};

use crate::bus::BlockingBus;
use crate::config::AddressRange;
use crate::error::InitError;

/// Controller family behind the discovered address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceKind {
    /// HD44780 behind a PCF8574 backpack
    Lcd,
    /// SSD1306 OLED
    Oled,
}

/// A discovered display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Device {
    /// 7-bit I2C address
    pub address: u8,
    /// Controller family
    pub kind: DeviceKind,
}

impl Device {
    /// Classify by address: only `oled_address` is an OLED
    pub fn classify(address: u8, oled_address: u8) -> Self {
        let kind = if address == oled_address {
            DeviceKind::Oled
        } else {
            DeviceKind::Lcd
        };
        Self { address, kind }
    }
}

/// Outcome of [`unwedge`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineState {
    /// Both lines were already idle
    Idle,
    /// SDA was held and has been released
    Released,
    /// A line is still low after the recovery sequence
    StillHeld,
}

/// Take both lines as open-drain outputs and clear a slave stuck in an
/// acknowledge cycle
pub fn unwedge<L, D>(scl: &mut L, sda: &mut L, delay: &mut D, settle_us: u32) -> LineState
where
    L: BusLine,
    D: DelayNs,
{
    for line in [&mut *scl, &mut *sda] {
        line.set_high();
        line.set_mode(LineMode::OpenDrainOutput);
    }
    delay.delay_us(settle_us);

    if !(scl.is_high() && sda.is_low()) {
        return LineState::Idle;
    }

    #[cfg(feature = "defmt")]
    defmt::warn!("I2C: SDA held by slave, clocking it out");

    // Hold SDA ourselves and pull SCL low to end the slave's ACK bit
    sda.set_low();
    scl.set_low();
    delay.delay_us(settle_us);
    scl.set_high();
    delay.delay_us(settle_us);
    // SDA rising while SCL is high: STOP
    sda.set_high();
    delay.delay_us(settle_us);

    if scl.is_low() || sda.is_low() {
        #[cfg(feature = "defmt")]
        defmt::warn!("I2C: still held");
        LineState::StillHeld
    } else {
        #[cfg(feature = "defmt")]
        defmt::info!("I2C: bus released");
        LineState::Released
    }
}

/// Fail if the weak pull-downs can drag either line low
pub fn check_wiring<L, D>(scl: &mut L, sda: &mut L, delay: &mut D, settle_us: u32) -> Result<(), InitError>
where
    L: BusLine,
    D: DelayNs,
{
    scl.set_mode(LineMode::PullDownInput);
    sda.set_mode(LineMode::PullDownInput);
    delay.delay_us(settle_us);

    if scl.is_low() || sda.is_low() {
        #[cfg(feature = "defmt")]
        defmt::error!("I2C: invalid bus (scl={}, sda={})", scl.is_high(), sda.is_high());
        return Err(InitError::BusWiring);
    }
    Ok(())
}

/// Probe each window in order; the first address to acknowledge wins
///
/// A timed-out wait abandons all remaining probing.
pub fn probe<I, C>(bus: &mut BlockingBus<'_, I, C>, ranges: &[AddressRange]) -> Result<u8, InitError>
where
    I: I2cController,
    C: Clock + DelayNs,
{
    for address in ranges.iter().flat_map(|&(first, last)| first..=last) {
        if bus.locked_up() {
            break;
        }
        if bus.probe(address) {
            #[cfg(feature = "defmt")]
            defmt::info!("I2C: device at {=u8:#x}", address);
            return Ok(address);
        }
    }

    let locked_up = bus.locked_up();
    #[cfg(feature = "defmt")]
    {
        if locked_up {
            defmt::error!("I2C: bus locked up");
        } else {
            defmt::error!("I2C: no device found");
        }
    }
    Err(InitError::DeviceNotFound { locked_up })
}
