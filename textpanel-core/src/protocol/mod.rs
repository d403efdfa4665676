//! Wire encoders
//!
//! A protocol turns a [`TextBuffer`] snapshot into the next DMA payload and
//! knows how to bring its controller up after a reset. The engine owns the
//! transmit buffer and only calls [`DisplayProtocol::next_payload`] after
//! the previous transfer has completed, so encoders never race the DMA.

pub mod hd44780;
pub mod ssd1306;

use embedded_hal::delay::DelayNs;
use textpanel_hal::{BusError, Clock, I2cConfig, I2cController};

use crate::bus::BlockingBus;
use crate::discovery::{Device, DeviceKind};
use crate::font::Font;
use crate::text::TextBuffer;

pub use hd44780::Hd44780;
pub use ssd1306::{OledCycle, Ssd1306};

/// Capacity of the transmit buffer
pub const TX_CAPACITY: usize = 256;

/// DMA transmit buffer
pub type TxBuffer = heapless::Vec<u8, TX_CAPACITY>;

/// How bring-up left the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Opening {
    /// Transaction is open and addressed; the buffer can go out by DMA now
    Established,
    /// The buffer must be sent in a new interrupt-driven transaction
    Deferred,
}

/// What the engine does with a freshly built payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Payload {
    /// This payload finishes a full pass over the text; bump the counter
    pub sweep_complete: bool,
    /// Close the current transaction and send the payload in a new one
    pub reopen: bool,
}

/// A display controller's wire protocol
pub trait DisplayProtocol {
    /// Bus timing the controller runs at
    fn bus_config(&self) -> I2cConfig;

    /// Bring the controller up and load the first payload into `tx`
    ///
    /// Any cycle state is reset.
    fn bring_up<I, C>(
        &mut self,
        bus: &mut BlockingBus<'_, I, C>,
        address: u8,
        backlight: bool,
        tx: &mut TxBuffer,
    ) -> Result<Opening, BusError>
    where
        I: I2cController,
        C: Clock + DelayNs;

    /// Build the next payload from `snapshot` into `tx`
    fn next_payload(&mut self, snapshot: &TextBuffer, tx: &mut TxBuffer) -> Payload;
}

/// The protocol selected for the session
#[derive(Debug, Clone, Copy)]
pub enum Protocol {
    /// HD44780 behind a PCF8574 backpack
    Lcd(Hd44780),
    /// SSD1306 128x32
    Oled(Ssd1306),
}

impl Protocol {
    /// Select the protocol for a discovered device
    pub fn for_device(device: &Device, font: Font) -> Self {
        match device.kind {
            DeviceKind::Lcd => Protocol::Lcd(Hd44780::new()),
            DeviceKind::Oled => Protocol::Oled(Ssd1306::new(font)),
        }
    }
}

impl DisplayProtocol for Protocol {
    fn bus_config(&self) -> I2cConfig {
        match self {
            Protocol::Lcd(lcd) => lcd.bus_config(),
            Protocol::Oled(oled) => oled.bus_config(),
        }
    }

    fn bring_up<I, C>(
        &mut self,
        bus: &mut BlockingBus<'_, I, C>,
        address: u8,
        backlight: bool,
        tx: &mut TxBuffer,
    ) -> Result<Opening, BusError>
    where
        I: I2cController,
        C: Clock + DelayNs,
    {
        match self {
            Protocol::Lcd(lcd) => lcd.bring_up(bus, address, backlight, tx),
            Protocol::Oled(oled) => oled.bring_up(bus, address, backlight, tx),
        }
    }

    fn next_payload(&mut self, snapshot: &TextBuffer, tx: &mut TxBuffer) -> Payload {
        match self {
            Protocol::Lcd(lcd) => lcd.next_payload(snapshot, tx),
            Protocol::Oled(oled) => oled.next_payload(snapshot, tx),
        }
    }
}

/// Append to the transmit buffer
///
/// Payloads top out at exactly [`TX_CAPACITY`], so this never truncates.
pub(crate) fn emit(tx: &mut TxBuffer, bytes: &[u8]) {
    let fits = tx.extend_from_slice(bytes).is_ok();
    debug_assert!(fits, "payload exceeds transmit buffer");
}
