//! SSD1306 128x32 OLED
//!
//! Text rows are 16 pixels tall, so each text row is two display pages
//! (256 bytes of raster in horizontal addressing mode). Each transaction
//! carries a short command preamble followed by raster for row 0 then
//! row 1; the transaction is then closed and a new one opened, so a lost
//! byte can only corrupt one pass.

use embedded_hal::delay::DelayNs;
use textpanel_hal::{BusError, Clock, I2cConfig, I2cController};

use super::{emit, DisplayProtocol, Opening, Payload, TxBuffer};
use crate::bus::BlockingBus;
use crate::font::Font;
use crate::text::{TextBuffer, COLUMNS};

/// Display width in pixels (one byte per column per page)
pub const WIDTH: usize = 128;

/// Raster bytes for one 16-pixel text row
pub const ROW_LEN: usize = 2 * WIDTH;

/// Control byte: one command byte follows
const CONTROL_COMMAND: u8 = 0x80;

/// Control byte: every following byte is display data
const CONTROL_DATA: u8 = 0x40;

/// SSD1306 commands
mod cmd {
    pub const SET_MEMORY_MODE: u8 = 0x20;
    pub const SET_COLUMN_RANGE: u8 = 0x21;
    pub const SET_PAGE_RANGE: u8 = 0x22;
    pub const SET_START_LINE: u8 = 0x40;
    pub const SET_CONTRAST: u8 = 0x81;
    pub const SET_CHARGE_PUMP: u8 = 0x8d;
    pub const SET_SEG_REMAP: u8 = 0xa1;
    pub const RESUME_FROM_RAM: u8 = 0xa4;
    pub const SET_NORMAL: u8 = 0xa6;
    pub const SET_MUX_RATIO: u8 = 0xa8;
    pub const DISPLAY_OFF: u8 = 0xae;
    pub const DISPLAY_ON: u8 = 0xaf;
    pub const SET_COM_SCAN_DEC: u8 = 0xc8;
    pub const SET_DISPLAY_OFFSET: u8 = 0xd3;
    pub const SET_CLOCK_DIV: u8 = 0xd5;
    pub const SET_PRECHARGE: u8 = 0xd9;
    pub const SET_COM_PINS: u8 = 0xda;
    pub const SET_VCOM_DETECT: u8 = 0xdb;
    pub const DEACTIVATE_SCROLL: u8 = 0x2e;
}

/// Controller setup for a 128x32 panel with internal charge pump
const INIT: [u8; 22] = [
    cmd::SET_CLOCK_DIV,
    0x80,
    cmd::SET_MUX_RATIO,
    31,
    cmd::SET_DISPLAY_OFFSET,
    0,
    cmd::SET_START_LINE,
    cmd::SET_CHARGE_PUMP,
    0x14,
    cmd::SET_SEG_REMAP,
    cmd::SET_COM_SCAN_DEC,
    cmd::SET_COM_PINS,
    0x02, // sequential
    cmd::SET_CONTRAST,
    0x8f,
    cmd::SET_PRECHARGE,
    0xf1,
    cmd::SET_VCOM_DETECT,
    0x20,
    cmd::RESUME_FROM_RAM,
    cmd::SET_NORMAL,
    cmd::DEACTIVATE_SCROLL,
];

/// Where the OLED refresh loop is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OledCycle {
    /// Next payload is the raster for text row 0
    Row0Pending,
    /// Next payload is the raster for text row 1
    Row1Pending,
    /// Next payload closes the transaction and reopens with the preamble
    ReopenPending,
}

/// Append `commands`, each behind its own command control byte
fn commands(tx: &mut TxBuffer, commands: &[u8]) {
    for &c in commands {
        emit(tx, &[CONTROL_COMMAND, c]);
    }
}

/// Addressing window reset plus display on/off, then switch to data
pub fn preamble(tx: &mut TxBuffer, display_on: bool) {
    commands(
        tx,
        &[
            cmd::SET_MEMORY_MODE,
            0, // horizontal
            cmd::SET_COLUMN_RANGE,
            0,
            WIDTH as u8 - 1,
            cmd::SET_PAGE_RANGE,
            0,
            3,
            if display_on {
                cmd::DISPLAY_ON
            } else {
                cmd::DISPLAY_OFF
            },
        ],
    );
    emit(tx, &[CONTROL_DATA]);
}

/// Raster one text row: top halves fill the first page, bottom halves
/// the second
pub fn render_row(font: &Font, chars: &[u8; COLUMNS], tx: &mut TxBuffer) {
    let mut page = [0u8; 8];
    for half in 0..2 {
        for &c in chars {
            let (top, bottom) = font.glyph(c);
            let src = if half == 0 { top } else { bottom };
            page.fill(0);
            page[..src.len()].copy_from_slice(src);
            emit(tx, &page);
        }
    }
}

/// SSD1306 encoder
#[derive(Debug, Clone, Copy)]
pub struct Ssd1306 {
    cycle: OledCycle,
    font: Font,
}

impl Ssd1306 {
    /// Create an encoder rendering with `font`
    pub const fn new(font: Font) -> Self {
        Self {
            cycle: OledCycle::Row0Pending,
            font,
        }
    }

    /// Current cycle position
    pub fn cycle(&self) -> OledCycle {
        self.cycle
    }
}

impl DisplayProtocol for Ssd1306 {
    fn bus_config(&self) -> I2cConfig {
        I2cConfig::FAST
    }

    /// Controller init plus preamble in one deferred transaction
    fn bring_up<I, C>(
        &mut self,
        _bus: &mut BlockingBus<'_, I, C>,
        _address: u8,
        backlight: bool,
        tx: &mut TxBuffer,
    ) -> Result<Opening, BusError>
    where
        I: I2cController,
        C: Clock + DelayNs,
    {
        tx.clear();
        commands(tx, &INIT);
        preamble(tx, backlight);
        self.cycle = OledCycle::Row0Pending;
        Ok(Opening::Deferred)
    }

    fn next_payload(&mut self, snapshot: &TextBuffer, tx: &mut TxBuffer) -> Payload {
        tx.clear();
        match self.cycle {
            OledCycle::Row0Pending | OledCycle::Row1Pending => {
                let row = usize::from(self.cycle == OledCycle::Row1Pending);
                render_row(&self.font, &snapshot.rows[row], tx);
                self.cycle = if row == 0 {
                    OledCycle::Row1Pending
                } else {
                    OledCycle::ReopenPending
                };
                Payload {
                    sweep_complete: false,
                    reopen: false,
                }
            }
            OledCycle::ReopenPending => {
                preamble(tx, snapshot.backlight);
                self.cycle = OledCycle::Row0Pending;
                Payload {
                    sweep_complete: true,
                    reopen: true,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FONT_8X16;
    use crate::mock::{MockClock, MockI2c};
    use proptest::prelude::*;

    #[test]
    fn test_row_raster_layout() {
        let mut chars = [b' '; COLUMNS];
        chars[1] = b'|';
        let mut tx = TxBuffer::new();
        render_row(&FONT_8X16, &chars, &mut tx);
        assert_eq!(tx.len(), ROW_LEN);

        let (top, bottom) = FONT_8X16.glyph(b'|');
        assert_eq!(&tx[8..16], top);
        assert_eq!(&tx[WIDTH + 8..WIDTH + 16], bottom);
        assert!(tx[..8].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_narrow_font_is_zero_filled() {
        static NARROW: [u8; crate::font::GLYPHS * 14] = [0xff; crate::font::GLYPHS * 14];
        let font = Font::new(7, &NARROW).unwrap();
        let mut tx = TxBuffer::new();
        render_row(&font, &[b'A'; COLUMNS], &mut tx);
        assert_eq!(tx.len(), ROW_LEN);
        for cell in tx.chunks(8) {
            assert_eq!(cell, &[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x00]);
        }
    }

    #[test]
    fn test_preamble() {
        let mut tx = TxBuffer::new();
        preamble(&mut tx, true);
        assert_eq!(
            tx.as_slice(),
            &[
                0x80, 0x20, 0x80, 0x00, 0x80, 0x21, 0x80, 0x00, 0x80, 0x7f, 0x80, 0x22, 0x80,
                0x00, 0x80, 0x03, 0x80, 0xaf, 0x40
            ]
        );
        tx.clear();
        preamble(&mut tx, false);
        assert_eq!(tx[tx.len() - 2], 0xae);
    }

    #[test]
    fn test_bring_up_is_deferred() {
        let mut i2c = MockI2c::with_device(0x3c);
        let mut clock = MockClock::new();
        let mut tx = TxBuffer::new();
        let mut oled = Ssd1306::new(FONT_8X16);
        oled.cycle = OledCycle::ReopenPending;
        let opening = {
            let mut bus = BlockingBus::new(&mut i2c, &mut clock, 10_000);
            oled.bring_up(&mut bus, 0x3c, false, &mut tx)
        };
        assert_eq!(opening, Ok(Opening::Deferred));
        assert_eq!(oled.cycle(), OledCycle::Row0Pending);
        assert!(i2c.ops.is_empty());
        assert_eq!(tx.len(), 2 * INIT.len() + 19);
        assert_eq!(&tx[..4], &[0x80, 0xd5, 0x80, 0x80]);
    }

    proptest! {
        #[test]
        fn cycle_order_and_counting(steps in 1usize..40) {
            let mut oled = Ssd1306::new(FONT_8X16);
            let snapshot = TextBuffer::new();
            let mut tx = TxBuffer::new();
            let mut sweeps = 0;
            for i in 0..steps {
                let before = oled.cycle();
                let expected = match i % 3 {
                    0 => OledCycle::Row0Pending,
                    1 => OledCycle::Row1Pending,
                    _ => OledCycle::ReopenPending,
                };
                prop_assert_eq!(before, expected);

                let payload = oled.next_payload(&snapshot, &mut tx);
                prop_assert_eq!(payload.reopen, before == OledCycle::ReopenPending);
                prop_assert_eq!(payload.sweep_complete, payload.reopen);
                if payload.sweep_complete {
                    sweeps += 1;
                } else {
                    prop_assert_eq!(tx.len(), ROW_LEN);
                }
            }
            prop_assert_eq!(sweeps, steps / 3);
        }
    }
}
