//! HD44780 character LCD behind a PCF8574 I2C backpack
//!
//! The expander's eight outputs are wired D7 D6 D5 D4 BL EN RW RS (bit 7
//! down to bit 0), so the controller runs in 4-bit mode: each byte goes out
//! as two nibbles, and each nibble needs its own EN pulse, i.e. three
//! expander writes.

use embedded_hal::delay::DelayNs;
use textpanel_hal::{BusError, Clock, I2cConfig, I2cController};

use super::{emit, DisplayProtocol, Opening, Payload, TxBuffer};
use crate::bus::BlockingBus;
use crate::text::{TextBuffer, COLUMNS, ROWS};

/// PCF8574 output bits
pub mod pin {
    /// Register select: 1 for character data, 0 for commands
    pub const RS: u8 = 0x01;
    /// Enable strobe
    pub const EN: u8 = 0x04;
    /// Backlight transistor
    pub const BL: u8 = 0x08;
}

/// HD44780 commands
pub mod cmd {
    pub const ENTRY_MODE: u8 = 0x04;
    pub const ENTRY_INCREMENT: u8 = 0x02;
    pub const DISPLAY_CONTROL: u8 = 0x08;
    pub const DISPLAY_ON: u8 = 0x04;
    pub const FUNCTION_SET: u8 = 0x20;
    pub const FUNCTION_2LINE: u8 = 0x08;
    pub const SET_DDRAM_ADDR: u8 = 0x80;
}

/// DDRAM address stride between rows
const ROW_STRIDE: u8 = 0x40;

/// Expander writes per byte
pub const FRAME_LEN: usize = 6;

/// Bytes in a full-screen payload: an address command plus the characters,
/// per row
pub const SCREEN_LEN: usize = ROWS * (1 + COLUMNS) * FRAME_LEN;

/// Strobe one nibble (already in bits 7-4, with control bits) through EN
pub const fn nibble(value: u8) -> [u8; 3] {
    [value, value | pin::EN, value]
}

/// Encode a byte as two strobed nibbles; `signals` carries RS and BL
pub const fn frame(value: u8, signals: u8) -> [u8; FRAME_LEN] {
    let hi = nibble((value & 0xf0) | signals);
    let lo = nibble((value << 4) | signals);
    [hi[0], hi[1], hi[2], lo[0], lo[1], lo[2]]
}

/// Recover `(value, signals)` from a well-formed frame
pub fn decode(frame: &[u8; FRAME_LEN]) -> Option<(u8, u8)> {
    let strobed = |n: &[u8]| n[0] == n[2] && n[1] == (n[0] | pin::EN) && (n[0] & pin::EN) == 0;
    let (hi, lo) = frame.split_at(3);
    if !strobed(hi) || !strobed(lo) || (hi[0] & 0x0f) != (lo[0] & 0x0f) {
        return None;
    }
    Some(((hi[0] & 0xf0) | (lo[0] >> 4), hi[0] & 0x0f))
}

/// Render both rows into `tx`
pub fn render(snapshot: &TextBuffer, tx: &mut TxBuffer) {
    let bl = if snapshot.backlight { pin::BL } else { 0 };
    for (row, chars) in (0u8..).zip(snapshot.rows.iter()) {
        emit(tx, &frame(cmd::SET_DDRAM_ADDR | row * ROW_STRIDE, bl));
        for &c in chars {
            emit(tx, &frame(c, pin::RS | bl));
        }
    }
}

/// HD44780 encoder; stateless between payloads
#[derive(Debug, Clone, Copy, Default)]
pub struct Hd44780;

impl Hd44780 {
    pub const fn new() -> Self {
        Self
    }
}

impl DisplayProtocol for Hd44780 {
    fn bus_config(&self) -> I2cConfig {
        I2cConfig::STANDARD
    }

    /// Datasheet 4-bit initialization by polled writes, then the display
    /// setup commands left in `tx` for the first DMA
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
        bus.start(address)?;

        // Three times 8-bit mode resyncs from any state, then switch to 4-bit
        for (value, settle_us) in [(0x30, 4100), (0x30, 100), (0x30, 0), (0x20, 0)] {
            bus.send_all(&nibble(value))?;
            if settle_us > 0 {
                bus.delay_us(settle_us);
            }
        }

        let bl = if backlight { pin::BL } else { 0 };
        tx.clear();
        for command in [
            cmd::FUNCTION_SET | cmd::FUNCTION_2LINE,
            cmd::DISPLAY_CONTROL,
            cmd::ENTRY_MODE | cmd::ENTRY_INCREMENT,
            cmd::DISPLAY_CONTROL | cmd::DISPLAY_ON,
        ] {
            emit(tx, &frame(command, bl));
        }

        Ok(Opening::Established)
    }

    fn next_payload(&mut self, snapshot: &TextBuffer, tx: &mut TxBuffer) -> Payload {
        tx.clear();
        render(snapshot, tx);
        Payload {
            sweep_complete: true,
            reopen: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{I2cOp, MockClock, MockI2c};
    use proptest::prelude::*;

    fn frames(tx: &TxBuffer) -> Vec<(u8, u8)> {
        tx.chunks(FRAME_LEN)
            .map(|c| decode(c.try_into().unwrap()).unwrap())
            .collect()
    }

    #[test]
    fn test_nibble_strobe() {
        assert_eq!(frame(0x41, pin::RS), [0x41, 0x45, 0x41, 0x11, 0x15, 0x11]);
    }

    #[test]
    fn test_render_layout() {
        let mut snapshot = TextBuffer::new();
        snapshot.rows[0][0] = b'H';
        snapshot.rows[1][15] = b'!';
        snapshot.backlight = true;

        let mut tx = TxBuffer::new();
        let payload = Hd44780::new().next_payload(&snapshot, &mut tx);
        assert!(payload.sweep_complete);
        assert!(!payload.reopen);
        assert_eq!(tx.len(), SCREEN_LEN);
        assert_eq!(SCREEN_LEN, 204);

        let decoded = frames(&tx);
        assert_eq!(decoded[0], (0x80, pin::BL));
        assert_eq!(decoded[1], (b'H', pin::RS | pin::BL));
        assert_eq!(decoded[17], (0xc0, pin::BL));
        assert_eq!(decoded[33], (b'!', pin::RS | pin::BL));
        assert!(tx.iter().all(|b| b & pin::BL != 0));
    }

    #[test]
    fn test_backlight_off_clears_bit() {
        let mut tx = TxBuffer::new();
        render(&TextBuffer::new(), &mut tx);
        assert!(tx.iter().all(|b| b & pin::BL == 0));
    }

    #[test]
    fn test_bring_up_sequence() {
        let mut i2c = MockI2c::with_device(0x27);
        let mut clock = MockClock::new();
        let mut tx = TxBuffer::new();
        let opening = {
            let mut bus = BlockingBus::new(&mut i2c, &mut clock, 10_000);
            Hd44780::new().bring_up(&mut bus, 0x27, true, &mut tx)
        };
        assert_eq!(opening, Ok(Opening::Established));

        let written: Vec<u8> = i2c
            .ops
            .iter()
            .filter_map(|op| match op {
                I2cOp::Write(b) => Some(*b),
                _ => None,
            })
            .collect();
        assert_eq!(written[0], 0x27 << 1);
        assert_eq!(
            &written[1..],
            &[0x30, 0x34, 0x30, 0x30, 0x34, 0x30, 0x30, 0x34, 0x30, 0x20, 0x24, 0x20]
        );
        assert!(clock.delayed_us() >= 4200);

        assert_eq!(
            frames(&tx),
            vec![(0x28, pin::BL), (0x08, pin::BL), (0x06, pin::BL), (0x0c, pin::BL)]
        );
    }

    proptest! {
        #[test]
        fn frame_round_trips(value in any::<u8>(), rs in any::<bool>(), bl in any::<bool>()) {
            let signals = (if rs { pin::RS } else { 0 }) | (if bl { pin::BL } else { 0 });
            prop_assert_eq!(decode(&frame(value, signals)), Some((value, signals)));
        }
    }
}
