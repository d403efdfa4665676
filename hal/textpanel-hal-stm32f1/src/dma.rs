//! DMA1 channel 4 (I2C2 TX)
//!
//! The channel runs without its own interrupt: embassy-stm32 binds the DMA
//! vectors. Completion is checked from the I2C2 event handler with
//! [`transfer_done`].

use embassy_stm32::pac;
use textpanel_hal::{DmaChannel, StatusFlags};

use crate::i2c;

/// Channel 4, zero-based
const CHANNEL: usize = 3;

const CCR_EN: u32 = 1 << 0;
const CCR_DIR: u32 = 1 << 4;
const CCR_MINC: u32 = 1 << 7;

/// All four interrupt flags of the channel in `ISR`/`IFCR`
const FLAGS: u32 = 0xf << (4 * CHANNEL);
/// Transfer-complete flag of the channel
const TCIF: u32 = 1 << (4 * CHANNEL + 1);

/// Memory-to-peripheral channel into the I2C2 data register
pub struct I2cTxDma {
    _private: (),
}

impl I2cTxDma {
    /// Take the channel and gate its controller's clock on
    pub fn new() -> Self {
        pac::RCC.ahbenr().modify(|w| w.set_dma1en(true));
        Self { _private: () }
    }
}

impl DmaChannel for I2cTxDma {
    fn start(&mut self, data: &[u8]) {
        let ch = pac::DMA1.ch(CHANNEL);
        ch.cr().modify(|w| w.0 = 0);
        pac::DMA1.ifcr().write(|w| w.0 = FLAGS);
        ch.par().write_value(i2c::data_register());
        ch.mar().write_value(data.as_ptr() as u32);
        ch.ndtr().modify(|w| w.0 = data.len() as u32);
        // Byte-wide, memory increment, memory to peripheral
        ch.cr().modify(|w| w.0 = CCR_MINC | CCR_DIR | CCR_EN);
    }

    fn stop(&mut self) {
        pac::DMA1.ch(CHANNEL).cr().modify(|w| w.0 = 0);
        pac::DMA1.ifcr().write(|w| w.0 = FLAGS);
    }
}

/// Check whether the last DMA byte has left the shift register
///
/// The channel's transfer-complete flag is set regardless of its interrupt
/// enable; it stays set until the engine stops the channel.
pub fn transfer_done() -> bool {
    pac::DMA1.isr().read().0 & TCIF != 0
        && i2c::status_register().contains(StatusFlags::BYTE_TRANSFERRED)
}
