//! I2C2 master at register level
//!
//! `SR1` bit positions match [`StatusFlags`], so status reads pass through.

use embassy_stm32::pac;
use textpanel_hal::{I2cConfig, I2cController, StatusFlags};

const I2C: pac::i2c::I2c = pac::I2C2;

/// Fast-mode bit in `CCR`
const CCR_FAST: u32 = 1 << 15;

/// Bus timing register values for one configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    /// `CR2.FREQ`: peripheral clock in MHz
    pub freq_mhz: u8,
    /// `CCR` including the fast-mode bit
    pub ccr: u32,
    /// `TRISE`: maximum rise time in peripheral clocks, plus one
    pub trise: u8,
}

impl Timing {
    /// Compute timing for `config` from a `pclk_hz` APB1 clock
    ///
    /// Standard mode uses a 1:1 duty cycle and 1000 ns rise time; fast mode
    /// uses 2:1 and 300 ns.
    pub const fn new(config: I2cConfig, pclk_hz: u32) -> Self {
        let freq_mhz = pclk_hz / 1_000_000;
        if config.is_fast() {
            let ccr = pclk_hz / (3 * config.frequency);
            Self {
                freq_mhz: freq_mhz as u8,
                ccr: CCR_FAST | if ccr == 0 { 1 } else { ccr },
                trise: (freq_mhz * 300 / 1000 + 1) as u8,
            }
        } else {
            let ccr = pclk_hz / (2 * config.frequency);
            Self {
                freq_mhz: freq_mhz as u8,
                ccr: if ccr < 4 { 4 } else { ccr },
                trise: (freq_mhz + 1) as u8,
            }
        }
    }
}

/// I2C2 peripheral
pub struct I2c2 {
    pclk_hz: u32,
}

impl I2c2 {
    /// Wrap I2C2, clocked from an APB1 bus running at `pclk_hz`
    pub const fn new(pclk_hz: u32) -> Self {
        Self { pclk_hz }
    }
}

impl I2cController for I2c2 {
    fn configure(&mut self, config: I2cConfig) {
        let timing = Timing::new(config, self.pclk_hz);

        pac::RCC.apb1enr().modify(|w| w.set_i2c2en(true));
        I2C.cr1().modify(|w| w.set_pe(false));
        I2C.cr2().modify(|w| w.0 = u32::from(timing.freq_mhz));
        I2C.ccr().modify(|w| w.0 = timing.ccr);
        I2C.trise().modify(|w| w.0 = u32::from(timing.trise));
        I2C.cr1().modify(|w| w.set_pe(true));

        #[cfg(feature = "defmt")]
        defmt::debug!("I2C2: {} Hz, {}", config.frequency, timing);
    }

    fn reset(&mut self) {
        I2C.cr1().modify(|w| w.set_swrst(true));
        I2C.cr1().modify(|w| w.set_swrst(false));
    }

    fn release(&mut self) {
        I2C.cr1().modify(|w| w.set_pe(false));
        pac::RCC.apb1rstr().modify(|w| w.set_i2c2rst(true));
        pac::RCC.apb1rstr().modify(|w| w.set_i2c2rst(false));
        pac::RCC.apb1enr().modify(|w| w.set_i2c2en(false));
    }

    fn status(&self) -> StatusFlags {
        status_register()
    }

    fn clear_errors(&mut self) -> StatusFlags {
        let errors = self.status().errors();
        // Error bits are rc_w0; writing 1 to the rest leaves them alone
        I2C.sr1().modify(|w| w.0 = 0xffff & !u32::from(errors.bits()));
        errors
    }

    fn generate_start(&mut self) {
        I2C.cr1().modify(|w| w.set_start(true));
    }

    fn generate_stop(&mut self) {
        I2C.cr1().modify(|w| w.set_stop(true));
    }

    fn stop_pending(&self) -> bool {
        I2C.cr1().read().stop()
    }

    fn write_data(&mut self, byte: u8) {
        I2C.dr().write(|w| w.0 = u32::from(byte));
    }

    fn acknowledge_address(&mut self) {
        // ADDR clears on SR1 then SR2 read
        let _ = I2C.sr1().read();
        let _ = I2C.sr2().read();
    }

    fn set_event_interrupt(&mut self, enabled: bool) {
        // The event line also carries end-of-transfer while DMA is enabled
        I2C.cr2().modify(|w| {
            let dma = w.dmaen();
            w.set_itevten(enabled || dma);
        });
    }

    fn set_error_interrupt(&mut self, enabled: bool) {
        I2C.cr2().modify(|w| w.set_iterren(enabled));
    }

    fn set_dma_requests(&mut self, enabled: bool) {
        I2C.cr2().modify(|w| {
            w.set_dmaen(enabled);
            if enabled {
                w.set_itevten(true);
            }
        });
    }
}

/// Address of the data register, for the DMA channel
pub(crate) fn data_register() -> u32 {
    I2C.dr().as_ptr() as u32
}

/// Read `SR1`
pub(crate) fn status_register() -> StatusFlags {
    StatusFlags(I2C.sr1().read().0 as u16)
}
