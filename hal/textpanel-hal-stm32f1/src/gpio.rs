//! PB10/PB11 as bus lines
//!
//! The F1 GPIO has no alternate-function mux; each pin is a 4-bit
//! MODE/CNF field in `CRH`, and pull direction is the `ODR` bit.

use embassy_stm32::pac;
use textpanel_hal::{BusLine, InputPin, LineMode, OutputPin};

/// Open-drain output, 2 MHz
const OUTPUT_OPEN_DRAIN: u32 = 0b0110;
/// Alternate-function open-drain, 2 MHz
const AF_OPEN_DRAIN: u32 = 0b1110;
/// Input with pull-up/pull-down
const INPUT_PULL: u32 = 0b1000;

/// One pin of port B
pub struct PortBLine {
    pin: u8,
}

impl PortBLine {
    /// PB10
    pub const fn scl() -> Self {
        Self { pin: 10 }
    }

    /// PB11
    pub const fn sda() -> Self {
        Self { pin: 11 }
    }

    fn mask(&self) -> u32 {
        1 << self.pin
    }

    fn set_cnf_mode(&mut self, bits: u32) {
        let shift = u32::from(self.pin % 8) * 4;
        pac::GPIOB
            .cr(usize::from(self.pin / 8))
            .modify(|w| w.0 = (w.0 & !(0xf << shift)) | (bits << shift));
    }
}

impl OutputPin for PortBLine {
    fn set_high(&mut self) {
        let mask = self.mask();
        pac::GPIOB.bsrr().write(|w| w.0 = mask);
    }

    fn set_low(&mut self) {
        let mask = self.mask();
        pac::GPIOB.bsrr().write(|w| w.0 = mask << 16);
    }
}

impl InputPin for PortBLine {
    fn is_high(&self) -> bool {
        pac::GPIOB.idr().read().0 & self.mask() != 0
    }
}

impl BusLine for PortBLine {
    fn set_mode(&mut self, mode: LineMode) {
        match mode {
            LineMode::OpenDrainOutput => self.set_cnf_mode(OUTPUT_OPEN_DRAIN),
            LineMode::PullDownInput => {
                self.set_low();
                self.set_cnf_mode(INPUT_PULL);
            }
            LineMode::PullUpInput => {
                self.set_high();
                self.set_cnf_mode(INPUT_PULL);
            }
            LineMode::Peripheral => self.set_cnf_mode(AF_OPEN_DRAIN),
        }
    }
}
