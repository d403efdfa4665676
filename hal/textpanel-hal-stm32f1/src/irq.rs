//! NVIC access for the engine's interrupt lines

use embassy_stm32::interrupt::{Interrupt, InterruptExt, Priority};
use textpanel_hal::{InterruptControl, IrqLine};

/// Priority bits implemented by the F1 NVIC
const PRIO_BITS: u8 = 4;

/// The NVIC, as seen by the engine
pub struct Nvic {
    _private: (),
}

impl Nvic {
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Vector behind an engine line
    ///
    /// DMA completion shares the I2C2 event vector on this board.
    pub fn vector(line: IrqLine) -> Interrupt {
        match line {
            IrqLine::I2cEvent | IrqLine::DmaComplete => Interrupt::I2C2_EV,
            IrqLine::I2cError => Interrupt::I2C2_ER,
        }
    }
}

impl InterruptControl for Nvic {
    fn set_priority(&mut self, line: IrqLine, priority: u8) {
        Self::vector(line).set_priority(Priority::from(priority << (8 - PRIO_BITS)));
    }

    fn enable(&mut self, line: IrqLine) {
        // SAFETY: the handlers only reach the engine through its critical
        // section mutex
        unsafe { Self::vector(line).enable() }
    }

    fn disable(&mut self, line: IrqLine) {
        Self::vector(line).disable();
    }

    fn clear_pending(&mut self, line: IrqLine) {
        Self::vector(line).unpend();
    }

    fn set_pending(&mut self, line: IrqLine) {
        Self::vector(line).pend();
    }
}
