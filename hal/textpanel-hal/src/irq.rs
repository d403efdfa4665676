//! Interrupt controller abstraction

/// The interrupt lines the engine runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqLine {
    /// I2C event (START sent, address acknowledged)
    I2cEvent,
    /// I2C error, also pended by the watchdog
    I2cError,
    /// DMA transfer complete
    DmaComplete,
}

impl IrqLine {
    /// Every line, in enable order
    pub const ALL: [IrqLine; 3] = [IrqLine::I2cEvent, IrqLine::I2cError, IrqLine::DmaComplete];
}

/// Interrupt controller
pub trait InterruptControl {
    /// Assign a priority (lower value is more urgent)
    fn set_priority(&mut self, line: IrqLine, priority: u8);

    /// Unmask the line
    fn enable(&mut self, line: IrqLine);

    /// Mask the line
    fn disable(&mut self, line: IrqLine);

    /// Clear a pending request
    fn clear_pending(&mut self, line: IrqLine);

    /// Raise a request from software
    fn set_pending(&mut self, line: IrqLine);
}
