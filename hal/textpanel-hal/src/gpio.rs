//! GPIO pin abstractions
//!
//! The I2C lines spend most of their life owned by the I2C peripheral, but
//! bus recovery and wiring checks need to drive and sample them directly.

/// Digital output pin
pub trait OutputPin {
    /// Set the pin high (released, for open-drain)
    fn set_high(&mut self);

    /// Set the pin low
    fn set_low(&mut self);
}

/// Digital input pin
pub trait InputPin {
    /// Check if the pin reads high (logic 1)
    fn is_high(&self) -> bool;

    /// Check if the pin reads low (logic 0)
    fn is_low(&self) -> bool {
        !self.is_high()
    }
}

/// Electrical configuration of a bus line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineMode {
    /// Open-drain output under software control
    OpenDrainOutput,
    /// Input with the weak internal pull-down enabled
    PullDownInput,
    /// Input with the weak internal pull-up enabled
    PullUpInput,
    /// Open-drain alternate function, driven by the I2C peripheral
    Peripheral,
}

/// An I2C line (SCL or SDA) that can be handed between software and the
/// I2C peripheral
///
/// Reads always sample the physical pin, whatever the mode.
pub trait BusLine: OutputPin + InputPin {
    /// Reconfigure the line
    fn set_mode(&mut self, mode: LineMode);
}
