//! STM32F1-specific HAL for the textpanel firmware
//!
//! Implements the `textpanel-hal` traits for an STM32F103 driving the panel
//! from I2C2 (SCL on PB10, SDA on PB11) with DMA1 channel 4 feeding the data
//! register.
//!
//! # Features
//!
//! - `stm32f103c8` / `stm32f103cb` - chip selection
//! - `defmt` - Enable debug formatting support
//!
//! # Usage
//!
//! `embassy_stm32::init` sets up clocks, the time driver and GPIO clocks;
//! everything the engine touches after that is driven through the PAC from
//! the types here. embassy-stm32 owns the DMA channel interrupt vectors, so
//! the end of a data phase is reported on the I2C2 event line instead (see
//! [`dma::transfer_done`]).

#![no_std]

pub mod dma;
pub mod gpio;
pub mod i2c;
pub mod irq;
pub mod time;

pub use dma::I2cTxDma;
pub use gpio::PortBLine;
pub use i2c::I2c2;
pub use irq::Nvic;
pub use time::{CycleClock, DeadlineSignal, SignalDeadline};

/// The Blue Pill style board: STM32F103 with the panel on I2C2
pub struct Stm32;

impl textpanel_hal::Platform for Stm32 {
    type I2c = I2c2;
    type Dma = I2cTxDma;
    type Line = PortBLine;
    type Irq = Nvic;
    type Timer = SignalDeadline;
    type Clock = CycleClock;
}
