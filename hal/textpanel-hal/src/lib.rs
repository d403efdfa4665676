//! Textpanel Hardware Abstraction Layer
//!
//! This crate defines the collaborator traits the display engine is written
//! against. Chip-specific crates (e.g. `textpanel-hal-stm32f1`) implement
//! them; host tests implement them with recording mocks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  textpanel-core (engine, encoders)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  textpanel-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ textpanel-hal-│       │  host mocks   │
//! │    stm32f1    │       │  (cfg(test))  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::BusLine`] - SCL/SDA lines, reconfigurable for bit-banging
//! - [`i2c::I2cController`] - register-level I2C master
//! - [`dma::DmaChannel`] - memory-to-peripheral transfer channel
//! - [`irq::InterruptControl`] - interrupt controller
//! - [`time::Clock`], [`time::DeadlineTimer`] - tick clock and watchdog timer

#![no_std]
#![deny(unsafe_code)]

pub mod dma;
pub mod gpio;
pub mod i2c;
pub mod irq;
pub mod time;

// Re-export key traits at crate root for convenience
pub use dma::DmaChannel;
pub use gpio::{BusLine, InputPin, LineMode, OutputPin};
pub use i2c::{BusError, I2cConfig, I2cController, StatusFlags};
pub use irq::{InterruptControl, IrqLine};
pub use time::{Clock, DeadlineTimer};

/// Bundle of collaborator types for one board
///
/// The engine is generic over a single `Platform` rather than over each
/// peripheral separately.
pub trait Platform {
    /// I2C master peripheral
    type I2c: I2cController;
    /// DMA channel feeding the I2C data register
    type Dma: DmaChannel;
    /// SCL/SDA line
    type Line: BusLine;
    /// Interrupt controller
    type Irq: InterruptControl;
    /// Single-shot watchdog timer
    type Timer: DeadlineTimer;
    /// Tick clock with blocking delays
    type Clock: Clock + embedded_hal::delay::DelayNs;
}
