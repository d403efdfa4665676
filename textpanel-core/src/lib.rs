//! Board-agnostic display engine for a 2x16 text panel on I2C
//!
//! This crate contains everything that does not touch registers:
//!
//! - Shared text buffer and refresh counter ([`Panel`])
//! - Wire encoders for HD44780-over-PCF8574 and SSD1306 ([`protocol`])
//! - 8x16 font used by the OLED encoder ([`font`])
//! - Bus recovery and device discovery ([`discovery`])
//! - Interrupt/DMA transaction state machine ([`engine`])
//! - Fault bookkeeping and the transfer watchdog ([`fault`])
//!
//! Hardware is reached only through the `textpanel-hal` traits, so the
//! whole engine runs on the host against recording mocks.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod bus;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod fault;
pub mod font;
pub mod protocol;
pub mod sync;
pub mod text;

#[cfg(test)]
pub(crate) mod mock;

pub use config::Config;
pub use discovery::{Device, DeviceKind};
pub use engine::{Engine, Event, Peripherals, Phase};
pub use error::InitError;
pub use fault::{ExpiryLatch, Fault, FaultStats};
pub use text::{Panel, TextBuffer};
