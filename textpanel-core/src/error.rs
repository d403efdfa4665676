//! Initialization errors

use textpanel_hal::BusError;

/// Why [`Engine::initialize`](crate::Engine::initialize) failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitError {
    /// A line could be pulled low by the weak internal pull-down: no
    /// external pull-ups, or the line is shorted or still held
    BusWiring,
    /// No address acknowledged
    DeviceNotFound {
        /// A polled wait timed out and probing was abandoned
        locked_up: bool,
    },
    /// Bring-up of an already discovered device failed
    Bus(BusError),
}

impl From<BusError> for InitError {
    fn from(err: BusError) -> Self {
        InitError::Bus(err)
    }
}
