//! Engine configuration
//!
//! The defaults reproduce the stock board: a 200 ms transfer watchdog,
//! 10 ms bound on every polled bus wait, and the PCF8574/PCF8574A address
//! windows for discovery.

/// An inclusive range of 7-bit addresses to probe
pub type AddressRange = (u8, u8);

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Deadline for one DMA transfer or transaction opening (ms)
    pub transfer_timeout_ms: u32,
    /// Bound on each polled status wait (µs); exceeding it marks the bus dead
    pub wait_timeout_us: u32,
    /// Settle time after each bit-banged line change (µs)
    pub settle_us: u32,
    /// Address windows probed in order during discovery
    pub probe_ranges: [AddressRange; 2],
    /// Address that identifies an SSD1306; anything else is an HD44780 backpack
    pub oled_address: u8,
    /// NVIC priority for the I2C and DMA interrupts
    pub irq_priority: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transfer_timeout_ms: 200,
            wait_timeout_us: 10_000,
            settle_us: 10,
            // PCF8574 then PCF8574A; 0x3c (SSD1306) sits in the second window
            probe_ranges: [(0x20, 0x27), (0x38, 0x3f)],
            oled_address: 0x3c,
            irq_priority: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oled_address_is_probed() {
        let config = Config::default();
        assert!(config
            .probe_ranges
            .iter()
            .any(|&(lo, hi)| (lo..=hi).contains(&config.oled_address)));
    }
}
