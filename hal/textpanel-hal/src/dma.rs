//! DMA channel abstraction
//!
//! Only the one shape the engine needs: memory-to-peripheral, byte-wide,
//! into the I2C data register, with a completion interrupt.

/// Memory-to-peripheral DMA channel wired to the I2C data register
pub trait DmaChannel {
    /// Start transferring `data` to the peripheral
    ///
    /// The caller keeps `data` in place and unmodified until the completion
    /// interrupt fires or [`stop`](Self::stop) is called.
    fn start(&mut self, data: &[u8]);

    /// Disable the channel and clear its interrupt flags
    fn stop(&mut self);
}
