use tracing::trace;

use crate::error::{HwError, Result};

/// MCP3008 10-bit SPI ADC in single-ended mode.
pub struct Mcp3008 {
    spi: rppal::spi::Spi,
}

impl Mcp3008 {
    pub fn new(spi: rppal::spi::Spi) -> Self {
        Self { spi }
    }

    /// One single-ended conversion on `channel` (0..=7).
    pub fn convert(&mut self, channel: u8) -> Result<u16> {
        if channel > 7 {
            return Err(HwError::BadChannel(channel));
        }
        // Start bit, single-ended mode + channel, then clock out the result.
        let tx = [0x01, 0x80 | (channel << 4), 0x00];
        let mut rx = [0u8; 3];
        self.spi
            .transfer(&mut rx, &tx)
            .map_err(|e| HwError::Spi(e.to_string()))?;
        let raw = (u16::from(rx[1] & 0x03) << 8) | u16::from(rx[2]);
        trace!(channel, raw, "mcp3008 conversion");
        Ok(raw)
    }
}
