//! Configuration types for the AXI DMA tester

use crate::internal::constants::{
    COMPLETION_POLL_INTERVAL_US, RX_CHANNEL_NAME, RX_TIMEOUT_MS, TX_CHANNEL_NAME, TX_TIMEOUT_MS,
};

/// Tester configuration, fixed at attach time.
///
/// Defaults match the loopback test bitstream: `axidma0` transmits,
/// `axidma1` receives, the transmit side gets 30 s and the full loop 300 s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TesterConfig {
    /// Name of the memory-to-device channel
    pub tx_channel: &'static str,
    /// Name of the device-to-memory channel
    pub rx_channel: &'static str,
    /// Transmit completion bound in milliseconds
    pub tx_timeout_ms: u32,
    /// Receive completion bound in milliseconds
    pub rx_timeout_ms: u32,
    /// Completion poll interval in microseconds
    pub poll_interval_us: u32,
}

impl Default for TesterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TesterConfig {
    /// Create a configuration with the default channel names and timeouts
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tx_channel: TX_CHANNEL_NAME,
            rx_channel: RX_CHANNEL_NAME,
            tx_timeout_ms: TX_TIMEOUT_MS,
            rx_timeout_ms: RX_TIMEOUT_MS,
            poll_interval_us: COMPLETION_POLL_INTERVAL_US,
        }
    }

    /// Set the channel names
    #[must_use]
    pub const fn with_channels(mut self, tx: &'static str, rx: &'static str) -> Self {
        self.tx_channel = tx;
        self.rx_channel = rx;
        self
    }

    /// Set the transmit completion bound
    #[must_use]
    pub const fn with_tx_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.tx_timeout_ms = timeout_ms;
        self
    }

    /// Set the receive completion bound
    #[must_use]
    pub const fn with_rx_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.rx_timeout_ms = timeout_ms;
        self
    }

    /// Set the completion poll interval
    #[must_use]
    pub const fn with_poll_interval_us(mut self, interval_us: u32) -> Self {
        self.poll_interval_us = interval_us;
        self
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
