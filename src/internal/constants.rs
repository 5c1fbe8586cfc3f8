//! Centralized Constants
//!
//! Single source of truth for the fixed test geometry and timing of the
//! loopback harness.
//!
//! # Organization
//!
//! - **Buffer geometry**: descriptor count and per-buffer layout
//! - **Timing**: completion wait bounds and poll granularity
//! - **Channel names**: DMA channel names resolved at attach time

// =============================================================================
// Buffer Geometry
// =============================================================================

/// Number of buffers (and scatter-gather entries) per direction
pub const BD_COUNT: usize = 13;

/// Size of each source/destination buffer in bytes
pub const BUFFER_SIZE: usize = 16384;

/// Size of the checksum trailer at the end of each buffer
pub const CHECKSUM_SIZE: usize = 2;

/// Size of the random payload region preceding the trailer
pub const DATA_SIZE: usize = BUFFER_SIZE - CHECKSUM_SIZE;

// =============================================================================
// Timing Constants
// =============================================================================

/// Transmit completion bound in milliseconds
pub const TX_TIMEOUT_MS: u32 = 30_000;

/// Receive completion bound in milliseconds (full loop through the device)
pub const RX_TIMEOUT_MS: u32 = 300_000;

/// Completion poll interval in microseconds
pub const COMPLETION_POLL_INTERVAL_US: u32 = 1_000;

// =============================================================================
// Channel Names
// =============================================================================

/// Name of the memory-to-device channel
pub const TX_CHANNEL_NAME: &str = "axidma0";

/// Name of the device-to-memory channel
pub const RX_CHANNEL_NAME: &str = "axidma1";
