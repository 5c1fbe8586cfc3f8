//! Error types for the AXI DMA tester
//!
//! Errors are organized by domain for better diagnostics:
//! - [`SetupError`]: attach-time failures (memory, channels) and detach state
//! - [`DmaError`]: mapping, descriptor preparation and submission failures
//! - [`CompletionError`]: a transfer did not finish, or finished badly
//!
//! The unified [`Error`] enum wraps all domain errors. Per-run failures never
//! leave the transaction engine as errors; they end the run as
//! [`RunState::Aborted`](crate::RunState::Aborted) and are logged.

use crate::descriptor::DmaStatus;

// =============================================================================
// Setup Errors
// =============================================================================

/// Attach-time and lifecycle errors
///
/// These are fatal to attach. Everything acquired before the failure is
/// released before the error is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SetupError {
    /// Buffer memory could not be obtained
    AllocationFailed,
    /// Named DMA channel missing or already in use
    ChannelUnavailable,
    /// Detach has begun; no further runs are accepted
    Detached,
}

impl core::fmt::Display for SetupError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SetupError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            SetupError::AllocationFailed => "buffer allocation failed",
            SetupError::ChannelUnavailable => "DMA channel unavailable",
            SetupError::Detached => "tester detached",
        }
    }
}

// =============================================================================
// DMA Errors
// =============================================================================

/// Mapping and descriptor errors reported by a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaError {
    /// Buffer could not be bound to a bus address
    MapFailed,
    /// Engine rejected the scatter list
    PrepareFailed,
    /// Engine rejected a prepared descriptor
    SubmitFailed,
}

impl core::fmt::Display for DmaError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DmaError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DmaError::MapFailed => "buffer mapping failed",
            DmaError::PrepareFailed => "descriptor preparation failed",
            DmaError::SubmitFailed => "descriptor submission failed",
        }
    }
}

// =============================================================================
// Completion Errors
// =============================================================================

/// Transfer completion errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CompletionError {
    /// No completion within the direction's bound
    Timeout,
    /// Completion arrived but the final status is not `Complete`
    Status(DmaStatus),
}

impl core::fmt::Display for CompletionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CompletionError::Timeout => f.write_str("completion timed out"),
            CompletionError::Status(status) => write!(f, "status is '{status}'"),
        }
    }
}

// =============================================================================
// Checksum Mismatch
// =============================================================================

/// A destination buffer whose payload does not match its trailer.
///
/// Mismatches are counted in the run result; they never abort a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChecksumMismatch {
    /// Buffer index within the destination set
    pub index: usize,
    /// Checksum recomputed over the received payload
    pub computed: u16,
    /// Checksum carried in the received trailer
    pub stored: u16,
}

impl core::fmt::Display for ChecksumMismatch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "No.{} buffer checking failed! calculated checksum: {:x} buffer checksum: {:x}",
            self.index, self.computed, self.stored
        )
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// ```ignore
/// match result {
///     Err(Error::Setup(SetupError::ChannelUnavailable)) => { /* ... */ }
///     Err(Error::Dma(DmaError::MapFailed)) => { /* ... */ }
///     Err(Error::Completion(CompletionError::Timeout)) => { /* ... */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Attach/detach error
    Setup(SetupError),
    /// DMA error
    Dma(DmaError),
    /// Completion error
    Completion(CompletionError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Setup(e) => write!(f, "setup: {}", e.as_str()),
            Error::Dma(e) => write!(f, "dma: {}", e.as_str()),
            Error::Completion(e) => write!(f, "completion: {e}"),
        }
    }
}

impl From<SetupError> for Error {
    fn from(e: SetupError) -> Self {
        Error::Setup(e)
    }
}

impl From<DmaError> for Error {
    fn from(e: DmaError) -> Self {
        Error::Dma(e)
    }
}

impl From<CompletionError> for Error {
    fn from(e: CompletionError) -> Self {
        Error::Completion(e)
    }
}

/// Result type alias for tester operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for attach/detach operations
pub type SetupResult<T> = core::result::Result<T, SetupError>;

/// Result type alias for channel operations
pub type DmaResult<T> = core::result::Result<T, DmaError>;

// =============================================================================
// Unit Tests
// =============================================================================
