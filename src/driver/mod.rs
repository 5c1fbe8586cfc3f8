//! Core tester components.
//!
//! This module contains the building blocks of a loopback test:
//!
//! - [`config`] - Attach-time configuration
//! - [`error`] - Error types and result aliases
//! - [`engine`] - Run state machine and abort reasons
//! - [`tester`] - The tester context owning channels and buffers
//!
//! # Example
//!
//! ```ignore
//! use axidma_tester::driver::{RunState, Tester, TesterConfig};
//!
//! let config = TesterConfig::new().with_rx_timeout_ms(60_000);
//! let mut tester = Tester::attach(&mut dma, &mut pool, config, delay, rng)?;
//! let outcome = tester.run_once();
//! ```

// Submodules
pub mod config;
pub mod engine;
pub mod error;
pub mod tester;

// Re-exports for convenience
pub use config::TesterConfig;
pub use engine::{AbortReason, RunState};
pub use error::{
    ChecksumMismatch, CompletionError, DmaError, DmaResult, Error, Result, SetupError,
    SetupResult,
};
pub use tester::{RunStats, Tester};
