//! AXI DMA Loopback Tester
//!
//! A `no_std` (with `alloc`) harness that validates an AXI DMA engine and its
//! driver stack by pushing checksummed buffers through a hardware loopback.
//!
//! Each test run fills 13 source buffers with random payload, appends a
//! 16-bit Internet checksum to each, sends them out on the memory-to-device
//! channel, receives them back on the device-to-memory channel and checks
//! every destination buffer. The result is reported on the log as
//! `pass=<n> fail=<m>`.
//!
//! # Architecture
//!
//! The crate is organized into these layers:
//!
//! 1. **Tester** ([`driver`]): Attach/detach lifecycle, run state machine,
//!    configuration and errors
//! 2. **Buffers** ([`buffer`]): Budgeted buffer pool and the checksum codec
//! 3. **HAL Layer** ([`hal`]): DMA provider/channel traits and the channel pair
//! 4. **Sync** ([`sync`]): Completion events and the trigger queue
//!
//! Runs are serialized: triggers are queued and a single context executes
//! them one after another ([`Tester::service`], or [`worker::Worker`] with the
//! `std` feature).
//!
//! # Features
//!
//! - `std` (default): Thread-backed worker and `StdDelay`
//! - `defmt`: Enable defmt formatting for error and state types
//!
//! # Example
//!
//! ```ignore
//! use axidma_tester::{BufferPool, RunState, Tester, TesterConfig};
//!
//! // `dma` implements `DmaProvider` for your platform
//! let mut pool = BufferPool::unbounded();
//! let mut tester = Tester::attach(&mut dma, &mut pool, TesterConfig::new(), delay, rng)?;
//!
//! if let RunState::Done { pass, fail } = tester.run_once() {
//!     assert_eq!(fail, 0);
//! }
//!
//! tester.detach(&mut dma, &mut pool);
//! ```
//!
//! # Memory Requirements
//!
//! With the fixed geometry (13 buffers per direction, 16384 bytes each):
//! - Total: ~416 KB of DMA-capable memory, held from attach to detach

#![no_std]
#![deny(missing_docs)]
#![forbid(unsafe_code)]
// Clippy lint levels live here; thresholds and config are in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements
)]

extern crate alloc;

// =============================================================================
// Modules
// =============================================================================

pub mod buffer;
pub mod descriptor;
pub mod driver;
pub mod hal;
pub mod sync;

#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
pub mod worker;

// Internal implementation details (pub(crate) only)
mod internal;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use buffer::{Buffer, BufferPool, BufferSet};
pub use descriptor::{
    BusAddr, Cookie, DataDirection, Descriptor, DmaStatus, PrepFlags, ScatterList, SgEntry,
    TransferDirection,
};
pub use driver::config::TesterConfig;
pub use driver::engine::{AbortReason, RunState};
pub use driver::error::{
    ChecksumMismatch, CompletionError, DmaError, DmaResult, Error, Result, SetupError,
    SetupResult,
};
pub use driver::tester::{RunStats, Tester};
pub use hal::{ChannelPair, DmaChannel, DmaProvider};
pub use sync::{Completion, TriggerQueue};

#[cfg(feature = "std")]
pub use worker::{StdDelay, TriggerHandle, Worker, WorkerHandle};

/// Fixed test geometry and default timing.
pub mod constants {
    pub use crate::internal::constants::{
        BD_COUNT, BUFFER_SIZE, CHECKSUM_SIZE, COMPLETION_POLL_INTERVAL_US, DATA_SIZE,
        RX_CHANNEL_NAME, RX_TIMEOUT_MS, TX_CHANNEL_NAME, TX_TIMEOUT_MS,
    };
}
