//! Transaction engine: one loopback test run.
//!
//! A run stamps the source buffers, maps both buffer sets, prepares a
//! device-to-memory and a memory-to-device scatter-gather descriptor, submits
//! receive before transmit, kicks both channels, waits for transmit and then
//! receive with their own bounds, and finally checks every destination
//! buffer's checksum.
//!
//! ```text
//! Idle -> Preparing -> Mapped -> DescriptorsReady -> Submitted
//!      -> AwaitingTx -> AwaitingRx -> Verifying -> Done(pass, fail)
//!
//! any non-terminal state -> Aborted(reason)
//! ```
//!
//! Whatever state the run ends in, every destination mapping made during the
//! run is released (last mapped first), then every source mapping (in mapping
//! order). Mappings are tracked by count, never by scanning for an unset
//! address.

use alloc::sync::Arc;
use alloc::vec::Vec;

use embedded_hal::delay::DelayNs;
use rand_core::RngCore;

use super::config::TesterConfig;
use super::error::{ChecksumMismatch, CompletionError, DmaError, Error};
use crate::buffer::{BufferSet, checksum};
use crate::descriptor::{
    BusAddr, Cookie, DataDirection, DmaStatus, PrepFlags, ScatterList, TransferDirection,
};
use crate::hal::{ChannelPair, DmaChannel};
use crate::internal::constants::BD_COUNT;
use crate::sync::Completion;

// =============================================================================
// Run State
// =============================================================================

/// Why a run was abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AbortReason {
    /// Mapping source buffer `index` failed
    MapSourceFailed {
        /// Index of the buffer that could not be mapped
        index: usize,
    },
    /// Mapping destination buffer `index` failed
    MapDestFailed {
        /// Index of the buffer that could not be mapped
        index: usize,
    },
    /// Descriptor preparation rejected for this direction
    PrepareFailed(TransferDirection),
    /// Descriptor submission rejected for this direction
    SubmitFailed(TransferDirection),
    /// Transmit completion missing or unsuccessful
    TxTimeoutOrError(CompletionError),
    /// Receive completion missing or unsuccessful
    RxTimeoutOrError(CompletionError),
}

impl AbortReason {
    /// Returns the failed step as a short description
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            AbortReason::MapSourceFailed { .. } => "map source buffer",
            AbortReason::MapDestFailed { .. } => "map destination buffer",
            AbortReason::PrepareFailed(_) => "prepare descriptor",
            AbortReason::SubmitFailed(_) => "submit descriptor",
            AbortReason::TxTimeoutOrError(_) => "wait for tx completion",
            AbortReason::RxTimeoutOrError(_) => "wait for rx completion",
        }
    }
}

impl core::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AbortReason::MapSourceFailed { index } | AbortReason::MapDestFailed { index } => {
                write!(f, "{} ({index})", self.as_str())
            }
            AbortReason::PrepareFailed(dir) | AbortReason::SubmitFailed(dir) => {
                write!(f, "{} ({dir})", self.as_str())
            }
            AbortReason::TxTimeoutOrError(e) | AbortReason::RxTimeoutOrError(e) => {
                write!(f, "{}: {e}", self.as_str())
            }
        }
    }
}

impl From<AbortReason> for Error {
    fn from(reason: AbortReason) -> Self {
        match reason {
            AbortReason::MapSourceFailed { .. } | AbortReason::MapDestFailed { .. } => {
                Error::Dma(DmaError::MapFailed)
            }
            AbortReason::PrepareFailed(_) => Error::Dma(DmaError::PrepareFailed),
            AbortReason::SubmitFailed(_) => Error::Dma(DmaError::SubmitFailed),
            AbortReason::TxTimeoutOrError(e) | AbortReason::RxTimeoutOrError(e) => {
                Error::Completion(e)
            }
        }
    }
}

/// Transaction engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunState {
    /// Ready for the next run
    #[default]
    Idle,
    /// Stamping source buffers and mapping
    Preparing,
    /// Both buffer sets mapped
    Mapped,
    /// Scatter lists built and both descriptors prepared
    DescriptorsReady,
    /// Both descriptors submitted and issued
    Submitted,
    /// Waiting for the transmit completion
    AwaitingTx,
    /// Waiting for the receive completion
    AwaitingRx,
    /// Checking destination checksums
    Verifying,
    /// Run finished; every destination buffer was checked
    Done {
        /// Buffers whose checksum matched
        pass: usize,
        /// Buffers whose checksum did not match
        fail: usize,
    },
    /// Run abandoned
    Aborted(AbortReason),
}

impl RunState {
    /// Whether the run has ended
    #[inline(always)]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done { .. } | RunState::Aborted(_))
    }
}

// =============================================================================
// Mapping Bookkeeping
// =============================================================================

/// Bus addresses established for one buffer set during one run
struct Mappings {
    addrs: [BusAddr; BD_COUNT],
    mapped: usize,
    dir: DataDirection,
    len: usize,
}

impl Mappings {
    const fn new(dir: DataDirection, len: usize) -> Self {
        Self {
            addrs: [BusAddr::UNSET; BD_COUNT],
            mapped: 0,
            dir,
            len,
        }
    }

    /// Map every buffer in order; on failure returns the failing index.
    fn map_all<C: DmaChannel>(
        &mut self,
        channel: &mut C,
        set: &BufferSet,
    ) -> core::result::Result<(), usize> {
        for (index, buffer) in set.iter().enumerate().take(BD_COUNT) {
            let addr = channel
                .map_single(buffer.as_bytes(), self.dir)
                .map_err(|_| index)?;
            self.addrs[index] = addr;
            self.mapped += 1;
        }
        Ok(())
    }

    fn unmap_in_order<C: DmaChannel>(&mut self, channel: &mut C) {
        for addr in &mut self.addrs[..self.mapped] {
            channel.unmap_single(*addr, self.len, self.dir);
            *addr = BusAddr::UNSET;
        }
        self.mapped = 0;
    }

    fn unmap_reverse<C: DmaChannel>(&mut self, channel: &mut C) {
        for addr in self.addrs[..self.mapped].iter_mut().rev() {
            channel.unmap_single(*addr, self.len, self.dir);
            *addr = BusAddr::UNSET;
        }
        self.mapped = 0;
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// Borrowed view of the tester context for the duration of one run
pub(crate) struct Transaction<'a, C: DmaChannel, D: DelayNs> {
    pub(crate) channels: &'a mut ChannelPair<C>,
    pub(crate) sources: &'a mut BufferSet,
    pub(crate) destinations: &'a mut BufferSet,
    pub(crate) delay: &'a mut D,
    pub(crate) config: &'a TesterConfig,
    pub(crate) mismatches: &'a mut Vec<ChecksumMismatch>,
    pub(crate) state: RunState,
}

impl<C: DmaChannel, D: DelayNs> Transaction<'_, C, D> {
    /// Execute the run to a terminal state and release all mappings.
    pub(crate) fn run<R: RngCore + ?Sized>(mut self, rng: &mut R) -> RunState {
        self.mismatches.clear();
        self.enter(RunState::Preparing);

        for buffer in self.sources.iter_mut() {
            checksum::stamp(buffer, rng);
        }

        let mut sources = Mappings::new(DataDirection::ToDevice, self.sources.buffer_size());
        let mut destinations =
            Mappings::new(DataDirection::Bidirectional, self.destinations.buffer_size());

        let result = self.transfer(&mut sources, &mut destinations);

        destinations.unmap_reverse(&mut self.channels.rx);
        sources.unmap_in_order(&mut self.channels.tx);

        let end = match result {
            Ok((pass, fail)) => RunState::Done { pass, fail },
            Err(reason) => RunState::Aborted(reason),
        };
        self.enter(end);
        end
    }

    fn enter(&mut self, next: RunState) {
        log::trace!("run state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn transfer(
        &mut self,
        sources: &mut Mappings,
        destinations: &mut Mappings,
    ) -> core::result::Result<(usize, usize), AbortReason> {
        sources
            .map_all(&mut self.channels.tx, &*self.sources)
            .map_err(|index| {
                log::error!("Map source buffer ({index}) failed!");
                AbortReason::MapSourceFailed { index }
            })?;

        destinations
            .map_all(&mut self.channels.rx, &*self.destinations)
            .map_err(|index| {
                log::error!("Map destination buffer ({index}) failed!");
                AbortReason::MapDestFailed { index }
            })?;
        self.enter(RunState::Mapped);

        let tx_sg = ScatterList::from_addrs(&sources.addrs);
        let rx_sg = ScatterList::from_addrs(&destinations.addrs);
        let flags = PrepFlags::CTRL_ACK | PrepFlags::PREP_INTERRUPT;

        let mut rxd = self
            .channels
            .rx
            .prep_slave_sg(&rx_sg, TransferDirection::DevToMem, flags)
            .map_err(|_| {
                log::error!("Prepare slave sg (Dev -> Mem) failed!");
                AbortReason::PrepareFailed(TransferDirection::DevToMem)
            })?;

        let mut txd = self
            .channels
            .tx
            .prep_slave_sg(&tx_sg, TransferDirection::MemToDev, flags)
            .map_err(|_| {
                log::error!("Prepare slave sg (Mem -> Dev) failed!");
                AbortReason::PrepareFailed(TransferDirection::MemToDev)
            })?;
        self.enter(RunState::DescriptorsReady);

        let rx_done = Arc::new(Completion::new());
        let tx_done = Arc::new(Completion::new());
        rxd.set_callback(Arc::clone(&rx_done));
        txd.set_callback(Arc::clone(&tx_done));

        let rx_cookie = self.channels.rx.submit(rxd);
        if rx_cookie.is_error() {
            log::error!("Submit rxd failed!");
            return Err(AbortReason::SubmitFailed(TransferDirection::DevToMem));
        }

        let tx_cookie = self.channels.tx.submit(txd);
        if tx_cookie.is_error() {
            log::error!("Submit txd failed!");
            return Err(AbortReason::SubmitFailed(TransferDirection::MemToDev));
        }

        self.channels.rx.issue_pending();
        self.channels.tx.issue_pending();
        self.enter(RunState::Submitted);

        self.enter(RunState::AwaitingTx);
        self.await_direction(TransferDirection::MemToDev, &tx_done, tx_cookie)
            .map_err(AbortReason::TxTimeoutOrError)?;

        self.enter(RunState::AwaitingRx);
        self.await_direction(TransferDirection::DevToMem, &rx_done, rx_cookie)
            .map_err(AbortReason::RxTimeoutOrError)?;

        self.enter(RunState::Verifying);
        Ok(self.verify(destinations))
    }

    fn await_direction(
        &mut self,
        direction: TransferDirection,
        done: &Completion,
        cookie: Cookie,
    ) -> core::result::Result<(), CompletionError> {
        let (name, timeout_ms, channel) = match direction {
            TransferDirection::MemToDev => ("tx", self.config.tx_timeout_ms, &mut self.channels.tx),
            TransferDirection::DevToMem => ("rx", self.config.rx_timeout_ms, &mut self.channels.rx),
        };

        if !done.wait_timeout(&mut *self.delay, timeout_ms, self.config.poll_interval_us) {
            log::error!("Wait for {name} completion timed out after {timeout_ms} ms!");
            return Err(CompletionError::Timeout);
        }

        let status = channel.tx_status(cookie);
        if status != DmaStatus::Complete {
            log::error!("{name} got completion callback but status is '{status}'!");
            return Err(CompletionError::Status(status));
        }
        Ok(())
    }

    /// Check every destination buffer; never stops at the first mismatch.
    fn verify(&mut self, destinations: &Mappings) -> (usize, usize) {
        let mut pass = 0;
        let mut fail = 0;

        for (index, buffer) in self.destinations.iter_mut().enumerate() {
            self.channels.rx.sync_for_cpu(
                destinations.addrs[index],
                buffer.as_bytes_mut(),
                destinations.dir,
            );

            let result = checksum::check(buffer);
            if result.is_match() {
                pass += 1;
            } else {
                let mismatch = ChecksumMismatch {
                    index,
                    computed: result.computed,
                    stored: result.stored,
                };
                log::error!("{mismatch}");
                self.mismatches.push(mismatch);
                fail += 1;
            }
        }

        log::info!("pass={pass} fail={fail}");
        (pass, fail)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
