//! Tester context.
//!
//! [`Tester`] owns everything a run needs: the channel pair, the source and
//! destination buffer sets, the delay used for bounded waits and the payload
//! RNG. It is built by [`Tester::attach`] and torn down by
//! [`Tester::detach`]; in between, every run reuses the same resources.

use alloc::vec::Vec;

use embedded_hal::delay::DelayNs;
use rand_core::RngCore;

use super::config::TesterConfig;
use super::engine::{RunState, Transaction};
use super::error::{ChecksumMismatch, SetupError, SetupResult};
use crate::buffer::{BufferPool, BufferSet};
use crate::hal::{ChannelPair, DmaChannel, DmaProvider};
use crate::internal::constants::{BD_COUNT, BUFFER_SIZE};
use crate::sync::TriggerQueue;

/// Cumulative run counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RunStats {
    /// Runs started
    pub runs: u32,
    /// Runs that reached verification
    pub completed: u32,
    /// Runs abandoned before verification
    pub aborted: u32,
    /// Destination buffers that verified
    pub buffers_passed: u64,
    /// Destination buffers that failed verification
    pub buffers_failed: u64,
}

/// AXI DMA loopback tester
///
/// # Type Parameters
/// * `C` - DMA channel handle from the platform's [`DmaProvider`]
/// * `D` - Delay used to bound the completion waits
/// * `R` - Source of random payload bytes
///
/// # Example
/// ```ignore
/// let mut tester = Tester::attach(&mut dma, &mut pool, TesterConfig::new(), delay, rng)?;
///
/// match tester.run_once() {
///     RunState::Done { pass, fail } => { /* also logged as pass=.. fail=.. */ }
///     RunState::Aborted(reason) => { /* failed step already logged */ }
///     _ => unreachable!(),
/// }
///
/// tester.detach(&mut dma, &mut pool);
/// ```
pub struct Tester<C: DmaChannel, D: DelayNs, R: RngCore> {
    config: TesterConfig,
    channels: ChannelPair<C>,
    sources: BufferSet,
    destinations: BufferSet,
    delay: D,
    rng: R,
    last_outcome: Option<RunState>,
    mismatches: Vec<ChecksumMismatch>,
    stats: RunStats,
}

impl<C: DmaChannel, D: DelayNs, R: RngCore> Tester<C, D, R> {
    /// Acquire channels and buffers.
    ///
    /// Order: transmit channel, receive channel, source buffers, destination
    /// buffers. Any failure releases what was already acquired, in reverse,
    /// before the error is returned.
    pub fn attach<P>(
        provider: &mut P,
        pool: &mut BufferPool,
        config: TesterConfig,
        delay: D,
        rng: R,
    ) -> SetupResult<Self>
    where
        P: DmaProvider<Channel = C>,
    {
        let channels = ChannelPair::request(provider, &config)?;

        let sources = match pool.allocate(BD_COUNT, BUFFER_SIZE) {
            Ok(set) => set,
            Err(e) => {
                log::error!("Alloc source buffers failed!");
                channels.release(provider);
                return Err(e);
            }
        };

        let destinations = match pool.allocate(BD_COUNT, BUFFER_SIZE) {
            Ok(set) => set,
            Err(e) => {
                log::error!("Alloc destination buffers failed!");
                pool.release(sources);
                channels.release(provider);
                return Err(e);
            }
        };

        let mut mismatches = Vec::new();
        if mismatches.try_reserve_exact(BD_COUNT).is_err() {
            log::error!("Alloc mismatch log failed!");
            pool.release(destinations);
            pool.release(sources);
            channels.release(provider);
            return Err(SetupError::AllocationFailed);
        }

        log::debug!(
            "tester attached: {} x {} byte buffers per direction",
            BD_COUNT,
            BUFFER_SIZE
        );

        Ok(Self {
            config,
            channels,
            sources,
            destinations,
            delay,
            rng,
            last_outcome: None,
            mismatches,
            stats: RunStats::default(),
        })
    }

    /// Free both buffer sets, then release the receive and transmit channels.
    pub fn detach<P>(self, provider: &mut P, pool: &mut BufferPool)
    where
        P: DmaProvider<Channel = C>,
    {
        pool.release(self.destinations);
        pool.release(self.sources);
        self.channels.release(provider);
        log::debug!("tester detached after {} runs", self.stats.runs);
    }

    /// Execute one test iteration and return its terminal state.
    ///
    /// The outcome is also logged and kept as [`last_outcome`]. Every run
    /// starts again from [`RunState::Idle`].
    ///
    /// [`last_outcome`]: Self::last_outcome
    pub fn run_once(&mut self) -> RunState {
        self.stats.runs = self.stats.runs.wrapping_add(1);

        let transaction = Transaction {
            channels: &mut self.channels,
            sources: &mut self.sources,
            destinations: &mut self.destinations,
            delay: &mut self.delay,
            config: &self.config,
            mismatches: &mut self.mismatches,
            state: RunState::Idle,
        };
        let outcome = transaction.run(&mut self.rng);

        match outcome {
            RunState::Done { pass, fail } => {
                self.stats.completed = self.stats.completed.wrapping_add(1);
                self.stats.buffers_passed += pass as u64;
                self.stats.buffers_failed += fail as u64;
            }
            RunState::Aborted(reason) => {
                log::error!("run {} aborted: {reason}", self.stats.runs);
                self.stats.aborted = self.stats.aborted.wrapping_add(1);
            }
            _ => {}
        }

        self.last_outcome = Some(outcome);
        outcome
    }

    /// Run every iteration queued on `queue`, one after another.
    ///
    /// Returns the number of runs executed.
    pub fn service(&mut self, queue: &TriggerQueue) -> usize {
        let mut executed = 0;
        while queue.take() {
            self.run_once();
            executed += 1;
        }
        executed
    }

    /// Terminal state of the most recent run
    #[inline(always)]
    pub fn last_outcome(&self) -> Option<RunState> {
        self.last_outcome
    }

    /// Checksum mismatches found by the most recent run
    #[inline(always)]
    pub fn mismatches(&self) -> &[ChecksumMismatch] {
        &self.mismatches
    }

    /// Cumulative counters
    #[inline(always)]
    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Configuration fixed at attach
    #[inline(always)]
    pub fn config(&self) -> &TesterConfig {
        &self.config
    }

    /// Source buffers as stamped by the most recent run
    #[inline(always)]
    pub fn sources(&self) -> &BufferSet {
        &self.sources
    }

    /// Destination buffers as received by the most recent run
    #[inline(always)]
    pub fn destinations(&self) -> &BufferSet {
        &self.destinations
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
