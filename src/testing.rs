//! Testing utilities and mock implementations
//!
//! This module provides a host-side loopback fabric for exercising the
//! tester without hardware: a [`MockDmaProvider`] hands out [`MockChannel`]s
//! whose transmit side streams mapped source buffers into a FIFO and whose
//! receive side drains that FIFO into mapped destination buffers. Faults can
//! be injected per step through [`FabricHandle::faults`].
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::vec::Vec;

use crate::descriptor::{
    BusAddr, Cookie, DataDirection, Descriptor, DmaStatus, PrepFlags, ScatterList, SgEntry,
    TransferDirection,
};
use crate::driver::error::{DmaError, DmaResult, SetupError, SetupResult};
use crate::hal::{DmaChannel, DmaProvider};
use crate::internal::constants::{BD_COUNT, RX_CHANNEL_NAME, TX_CHANNEL_NAME};
use crate::sync::Completion;

// =============================================================================
// Mock Delay
// =============================================================================

/// Mock delay for testing without actual timing
///
/// Records delays for verification without actually waiting. Clones share
/// the same counter, so a test can keep a handle after moving the delay
/// into a tester.
#[derive(Debug, Clone, Default)]
pub struct MockDelay {
    total_ns: Arc<AtomicU64>,
}

impl MockDelay {
    /// Create a new mock delay
    pub fn new() -> Self {
        Self::default()
    }

    /// Get total nanoseconds that were "delayed"
    pub fn total_ns(&self) -> u64 {
        self.total_ns.load(Ordering::Relaxed)
    }

    /// Get total milliseconds that were "delayed"
    pub fn total_ms(&self) -> u64 {
        self.total_ns() / 1_000_000
    }

    /// Reset the delay counter
    pub fn reset(&self) {
        self.total_ns.store(0, Ordering::Relaxed);
    }
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns.fetch_add(u64::from(ns), Ordering::Relaxed);
    }
}

// =============================================================================
// Fabric State
// =============================================================================

/// Fault injection switches, all off by default
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Fail the `index`-th mapping made on the named channel
    pub fail_map: Option<(&'static str, usize)>,
    /// Reject descriptor preparation for this direction
    pub fail_prep: Option<TransferDirection>,
    /// Reject descriptor submission for this direction
    pub fail_submit: Option<TransferDirection>,
    /// Transmit never moves data and never completes
    pub hang_tx: bool,
    /// Receive moves data but its completion is lost
    pub hang_rx: bool,
    /// Final status reported for a completed transmit
    pub tx_status: Option<DmaStatus>,
    /// Final status reported for a completed receive
    pub rx_status: Option<DmaStatus>,
    /// Flip the trailer bytes of every received segment
    pub corrupt_trailers: bool,
    /// Flip the first payload byte of this received segment
    pub corrupt_segment: Option<usize>,
}

/// Per-channel call counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelCounters {
    pub maps: usize,
    pub unmaps: usize,
    pub syncs: usize,
}

/// Channel-side operation log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FabricEvent {
    Map {
        channel: &'static str,
        addr: BusAddr,
        dir: DataDirection,
    },
    Unmap {
        channel: &'static str,
        addr: BusAddr,
        dir: DataDirection,
    },
    Sync {
        channel: &'static str,
        addr: BusAddr,
    },
    Prep {
        channel: &'static str,
        direction: TransferDirection,
    },
    Submit {
        channel: &'static str,
        direction: TransferDirection,
    },
    IssuePending {
        channel: &'static str,
    },
}

#[derive(Debug)]
struct Mapping {
    channel: &'static str,
    dir: DataDirection,
    bounce: Vec<u8>,
}

#[derive(Debug)]
struct Prepared {
    channel: &'static str,
    direction: TransferDirection,
    segments: Vec<SgEntry>,
}

#[derive(Debug)]
struct Active {
    cookie: i32,
    channel: &'static str,
    direction: TransferDirection,
    segments: Vec<SgEntry>,
    callback: Option<Arc<Completion>>,
}

#[derive(Debug)]
struct Fabric {
    next_addr: u64,
    next_id: u32,
    next_cookie: i32,
    mappings: HashMap<u64, Mapping>,
    prepared: HashMap<u32, Prepared>,
    queued: Vec<Active>,
    issued: Vec<Active>,
    statuses: HashMap<i32, DmaStatus>,
    fifo: VecDeque<Vec<u8>>,
    counters: HashMap<&'static str, ChannelCounters>,
    bad_unmaps: usize,
    events: Vec<FabricEvent>,
    faults: Faults,
}

impl Fabric {
    fn new() -> Self {
        Self {
            next_addr: 0x1000_0000,
            next_id: 1,
            next_cookie: 1,
            mappings: HashMap::new(),
            prepared: HashMap::new(),
            queued: Vec::new(),
            issued: Vec::new(),
            statuses: HashMap::new(),
            fifo: VecDeque::new(),
            counters: HashMap::new(),
            bad_unmaps: 0,
            events: Vec::new(),
            faults: Faults::default(),
        }
    }

    fn counters_mut(&mut self, channel: &'static str) -> &mut ChannelCounters {
        self.counters.entry(channel).or_default()
    }

    fn live_mappings(&self, channel: &str) -> usize {
        self.mappings
            .values()
            .filter(|m| m.channel == channel)
            .count()
    }

    fn segments_live(&self, active: &Active) -> bool {
        active.segments.iter().all(|seg| {
            self.mappings
                .get(&seg.addr.as_u64())
                .is_some_and(|m| m.channel == active.channel)
        })
    }

    fn retire(&mut self, active: Active, status: DmaStatus) {
        self.statuses.insert(active.cookie, status);
        if let Some(callback) = active.callback {
            callback.complete();
        }
    }

    /// Advance every issued transfer as far as it can go.
    fn pump(&mut self) {
        while self.pump_once() {}
    }

    fn pump_once(&mut self) -> bool {
        let mut progressed = false;
        let mut i = 0;

        while i < self.issued.len() {
            // Mappings from an earlier, abandoned run are gone
            if !self.segments_live(&self.issued[i]) {
                let stale = self.issued.remove(i);
                self.retire(stale, DmaStatus::Error);
                progressed = true;
                continue;
            }

            match self.issued[i].direction {
                TransferDirection::MemToDev => {
                    if self.faults.hang_tx {
                        i += 1;
                        continue;
                    }
                    let active = self.issued.remove(i);
                    for seg in &active.segments {
                        let bounce = &self.mappings[&seg.addr.as_u64()].bounce;
                        let len = (seg.len as usize).min(bounce.len());
                        self.fifo.push_back(bounce[..len].to_vec());
                    }
                    let status = self.faults.tx_status.unwrap_or(DmaStatus::Complete);
                    self.retire(active, status);
                }
                TransferDirection::DevToMem => {
                    if self.fifo.len() < self.issued[i].segments.len() {
                        i += 1;
                        continue;
                    }
                    let active = self.issued.remove(i);
                    for (index, seg) in active.segments.iter().enumerate() {
                        let Some(chunk) = self.fifo.pop_front() else {
                            break;
                        };
                        let Some(mapping) = self.mappings.get_mut(&seg.addr.as_u64()) else {
                            continue;
                        };
                        let len = chunk.len().min(mapping.bounce.len());
                        mapping.bounce[..len].copy_from_slice(&chunk[..len]);

                        if self.faults.corrupt_trailers {
                            let n = mapping.bounce.len();
                            mapping.bounce[n - 1] ^= 0xFF;
                            mapping.bounce[n - 2] ^= 0x5A;
                        }
                        if self.faults.corrupt_segment == Some(index) {
                            mapping.bounce[0] ^= 0xFF;
                        }
                    }
                    if self.faults.hang_rx {
                        // Data landed but the interrupt is lost
                        drop(active);
                    } else {
                        let status = self.faults.rx_status.unwrap_or(DmaStatus::Complete);
                        self.retire(active, status);
                    }
                }
            }
            progressed = true;
        }

        progressed
    }
}

// =============================================================================
// Fabric Handle
// =============================================================================

/// Test-side view of the shared loopback fabric
#[derive(Debug, Clone)]
pub struct FabricHandle(Arc<Mutex<Fabric>>);

impl FabricHandle {
    fn lock(&self) -> MutexGuard<'_, Fabric> {
        self.0.lock().unwrap()
    }

    /// Adjust fault injection
    pub fn faults(&self, f: impl FnOnce(&mut Faults)) {
        f(&mut self.lock().faults);
    }

    /// Counters for the named channel
    pub fn counters(&self, channel: &str) -> ChannelCounters {
        self.lock()
            .counters
            .get(channel)
            .copied()
            .unwrap_or_default()
    }

    /// Mappings currently held on the named channel
    pub fn live_mappings(&self, channel: &str) -> usize {
        self.lock().live_mappings(channel)
    }

    /// Unmaps that did not match a live mapping exactly
    pub fn bad_unmaps(&self) -> usize {
        self.lock().bad_unmaps
    }

    /// Copy of the operation log
    pub fn events(&self) -> Vec<FabricEvent> {
        self.lock().events.clone()
    }

    pub fn clear_events(&self) {
        self.lock().events.clear();
    }

    /// Number of intervals during which any mapping was live.
    pub fn run_spans(&self) -> usize {
        self.spans().len()
    }

    /// Whether no span of live mappings ever held more than one run's worth.
    pub fn runs_are_serialized(&self) -> bool {
        self.spans().iter().all(|&maps| maps <= 2 * BD_COUNT)
    }

    /// Map count of every span in the log
    fn spans(&self) -> Vec<usize> {
        let mut spans = Vec::new();
        let mut live = 0usize;
        let mut maps = 0usize;

        for event in &self.lock().events {
            match event {
                FabricEvent::Map { .. } => {
                    live += 1;
                    maps += 1;
                }
                FabricEvent::Unmap { .. } => {
                    live = live.saturating_sub(1);
                    if live == 0 {
                        spans.push(maps);
                        maps = 0;
                    }
                }
                _ => {}
            }
        }
        spans
    }
}

// =============================================================================
// Mock Provider and Channel
// =============================================================================

/// Provider-side log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderEvent {
    Requested(&'static str),
    Released(&'static str),
}

/// Mock DMA subsystem exposing a fixed set of named channels
#[derive(Debug)]
pub struct MockDmaProvider {
    channels: Vec<&'static str>,
    in_use: Vec<&'static str>,
    events: Vec<ProviderEvent>,
    fabric: Arc<Mutex<Fabric>>,
}

impl Default for MockDmaProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDmaProvider {
    /// Provider with the default transmit and receive channels
    pub fn new() -> Self {
        Self::with_channels(&[TX_CHANNEL_NAME, RX_CHANNEL_NAME])
    }

    /// Provider exposing only `channels`
    pub fn with_channels(channels: &[&'static str]) -> Self {
        Self {
            channels: channels.to_vec(),
            in_use: Vec::new(),
            events: Vec::new(),
            fabric: Arc::new(Mutex::new(Fabric::new())),
        }
    }

    /// Handle on the fabric shared by every channel of this provider
    pub fn fabric(&self) -> FabricHandle {
        FabricHandle(Arc::clone(&self.fabric))
    }

    /// Successful requests and releases, in order
    pub fn events(&self) -> Vec<ProviderEvent> {
        self.events.clone()
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Channels requested and not yet released
    pub fn outstanding(&self) -> usize {
        self.in_use.len()
    }
}

impl DmaProvider for MockDmaProvider {
    type Channel = MockChannel;

    fn request_channel(&mut self, name: &str) -> SetupResult<MockChannel> {
        let name = self
            .channels
            .iter()
            .copied()
            .find(|c| *c == name)
            .ok_or(SetupError::ChannelUnavailable)?;

        if self.in_use.contains(&name) {
            return Err(SetupError::ChannelUnavailable);
        }

        self.in_use.push(name);
        self.events.push(ProviderEvent::Requested(name));
        Ok(MockChannel {
            name,
            fabric: Arc::clone(&self.fabric),
        })
    }

    fn release_channel(&mut self, channel: MockChannel) {
        self.in_use.retain(|c| *c != channel.name);
        self.events.push(ProviderEvent::Released(channel.name));
    }
}

/// One end of the loopback fabric
#[derive(Debug)]
pub struct MockChannel {
    name: &'static str,
    fabric: Arc<Mutex<Fabric>>,
}

impl MockChannel {
    pub fn name(&self) -> &'static str {
        self.name
    }

    fn lock(&self) -> MutexGuard<'_, Fabric> {
        self.fabric.lock().unwrap()
    }
}

impl DmaChannel for MockChannel {
    fn map_single(&mut self, buf: &[u8], dir: DataDirection) -> DmaResult<BusAddr> {
        let name = self.name;
        let mut fabric = self.lock();

        if let Some((channel, index)) = fabric.faults.fail_map
            && channel == name
            && fabric.live_mappings(name) == index
        {
            return Err(DmaError::MapFailed);
        }

        let addr = BusAddr(fabric.next_addr);
        fabric.next_addr += 0x10_0000;
        fabric.mappings.insert(
            addr.as_u64(),
            Mapping {
                channel: name,
                dir,
                bounce: buf.to_vec(),
            },
        );
        fabric.counters_mut(name).maps += 1;
        fabric.events.push(FabricEvent::Map {
            channel: name,
            addr,
            dir,
        });
        Ok(addr)
    }

    fn unmap_single(&mut self, addr: BusAddr, len: usize, dir: DataDirection) {
        let name = self.name;
        let mut fabric = self.lock();

        let matches = fabric
            .mappings
            .remove(&addr.as_u64())
            .is_some_and(|m| m.channel == name && m.dir == dir && m.bounce.len() == len);
        if !matches {
            fabric.bad_unmaps += 1;
        }
        fabric.counters_mut(name).unmaps += 1;
        fabric.events.push(FabricEvent::Unmap {
            channel: name,
            addr,
            dir,
        });
    }

    fn sync_for_cpu(&mut self, addr: BusAddr, buf: &mut [u8], dir: DataDirection) {
        let name = self.name;
        let mut fabric = self.lock();

        if let Some(mapping) = fabric.mappings.get(&addr.as_u64())
            && mapping.channel == name
            && dir.device_writes()
            && mapping.bounce.len() == buf.len()
        {
            buf.copy_from_slice(&mapping.bounce);
        }
        fabric.counters_mut(name).syncs += 1;
        fabric.events.push(FabricEvent::Sync {
            channel: name,
            addr,
        });
    }

    fn prep_slave_sg(
        &mut self,
        sg: &ScatterList,
        direction: TransferDirection,
        flags: PrepFlags,
    ) -> DmaResult<Descriptor> {
        let name = self.name;
        let mut fabric = self.lock();

        fabric.events.push(FabricEvent::Prep {
            channel: name,
            direction,
        });
        if fabric.faults.fail_prep == Some(direction) {
            return Err(DmaError::PrepareFailed);
        }

        let id = fabric.next_id;
        fabric.next_id += 1;
        fabric.prepared.insert(
            id,
            Prepared {
                channel: name,
                direction,
                segments: sg.entries().to_vec(),
            },
        );
        Ok(Descriptor::new(id, direction, flags))
    }

    fn submit(&mut self, mut desc: Descriptor) -> Cookie {
        let name = self.name;
        let mut fabric = self.lock();

        fabric.events.push(FabricEvent::Submit {
            channel: name,
            direction: desc.direction(),
        });

        let Some(prepared) = fabric.prepared.remove(&desc.id()) else {
            return Cookie::INVALID;
        };
        if fabric.faults.fail_submit == Some(prepared.direction) || prepared.channel != name {
            return Cookie::INVALID;
        }

        let cookie = fabric.next_cookie;
        fabric.next_cookie += 1;
        fabric.statuses.insert(cookie, DmaStatus::InProgress);
        fabric.queued.push(Active {
            cookie,
            channel: name,
            direction: prepared.direction,
            segments: prepared.segments,
            callback: desc.take_callback(),
        });
        Cookie(cookie)
    }

    fn issue_pending(&mut self) {
        let name = self.name;
        let mut fabric = self.lock();

        fabric.events.push(FabricEvent::IssuePending { channel: name });

        let queued = core::mem::take(&mut fabric.queued);
        let (mine, others): (Vec<_>, Vec<_>) = queued.into_iter().partition(|a| a.channel == name);
        fabric.queued = others;
        fabric.issued.extend(mine);
        fabric.pump();
    }

    fn tx_status(&mut self, cookie: Cookie) -> DmaStatus {
        self.lock()
            .statuses
            .get(&cookie.0)
            .copied()
            .unwrap_or(DmaStatus::Error)
    }
}
