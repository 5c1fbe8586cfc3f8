//! DMA engine client traits
//!
//! These traits are the seam between the tester and whatever DMA stack
//! drives the hardware: a kernel dmaengine binding, a user-space AXI DMA
//! driver, or a host-side simulation.

use crate::descriptor::{BusAddr, Cookie, DataDirection, Descriptor, DmaStatus, PrepFlags};
use crate::descriptor::{ScatterList, TransferDirection};
use crate::driver::error::{DmaResult, SetupResult};

// =============================================================================
// DMA Provider
// =============================================================================

/// DMA subsystem that hands out channels by name
pub trait DmaProvider {
    /// Channel handle type
    type Channel: DmaChannel;

    /// Acquire the named channel.
    ///
    /// Fails with [`SetupError::ChannelUnavailable`] when no matching free
    /// channel exists.
    ///
    /// [`SetupError::ChannelUnavailable`]: crate::SetupError::ChannelUnavailable
    fn request_channel(&mut self, name: &str) -> SetupResult<Self::Channel>;

    /// Return a channel to the subsystem. Called exactly once per channel.
    fn release_channel(&mut self, channel: Self::Channel);
}

// =============================================================================
// DMA Channel
// =============================================================================

/// One slave DMA channel.
///
/// Mapping calls act on the device behind the channel. Descriptor callbacks
/// must be satisfied exactly once per submitted descriptor, typically from
/// the channel's completion interrupt.
pub trait DmaChannel {
    /// Bind `buf` to a bus address for the given access direction.
    fn map_single(&mut self, buf: &[u8], dir: DataDirection) -> DmaResult<BusAddr>;

    /// Release a mapping made by [`map_single`](Self::map_single).
    fn unmap_single(&mut self, addr: BusAddr, len: usize, dir: DataDirection);

    /// Make device writes to a still-mapped buffer visible in `buf`.
    fn sync_for_cpu(&mut self, addr: BusAddr, buf: &mut [u8], dir: DataDirection);

    /// Prepare a slave scatter-gather transfer over `sg`.
    fn prep_slave_sg(
        &mut self,
        sg: &ScatterList,
        direction: TransferDirection,
        flags: PrepFlags,
    ) -> DmaResult<Descriptor>;

    /// Queue a prepared descriptor. A negative cookie reports rejection.
    fn submit(&mut self, desc: Descriptor) -> Cookie;

    /// Start executing queued descriptors.
    fn issue_pending(&mut self);

    /// Query the status of a submitted transfer.
    fn tx_status(&mut self, cookie: Cookie) -> DmaStatus;
}
