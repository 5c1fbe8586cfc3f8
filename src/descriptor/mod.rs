//! Scatter-Gather Descriptors
//!
//! Plain data types exchanged between the transaction engine and a DMA
//! channel implementation:
//!
//! - [`BusAddr`]: device-visible address of a mapped buffer
//! - [`ScatterList`]: ordered `(address, length)` segments for one direction
//! - [`Descriptor`]: prepared, not yet submitted transfer with its completion
//! - [`Cookie`]: submission token used to query transfer status

use alloc::sync::Arc;
use core::ops::BitOr;

use crate::internal::constants::{BD_COUNT, BUFFER_SIZE};
use crate::sync::Completion;

// =============================================================================
// Bus Addresses and Directions
// =============================================================================

/// Bus address of a buffer mapped for DMA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusAddr(pub u64);

impl BusAddr {
    /// Placeholder for a slot that holds no mapping
    pub const UNSET: Self = Self(0);

    /// Raw address value
    #[inline(always)]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Whether this slot holds no mapping
    #[inline(always)]
    pub const fn is_unset(self) -> bool {
        self.0 == Self::UNSET.0
    }
}

impl core::fmt::LowerHex for BusAddr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Access direction of a streaming buffer mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataDirection {
    /// CPU writes, device reads
    ToDevice,
    /// Device writes, CPU reads
    FromDevice,
    /// Both sides may read and write
    Bidirectional,
}

impl DataDirection {
    /// Whether the device may write into the mapped buffer
    #[must_use]
    pub const fn device_writes(self) -> bool {
        matches!(self, Self::FromDevice | Self::Bidirectional)
    }
}

/// Direction of a slave scatter-gather transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferDirection {
    /// Memory to device (transmit)
    MemToDev,
    /// Device to memory (receive)
    DevToMem,
}

impl TransferDirection {
    /// Returns the name used in diagnostics
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransferDirection::MemToDev => "Mem -> Dev",
            TransferDirection::DevToMem => "Dev -> Mem",
        }
    }
}

impl core::fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Scatter List
// =============================================================================

/// One scatter-gather segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SgEntry {
    /// Bus address of the segment
    pub addr: BusAddr,
    /// Segment length in bytes
    pub len: u32,
}

/// Fixed-length scatter list, one entry per buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScatterList {
    entries: [SgEntry; BD_COUNT],
}

impl ScatterList {
    /// Build a list over `addrs`, each segment spanning a whole buffer.
    #[must_use]
    pub fn from_addrs(addrs: &[BusAddr; BD_COUNT]) -> Self {
        let mut entries = [SgEntry::default(); BD_COUNT];
        for (entry, addr) in entries.iter_mut().zip(addrs) {
            *entry = SgEntry {
                addr: *addr,
                len: BUFFER_SIZE as u32,
            };
        }
        Self { entries }
    }

    /// Segments in transfer order
    #[inline(always)]
    pub fn entries(&self) -> &[SgEntry] {
        &self.entries
    }

    /// Number of segments
    #[inline(always)]
    pub const fn len(&self) -> usize {
        BD_COUNT
    }

    /// Always false; the list length is fixed
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        BD_COUNT == 0
    }

    /// Total transfer length in bytes
    pub fn total_len(&self) -> usize {
        self.entries.iter().map(|e| e.len as usize).sum()
    }
}

// =============================================================================
// Control Flags
// =============================================================================

/// Descriptor preparation flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PrepFlags(u32);

impl PrepFlags {
    /// No flags
    pub const NONE: Self = Self(0);
    /// Raise a completion interrupt when the transfer finishes
    pub const PREP_INTERRUPT: Self = Self(1 << 0);
    /// Descriptor is acknowledged by the client and may be recycled
    pub const CTRL_ACK: Self = Self(1 << 1);

    /// Raw bit value
    #[inline(always)]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Check whether every bit of `other` is set
    #[inline(always)]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for PrepFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

// =============================================================================
// Descriptor and Cookie
// =============================================================================

/// Prepared transfer issued by a channel, consumed by [`submit`].
///
/// The channel implementation identifies its own bookkeeping through
/// [`Descriptor::id`]. The transaction engine only attaches a completion.
///
/// [`submit`]: crate::hal::DmaChannel::submit
#[derive(Debug)]
pub struct Descriptor {
    id: u32,
    direction: TransferDirection,
    flags: PrepFlags,
    callback: Option<Arc<Completion>>,
}

impl Descriptor {
    /// Create a descriptor; called by channel implementations.
    #[must_use]
    pub const fn new(id: u32, direction: TransferDirection, flags: PrepFlags) -> Self {
        Self {
            id,
            direction,
            flags,
            callback: None,
        }
    }

    /// Channel-assigned identifier
    #[inline(always)]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Transfer direction
    #[inline(always)]
    pub const fn direction(&self) -> TransferDirection {
        self.direction
    }

    /// Control flags used at preparation
    #[inline(always)]
    pub const fn flags(&self) -> PrepFlags {
        self.flags
    }

    /// Attach the completion signalled when the transfer retires
    pub fn set_callback(&mut self, completion: Arc<Completion>) {
        self.callback = Some(completion);
    }

    /// Detach the completion, leaving none behind.
    ///
    /// Channel implementations keep the returned handle and call
    /// [`Completion::complete`] from their interrupt path.
    pub fn take_callback(&mut self) -> Option<Arc<Completion>> {
        self.callback.take()
    }
}

/// Submission token. Negative values report a submission error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cookie(pub i32);

impl Cookie {
    /// Generic submission failure
    pub const INVALID: Self = Self(-1);

    /// Whether the submission was rejected
    #[inline(always)]
    pub const fn is_error(self) -> bool {
        self.0 < 0
    }
}

/// Status of a submitted transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaStatus {
    /// Transfer finished successfully
    Complete,
    /// Transfer still running
    InProgress,
    /// Channel paused with the transfer outstanding
    Paused,
    /// Transfer finished with an error
    Error,
}

impl DmaStatus {
    /// Returns the status as reported in diagnostics
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DmaStatus::Complete => "complete",
            DmaStatus::InProgress | DmaStatus::Paused => "in progress",
            DmaStatus::Error => "error",
        }
    }
}

impl core::fmt::Display for DmaStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
