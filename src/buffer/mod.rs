//! Buffer Pool
//!
//! Heap-backed source and destination buffers, allocated once at attach and
//! reused by every run.
//!
//! Each buffer is laid out without padding as
//!
//! ```text
//! +-------------------------------+--------------+
//! | random payload (len - 2)      | checksum u16 |
//! +-------------------------------+--------------+
//! ```
//!
//! with the trailer stored little-endian. See [`checksum`] for the codec.

pub mod checksum;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::ops::{Index, IndexMut};

use crate::driver::error::{SetupError, SetupResult};
use crate::internal::constants::CHECKSUM_SIZE;

// =============================================================================
// Buffer
// =============================================================================

/// One contiguous DMA buffer with a checksum trailer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    bytes: Box<[u8]>,
}

impl Buffer {
    fn try_new(size: usize) -> SetupResult<Self> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(size)
            .map_err(|_| SetupError::AllocationFailed)?;
        bytes.resize(size, 0);
        Ok(Self {
            bytes: bytes.into_boxed_slice(),
        })
    }

    /// Total size in bytes, trailer included
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the buffer has zero length
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whole buffer
    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Whole buffer, mutable
    #[inline(always)]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Payload region, trailer excluded
    #[inline(always)]
    pub fn payload(&self) -> &[u8] {
        &self.bytes[..self.payload_len()]
    }

    /// Payload region, mutable
    #[inline(always)]
    pub fn payload_mut(&mut self) -> &mut [u8] {
        let len = self.payload_len();
        &mut self.bytes[..len]
    }

    /// Checksum stored in the trailer
    pub fn checksum(&self) -> u16 {
        let at = self.payload_len();
        u16::from_le_bytes([self.bytes[at], self.bytes[at + 1]])
    }

    /// Overwrite the trailer
    pub fn set_checksum(&mut self, checksum: u16) {
        let at = self.payload_len();
        self.bytes[at..at + CHECKSUM_SIZE].copy_from_slice(&checksum.to_le_bytes());
    }

    #[inline(always)]
    fn payload_len(&self) -> usize {
        self.bytes.len() - CHECKSUM_SIZE
    }
}

// =============================================================================
// Buffer Set
// =============================================================================

/// Fixed-length ordered sequence of equally sized buffers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferSet {
    buffers: Vec<Buffer>,
    buffer_size: usize,
}

impl BufferSet {
    /// Number of buffers
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Whether the set holds no buffers
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Size of each buffer in bytes
    #[inline(always)]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Bytes held by the set
    #[inline(always)]
    pub fn total_bytes(&self) -> usize {
        self.buffers.len() * self.buffer_size
    }

    /// Iterate over the buffers in order
    pub fn iter(&self) -> core::slice::Iter<'_, Buffer> {
        self.buffers.iter()
    }

    /// Iterate mutably over the buffers in order
    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, Buffer> {
        self.buffers.iter_mut()
    }
}

impl Index<usize> for BufferSet {
    type Output = Buffer;

    fn index(&self, index: usize) -> &Buffer {
        &self.buffers[index]
    }
}

impl IndexMut<usize> for BufferSet {
    fn index_mut(&mut self, index: usize) -> &mut Buffer {
        &mut self.buffers[index]
    }
}

impl<'a> IntoIterator for &'a BufferSet {
    type Item = &'a Buffer;
    type IntoIter = core::slice::Iter<'a, Buffer>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &'a mut BufferSet {
    type Item = &'a mut Buffer;
    type IntoIter = core::slice::IterMut<'a, Buffer>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

// =============================================================================
// Buffer Pool
// =============================================================================

/// Allocator for buffer sets drawing on a bounded byte budget.
///
/// The budget models the DMA-capable memory region available to the tester.
/// [`BufferPool::unbounded`] defers entirely to the global allocator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferPool {
    capacity: usize,
    in_use: usize,
}

impl BufferPool {
    /// Create a pool limited to `capacity` bytes of buffer memory
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            in_use: 0,
        }
    }

    /// Create a pool limited only by the global allocator
    #[must_use]
    pub const fn unbounded() -> Self {
        Self::new(usize::MAX)
    }

    /// Byte budget
    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes currently handed out
    #[inline(always)]
    pub const fn in_use(&self) -> usize {
        self.in_use
    }

    /// Allocate `count` zeroed buffers of `size` bytes each.
    ///
    /// On failure every buffer already allocated by this call is released
    /// before [`SetupError::AllocationFailed`] is returned.
    pub fn allocate(&mut self, count: usize, size: usize) -> SetupResult<BufferSet> {
        if size < CHECKSUM_SIZE {
            log::error!("buffer size {size} cannot hold a checksum trailer");
            return Err(SetupError::AllocationFailed);
        }

        let mut buffers = Vec::new();
        buffers
            .try_reserve_exact(count)
            .map_err(|_| SetupError::AllocationFailed)?;

        for index in 0..count {
            let buffer = self.reserve(size).and_then(|()| {
                Buffer::try_new(size).inspect_err(|_| self.in_use -= size)
            });

            match buffer {
                Ok(buffer) => buffers.push(buffer),
                Err(e) => {
                    log::error!("Alloc buffer ({index}) failed!");
                    self.in_use -= buffers.len() * size;
                    return Err(e);
                }
            }
        }

        Ok(BufferSet {
            buffers,
            buffer_size: size,
        })
    }

    /// Return every buffer of `set` to the pool.
    pub fn release(&mut self, set: BufferSet) {
        self.in_use = self.in_use.saturating_sub(set.total_bytes());
    }

    fn reserve(&mut self, size: usize) -> SetupResult<()> {
        match self.in_use.checked_add(size) {
            Some(total) if total <= self.capacity => {
                self.in_use = total;
                Ok(())
            }
            _ => Err(SetupError::AllocationFailed),
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::unbounded()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
