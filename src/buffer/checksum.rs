//! Checksum Codec
//!
//! 16-bit one's-complement Internet checksum (RFC 1071) over a buffer's
//! payload, stored in the buffer's trailer by the producer and recomputed by
//! the consumer after the loopback transfer.

use rand_core::RngCore;

use super::Buffer;

/// Internet checksum of `data`.
///
/// Sums big-endian 16-bit words (an odd trailing byte is padded with zero),
/// folds the carries and returns the one's complement.
pub fn compute(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut words = data.chunks_exact(2);

    for word in &mut words {
        sum += u32::from(u16::from_be_bytes([word[0], word[1]]));
        // Fold early so the accumulator never overflows on long buffers
        if sum > 0xFFFF {
            sum = (sum & 0xFFFF) + (sum >> 16);
        }
    }
    if let [last] = words.remainder() {
        sum += u32::from(*last) << 8;
    }

    while sum > 0xFFFF {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}

/// Fill the payload with random bytes and write its checksum to the trailer.
///
/// Returns the checksum written.
pub fn stamp<R: RngCore + ?Sized>(buffer: &mut Buffer, rng: &mut R) -> u16 {
    rng.fill_bytes(buffer.payload_mut());
    let checksum = compute(buffer.payload());
    buffer.set_checksum(checksum);
    checksum
}

/// Result of checking one buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChecksumCheck {
    /// Checksum recomputed over the payload
    pub computed: u16,
    /// Checksum found in the trailer
    pub stored: u16,
}

impl ChecksumCheck {
    /// Whether the payload matches its trailer
    #[inline(always)]
    pub const fn is_match(&self) -> bool {
        self.computed == self.stored
    }
}

/// Recompute the payload checksum and compare it with the trailer.
pub fn check(buffer: &Buffer) -> ChecksumCheck {
    ChecksumCheck {
        computed: compute(buffer.payload()),
        stored: buffer.checksum(),
    }
}

/// Whether `buffer`'s payload matches its trailer
pub fn verify(buffer: &Buffer) -> bool {
    check(buffer).is_match()
}
