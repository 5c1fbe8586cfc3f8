//! Hardware Abstraction Layer
//!
//! The tester never touches DMA registers. It drives the engine through two
//! traits modelled on a slave dmaengine client:
//!
//! - [`dma`]: [`DmaProvider`] (channel lookup) and [`DmaChannel`] (mapping,
//!   descriptor preparation, submission, status)
//! - [`channel`]: [`ChannelPair`], the transmit/receive pair held for the
//!   lifetime of the tester
//!
//! # Delay Integration
//!
//! Bounded completion waits use `embedded_hal::delay::DelayNs` directly.
//! Pass any delay implementation from your HAL, or
//! [`StdDelay`](crate::worker::StdDelay) on a hosted target.

pub mod channel;
pub mod dma;

pub use channel::ChannelPair;
pub use dma::{DmaChannel, DmaProvider};
