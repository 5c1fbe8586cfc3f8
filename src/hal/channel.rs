//! Transmit/receive channel pair
//!
//! Both channels are acquired once at attach and held until detach.
//! Acquisition order is transmit then receive; release is the reverse.

use super::dma::{DmaChannel, DmaProvider};
use crate::driver::config::TesterConfig;
use crate::driver::error::SetupResult;

/// The two long-lived channels used by every run
#[derive(Debug)]
pub struct ChannelPair<C: DmaChannel> {
    /// Memory-to-device channel
    pub tx: C,
    /// Device-to-memory channel
    pub rx: C,
}

impl<C: DmaChannel> ChannelPair<C> {
    /// Request the transmit and receive channels named in `config`.
    ///
    /// If the receive channel cannot be acquired the transmit channel is
    /// released before the error is returned.
    pub fn request<P>(provider: &mut P, config: &TesterConfig) -> SetupResult<Self>
    where
        P: DmaProvider<Channel = C>,
    {
        let tx = provider.request_channel(config.tx_channel).inspect_err(|_| {
            log::error!("Request DMA channel '{}' failed!", config.tx_channel);
        })?;

        let rx = match provider.request_channel(config.rx_channel) {
            Ok(rx) => rx,
            Err(e) => {
                log::error!("Request DMA channel '{}' failed!", config.rx_channel);
                provider.release_channel(tx);
                return Err(e);
            }
        };

        log::debug!(
            "acquired channels tx='{}' rx='{}'",
            config.tx_channel,
            config.rx_channel
        );
        Ok(Self { tx, rx })
    }

    /// Release both channels, receive first.
    pub fn release<P>(self, provider: &mut P)
    where
        P: DmaProvider<Channel = C>,
    {
        provider.release_channel(self.rx);
        provider.release_channel(self.tx);
    }
}
