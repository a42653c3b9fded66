//! WiFi link seam

use core::net::Ipv4Addr;

use crate::config::InternetConfig;

/// Association state of the station interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// Radio up, no association requested
    Idle,
    /// Association in progress or being retried
    Associating,
    /// Associated, waiting for DHCP
    AwaitingAddress,
    /// Lost or refused by the access point
    Disconnected,
    /// Associated with an address assigned
    Connected(Ipv4Addr),
}

impl LinkStatus {
    pub fn address(&self) -> Option<Ipv4Addr> {
        match self {
            LinkStatus::Connected(address) => Some(*address),
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, LinkStatus::Connected(_))
    }
}

/// A WiFi station that can be asked to join a network and polled.
#[allow(async_fn_in_trait)]
pub trait WifiLink {
    type Error: core::fmt::Debug;

    /// Start joining the network. Returns once the request is issued, not
    /// once the station is connected.
    async fn begin(&mut self, credentials: &InternetConfig<'_>) -> Result<(), Self::Error>;

    /// Current association state.
    async fn status(&mut self) -> LinkStatus;

    /// Give up on the network: stop any association attempt in progress
    /// and leave the station idle. No further attempts are made.
    async fn end(&mut self);
}
