//! ==============================================================================
//! transport.rs - peer link abstraction
//! ==============================================================================
//!
//! purpose:
//!     point-to-point messaging between the hub and the sensing boards.
//!     peers are addressed by mac and must be registered before sending.
//!
//! implementations:
//!     - UdpTransport: the link carried over udp datagrams, each registered
//!       mac bound to the socket address its board listens on
//!     - MockTransport (tests): records frames and fails on request
//!
//! relationships:
//!     - used by: relay.rs (send), main.rs (receive loop, peer registration)
//!
//! ==============================================================================

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;

use anyhow::{Context, Result};
use macaddr::MacAddr6;
use thiserror::Error;
use tokio::net::UdpSocket;

/// largest frame accepted from the link
pub const MAX_FRAME_LEN: usize = 250;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("peer {0} is not registered")]
    UnknownPeer(MacAddr6),

    #[error("peer {0} is already registered")]
    DuplicatePeer(MacAddr6),

    #[error("send to {peer} failed: {source}")]
    Send {
        peer: MacAddr6,
        #[source]
        source: std::io::Error,
    },
}

/// registration record for one peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerInfo {
    pub mac: MacAddr6,
    pub addr: SocketAddr,
    pub channel: u8,
}

/// a frame received from the link
#[derive(Debug, Clone)]
pub struct Inbound {
    pub from: SocketAddr,
    /// set when the sender is a registered peer
    pub peer: Option<MacAddr6>,
    pub payload: Vec<u8>,
}

impl Inbound {
    /// printable sender identity for diagnostics
    pub fn sender(&self) -> String {
        match self.peer {
            Some(mac) => mac.to_string(),
            None => self.from.to_string(),
        }
    }
}

pub trait PeerTransport: Send + Sync {
    fn add_peer(&self, peer: PeerInfo) -> Result<(), TransportError>;

    /// fire-and-forget; Ok only means the frame was handed to the link
    fn send(&self, peer: MacAddr6, frame: &[u8]) -> Result<(), TransportError>;
}

// ==============================================================================
// udp implementation
// ==============================================================================

pub struct UdpTransport {
    socket: UdpSocket,
    peers: Mutex<HashMap<MacAddr6, PeerInfo>>,
}

impl UdpTransport {
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .with_context(|| format!("failed to bind peer link socket on {addr}"))?;
        Ok(Self {
            socket,
            peers: Mutex::new(HashMap::new()),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().context("peer link socket has no local address")
    }

    /// wait for the next datagram
    pub async fn recv(&self) -> std::io::Result<Inbound> {
        let mut buf = [0u8; MAX_FRAME_LEN];
        let (len, from) = self.socket.recv_from(&mut buf).await?;
        let peer = self
            .registry()
            .values()
            .find(|p| p.addr == from)
            .map(|p| p.mac);
        Ok(Inbound {
            from,
            peer,
            payload: buf[..len].to_vec(),
        })
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, HashMap<MacAddr6, PeerInfo>> {
        self.peers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PeerTransport for UdpTransport {
    fn add_peer(&self, peer: PeerInfo) -> Result<(), TransportError> {
        let mut peers = self.registry();
        if peers.contains_key(&peer.mac) {
            return Err(TransportError::DuplicatePeer(peer.mac));
        }
        tracing::debug!(
            "[LINK] registered peer {} at {} on channel {}",
            peer.mac,
            peer.addr,
            peer.channel
        );
        peers.insert(peer.mac, peer);
        Ok(())
    }

    fn send(&self, peer: MacAddr6, frame: &[u8]) -> Result<(), TransportError> {
        let addr = self
            .registry()
            .get(&peer)
            .map(|p| p.addr)
            .ok_or(TransportError::UnknownPeer(peer))?;

        let result = self
            .socket
            .try_send_to(frame, addr)
            .map(|_| ())
            .map_err(|source| TransportError::Send { peer, source });

        // delivery status notification
        tracing::debug!(
            "[LINK] send status to {}: {}",
            peer,
            if result.is_ok() { "success" } else { "fail" }
        );
        result
    }
}
