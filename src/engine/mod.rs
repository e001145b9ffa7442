//! The engine boundary.
//!
//! The protocol engine (handshake, wire format, loss recovery) is an
//! external collaborator. The driver never mutates connection internals:
//! it only submits inbound bytes, asks for the next outbound packet, reads
//! the connection state, and requests close. [`Engine`] is that seam.
//!
//! Context creation maps to the concrete engine type's constructors, and
//! context release maps to `Drop`: dropping an engine releases all owned
//! connections and any queued stateless packets.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

#[cfg(feature = "demo-engine")]
#[cfg_attr(docsrs, doc(cfg(feature = "demo-engine")))]
pub mod demo;

/// Connection lifecycle state, as observed by the driver.
///
/// The engine owns every transition; the driver only reads this enum. The
/// server role never observes [`ConnectionState::AlmostReady`], the
/// client-only sub-state between handshake completion and the final
/// confirmation flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Handshake in progress.
    Handshaking,
    /// Client has the server's answer; one confirmation flight remains.
    AlmostReady,
    /// Connection established.
    Ready,
    /// Close requested or received; closing exchange in progress.
    Closing,
    /// Connection fully torn down.
    Disconnected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Handshaking => "handshaking",
            Self::AlmostReady => "almost-ready",
            Self::Ready => "ready",
            Self::Closing => "closing",
            Self::Disconnected => "disconnected",
        };
        f.write_str(name)
    }
}

/// Certificate material handed to server-role context creation.
#[derive(Debug, Clone)]
pub struct ServerCredentials {
    /// Path to the certificate file.
    pub cert_file: PathBuf,
    /// Path to the private key file.
    pub key_file: PathBuf,
}

/// An engine-produced reply not associated with an established connection,
/// such as a protocol-level rejection.
///
/// Dequeued by the driver, sent to the inbound packet's source, then
/// released back to the engine: exactly once per item, in dequeue order,
/// regardless of send success or failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatelessPacket {
    bytes: Vec<u8>,
}

impl StatelessPacket {
    /// Create a stateless packet from its wire bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// The wire bytes to send.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Per-packet rejection of an inbound datagram.
///
/// Not fatal: the engine may legitimately reject malformed or stale
/// packets, and one bad datagram must not kill a connection that might
/// still be healthy. The driver logs these and continues.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// Datagram too short to carry a frame header.
    #[error("malformed datagram ({0} bytes)")]
    Malformed(usize),

    /// Frame carried a protocol version this engine does not speak.
    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(u8),

    /// Frame type is not part of the protocol.
    #[error("unknown frame type {0:#04x}")]
    UnknownFrame(u8),

    /// Connection slot is occupied by another peer.
    #[error("connection refused: slot occupied")]
    Refused,
}

/// Fatal engine failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Engine context creation failed.
    #[error("context creation failed: {0}")]
    Setup(String),

    /// Outbound connection creation failed.
    #[error("connection creation failed: {0}")]
    Connect(String),

    /// Packet production failed.
    #[error("packet production failed: {0}")]
    Production(String),

    /// Close request failed.
    #[error("close failed: {0}")]
    Close(String),

    /// The connection handle is not owned by this engine.
    #[error("unknown connection handle")]
    UnknownConnection,
}

/// The protocol engine behind the driver.
///
/// One engine context exists per process role. It owns zero or more
/// connections, identified opaquely by [`Engine::ConnectionId`].
pub trait Engine {
    /// Opaque connection identifier.
    type ConnectionId: Copy + Eq + fmt::Debug;

    /// Create one outbound connection to `destination` at clock `now`.
    fn create_connection(
        &mut self,
        destination: SocketAddr,
        now: u64,
    ) -> Result<Self::ConnectionId, EngineError>;

    /// Submit an inbound datagram with its source address and the current
    /// clock value.
    fn submit_inbound(
        &mut self,
        bytes: &[u8],
        peer: SocketAddr,
        now: u64,
    ) -> Result<(), SubmitError>;

    /// Fill `buf` in place with the next outbound packet for `conn` at
    /// clock `now`; returns the written length in `[0, buf.len()]`.
    ///
    /// Zero means nothing to send this iteration. Retransmissions,
    /// acknowledgments, and the closing handshake are all driven by this
    /// call being polled on every loop iteration.
    fn produce_outbound(
        &mut self,
        conn: Self::ConnectionId,
        now: u64,
        buf: &mut [u8],
    ) -> Result<usize, EngineError>;

    /// The first connection this engine accepted, if any.
    fn first_connection(&self) -> Option<Self::ConnectionId>;

    /// Current lifecycle state of `conn`.
    fn connection_state(&self, conn: Self::ConnectionId) -> ConnectionState;

    /// Request a graceful close of `conn`.
    fn close(&mut self, conn: Self::ConnectionId) -> Result<(), EngineError>;

    /// Dequeue the next pending stateless packet, if any.
    fn dequeue_stateless(&mut self) -> Option<StatelessPacket>;

    /// Release a stateless packet after the send attempt.
    fn release_stateless(&mut self, packet: StatelessPacket);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_display() {
        assert_eq!(ConnectionState::Handshaking.to_string(), "handshaking");
        assert_eq!(ConnectionState::AlmostReady.to_string(), "almost-ready");
        assert_eq!(ConnectionState::Disconnected.to_string(), "disconnected");
    }

    #[test]
    fn test_stateless_packet_bytes() {
        let packet = StatelessPacket::new(vec![1, 2, 3]);
        assert_eq!(packet.bytes(), &[1, 2, 3]);
    }

    #[test]
    fn test_submit_error_messages() {
        assert_eq!(
            SubmitError::Malformed(1).to_string(),
            "malformed datagram (1 bytes)"
        );
        assert_eq!(
            SubmitError::UnknownFrame(0xAB).to_string(),
            "unknown frame type 0xab"
        );
    }
}
