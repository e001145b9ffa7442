//! A cleartext demonstration engine.
//!
//! Implements just enough connection state machine to exercise every
//! driver obligation end-to-end: a three-message handshake, a two-message
//! close, stateless rejections, and logical-clock-driven retransmission.
//! No cryptography and no streams; the binary built on top of this engine
//! is a connectivity checker, not a transport.
//!
//! Handshake ladder:
//!
//! ```text
//! client                          server
//!   │ ── CONNECT ──────────────▶   │   creates the single connection
//!   │ ◀────────────── ACCEPT ──   │   (handshaking)
//!   │ ── CONFIRM ──────────────▶   │   server: handshaking → ready
//!   │   (almost-ready → ready)     │
//! ```
//!
//! Close ladder: requester sends `CLOSE` (closing), peer answers
//! `CLOSE_ACK` and disconnects once it is on the wire; the requester
//! disconnects on receipt.

use std::collections::VecDeque;
use std::net::SocketAddr;

use super::{
    ConnectionState, Engine, EngineError, ServerCredentials, StatelessPacket, SubmitError,
};

/// Wire format constants.
pub mod wire {
    /// Protocol version carried in every frame.
    pub const VERSION: u8 = 1;
    /// Frame header size (version + type).
    pub const HEADER_SIZE: usize = 2;

    /// Stateless rejection (followed by a reason byte).
    pub const REJECT: u8 = 0x00;
    /// Client connection request.
    pub const CONNECT: u8 = 0x01;
    /// Server handshake answer.
    pub const ACCEPT: u8 = 0x02;
    /// Client handshake confirmation.
    pub const CONFIRM: u8 = 0x03;
    /// Graceful close request.
    pub const CLOSE: u8 = 0x04;
    /// Close acknowledgment.
    pub const CLOSE_ACK: u8 = 0x05;

    /// Rejection reason: unsupported protocol version.
    pub const REASON_VERSION: u8 = 0x01;
    /// Rejection reason: connection slot occupied.
    pub const REASON_BUSY: u8 = 0x02;
}

/// Pending control frames are retransmitted once the logical clock has
/// advanced this far since the last transmission. Smaller than the idle
/// tick, so every timeout iteration retransmits; much larger than the
/// receive tick, so bursts of inbound traffic do not.
pub const RETRANSMIT_INTERVAL: u64 = 800_000;

/// Opaque handle to the demo engine's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DemoConnectionId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Client,
    Server,
}

/// A control frame queued for (re)transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingFrame {
    frame_type: u8,
    last_sent: Option<u64>,
}

impl PendingFrame {
    fn new(frame_type: u8) -> Self {
        Self {
            frame_type,
            last_sent: None,
        }
    }

    fn due(&self, now: u64) -> bool {
        match self.last_sent {
            None => true,
            Some(at) => now.saturating_sub(at) >= RETRANSMIT_INTERVAL,
        }
    }
}

#[derive(Debug)]
struct DemoConnection {
    id: DemoConnectionId,
    peer: SocketAddr,
    state: ConnectionState,
    pending: Option<PendingFrame>,
}

/// The demonstration engine: one context, at most one connection.
#[derive(Debug)]
pub struct DemoEngine {
    role: Role,
    credentials: Option<ServerCredentials>,
    connection: Option<DemoConnection>,
    stateless: VecDeque<StatelessPacket>,
    next_conn_id: u64,
}

impl DemoEngine {
    /// Create a client-role engine context.
    pub fn client() -> Self {
        Self {
            role: Role::Client,
            credentials: None,
            connection: None,
            stateless: VecDeque::new(),
            next_conn_id: 1,
        }
    }

    /// Create a server-role engine context with certificate material.
    ///
    /// The demo engine is cleartext and never reads the files, but context
    /// creation fails fast on an empty certificate path the way a real
    /// engine would fail on unreadable credentials.
    pub fn server(credentials: ServerCredentials) -> Result<Self, EngineError> {
        if credentials.cert_file.as_os_str().is_empty() {
            return Err(EngineError::Setup(
                "certificate file path is empty".to_string(),
            ));
        }
        Ok(Self {
            role: Role::Server,
            credentials: Some(credentials),
            connection: None,
            stateless: VecDeque::new(),
            next_conn_id: 1,
        })
    }

    /// Certificate material this context was created with, if any.
    pub fn credentials(&self) -> Option<&ServerCredentials> {
        self.credentials.as_ref()
    }

    fn queue_reject(&mut self, reason: u8) {
        self.stateless.push_back(StatelessPacket::new(vec![
            wire::VERSION,
            wire::REJECT,
            reason,
        ]));
    }

    fn accept_connection(&mut self, peer: SocketAddr) -> DemoConnectionId {
        let id = DemoConnectionId(self.next_conn_id);
        self.next_conn_id += 1;
        self.connection = Some(DemoConnection {
            id,
            peer,
            state: ConnectionState::Handshaking,
            pending: Some(PendingFrame::new(wire::ACCEPT)),
        });
        id
    }

    fn on_connect(&mut self, peer: SocketAddr) -> Result<(), SubmitError> {
        if self.role != Role::Server {
            return Ok(());
        }
        match &mut self.connection {
            None => {
                self.accept_connection(peer);
                Ok(())
            }
            Some(conn) if conn.peer == peer => {
                // Duplicate CONNECT: our ACCEPT was lost, answer again now.
                if conn.state == ConnectionState::Handshaking {
                    conn.pending = Some(PendingFrame::new(wire::ACCEPT));
                }
                Ok(())
            }
            Some(_) => {
                self.queue_reject(wire::REASON_BUSY);
                Err(SubmitError::Refused)
            }
        }
    }

    fn on_accept(&mut self) {
        if self.role != Role::Client {
            return;
        }
        if let Some(conn) = &mut self.connection {
            match conn.state {
                ConnectionState::Handshaking => {
                    conn.state = ConnectionState::AlmostReady;
                    conn.pending = Some(PendingFrame::new(wire::CONFIRM));
                }
                // Duplicate ACCEPT: our CONFIRM was lost, answer again.
                ConnectionState::AlmostReady | ConnectionState::Ready => {
                    conn.pending = Some(PendingFrame::new(wire::CONFIRM));
                }
                _ => {}
            }
        }
    }

    fn on_confirm(&mut self, peer: SocketAddr) {
        if self.role != Role::Server {
            return;
        }
        if let Some(conn) = &mut self.connection {
            if conn.peer == peer && conn.state == ConnectionState::Handshaking {
                conn.state = ConnectionState::Ready;
                conn.pending = None;
            }
        }
    }

    fn on_close(&mut self) {
        if let Some(conn) = &mut self.connection {
            if conn.state != ConnectionState::Disconnected {
                conn.state = ConnectionState::Closing;
                conn.pending = Some(PendingFrame::new(wire::CLOSE_ACK));
            }
        }
    }

    fn on_close_ack(&mut self) {
        if let Some(conn) = &mut self.connection {
            if conn.state == ConnectionState::Closing {
                conn.state = ConnectionState::Disconnected;
                conn.pending = None;
            }
        }
    }
}

impl Engine for DemoEngine {
    type ConnectionId = DemoConnectionId;

    fn create_connection(
        &mut self,
        destination: SocketAddr,
        _now: u64,
    ) -> Result<Self::ConnectionId, EngineError> {
        if self.connection.is_some() {
            return Err(EngineError::Connect("connection already exists".to_string()));
        }
        let id = DemoConnectionId(self.next_conn_id);
        self.next_conn_id += 1;
        self.connection = Some(DemoConnection {
            id,
            peer: destination,
            state: ConnectionState::Handshaking,
            pending: Some(PendingFrame::new(wire::CONNECT)),
        });
        Ok(id)
    }

    fn submit_inbound(
        &mut self,
        bytes: &[u8],
        peer: SocketAddr,
        _now: u64,
    ) -> Result<(), SubmitError> {
        if bytes.len() < wire::HEADER_SIZE {
            return Err(SubmitError::Malformed(bytes.len()));
        }
        if bytes[0] != wire::VERSION {
            if self.role == Role::Server {
                self.queue_reject(wire::REASON_VERSION);
            }
            return Err(SubmitError::UnsupportedVersion(bytes[0]));
        }
        match bytes[1] {
            wire::CONNECT => self.on_connect(peer),
            wire::ACCEPT => {
                self.on_accept();
                Ok(())
            }
            wire::CONFIRM => {
                self.on_confirm(peer);
                Ok(())
            }
            wire::CLOSE => {
                self.on_close();
                Ok(())
            }
            wire::CLOSE_ACK => {
                self.on_close_ack();
                Ok(())
            }
            // A REJECT aimed at us, or garbage. Rejections carry no
            // connection state to update in this minimal engine.
            wire::REJECT => Ok(()),
            other => Err(SubmitError::UnknownFrame(other)),
        }
    }

    fn produce_outbound(
        &mut self,
        conn: Self::ConnectionId,
        now: u64,
        buf: &mut [u8],
    ) -> Result<usize, EngineError> {
        if buf.len() < wire::HEADER_SIZE {
            return Err(EngineError::Production(format!(
                "buffer too small: {} bytes",
                buf.len()
            )));
        }
        let Some(connection) = &mut self.connection else {
            return Err(EngineError::UnknownConnection);
        };
        if connection.id != conn {
            return Err(EngineError::UnknownConnection);
        }
        let Some(pending) = &mut connection.pending else {
            return Ok(0);
        };
        if !pending.due(now) {
            return Ok(0);
        }

        buf[0] = wire::VERSION;
        buf[1] = pending.frame_type;
        pending.last_sent = Some(now);

        // One-shot frames resolve their transition once they hit the wire;
        // the rest stay queued for retransmission.
        match pending.frame_type {
            wire::CONFIRM => {
                connection.state = ConnectionState::Ready;
                connection.pending = None;
            }
            wire::CLOSE_ACK => {
                connection.state = ConnectionState::Disconnected;
                connection.pending = None;
            }
            _ => {}
        }
        Ok(wire::HEADER_SIZE)
    }

    fn first_connection(&self) -> Option<Self::ConnectionId> {
        self.connection.as_ref().map(|c| c.id)
    }

    fn connection_state(&self, conn: Self::ConnectionId) -> ConnectionState {
        match &self.connection {
            Some(c) if c.id == conn => c.state,
            _ => ConnectionState::Disconnected,
        }
    }

    fn close(&mut self, conn: Self::ConnectionId) -> Result<(), EngineError> {
        let Some(connection) = &mut self.connection else {
            return Err(EngineError::UnknownConnection);
        };
        if connection.id != conn {
            return Err(EngineError::UnknownConnection);
        }
        match connection.state {
            ConnectionState::Closing | ConnectionState::Disconnected => Ok(()),
            _ => {
                connection.state = ConnectionState::Closing;
                connection.pending = Some(PendingFrame::new(wire::CLOSE));
                Ok(())
            }
        }
    }

    fn dequeue_stateless(&mut self) -> Option<StatelessPacket> {
        self.stateless.pop_front()
    }

    fn release_stateless(&mut self, packet: StatelessPacket) {
        // Ownership is the release: the packet is consumed here.
        drop(packet);
    }
}
