//! The connection driver loops.
//!
//! One loop per role, both built from the same alternation: receive →
//! feed-to-engine → drain-stateless-responses → drain-connection-output →
//! send. The loop blocks only inside the gate's bounded wait; the logical
//! clock advancing on every iteration is what drives the engine's internal
//! timers, so a stalled network cannot starve retransmission.
//!
//! Loop state (cached connection handle, established peer address, the
//! client's ready-iteration counter) lives in the driver structs, never in
//! globals, so a fake engine can drive the loop in isolation.

mod client;
mod server;

pub use client::ClientDriver;
pub use server::ServerDriver;

use std::net::SocketAddr;
use std::time::Duration;

use crate::core::DriverError;
use crate::core::constants::{MAX_DATAGRAM_SIZE, READY_LOOP_LIMIT, RECV_TIMEOUT};
use crate::engine::Engine;
use crate::transport::DatagramGate;

/// Driver loop tuning.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Bounded wait of each gate receive.
    pub recv_timeout: Duration,

    /// Consecutive ready-state iterations a client lingers before issuing
    /// a close request.
    pub ready_loop_limit: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            recv_timeout: RECV_TIMEOUT,
            ready_loop_limit: READY_LOOP_LIMIT,
        }
    }
}

/// The outbound packet container the engine fills.
///
/// Allocated by the driver before each production call, filled in place by
/// the engine, and consumed exactly once: by send when non-empty, by drop
/// when empty. Never reused across iterations; at most one exists at a
/// time.
#[derive(Debug)]
pub struct OutboundPacket {
    buf: Vec<u8>,
    len: usize,
}

impl OutboundPacket {
    /// Allocate an empty container with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity],
            len: 0,
        }
    }

    /// The writable space handed to the engine.
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    /// Record how many bytes the engine wrote, bounded by the capacity.
    pub fn mark_filled(&mut self, len: usize) {
        self.len = len.min(self.buf.len());
    }

    /// The filled bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Whether the engine produced nothing this iteration.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// One full produce/send cycle: allocate a container, ask the engine for
/// the next outbound packet at clock `now`, then send it to `dest`, or
/// free it without a network call when the engine produced nothing.
///
/// Polled on every loop iteration, timeouts included: retransmissions,
/// acknowledgments, and the closing handshake all ride on this call.
pub(crate) async fn produce_and_send<E: Engine>(
    engine: &mut E,
    conn: E::ConnectionId,
    now: u64,
    gate: &DatagramGate,
    dest: SocketAddr,
) -> Result<(), DriverError> {
    let mut packet = OutboundPacket::new(MAX_DATAGRAM_SIZE);
    let written = engine.produce_outbound(conn, now, packet.buffer_mut())?;
    packet.mark_filled(written);
    if packet.is_empty() {
        return Ok(());
    }
    let sent = gate.send_to(packet.bytes(), dest).await?;
    tracing::debug!(bytes = sent, dest = %dest, "sent packet");
    Ok(())
}

#[cfg(test)]
pub(crate) mod testutil {
    //! A scriptable engine for driving the loops in isolation.

    use std::collections::VecDeque;
    use std::net::SocketAddr;

    use crate::engine::{
        ConnectionState, Engine, EngineError, StatelessPacket, SubmitError,
    };

    /// Records every driver/engine interaction; behavior is configured by
    /// public fields.
    #[derive(Debug)]
    pub struct FakeEngine {
        pub state: ConnectionState,
        pub expose_connection_on_submit: bool,
        pub connection_exposed: bool,
        pub submissions: Vec<(Vec<u8>, SocketAddr, u64)>,
        pub submit_error: Option<SubmitError>,
        pub disconnect_after_submits: Option<usize>,
        pub disconnect_after_produces: Option<usize>,
        pub stateless: VecDeque<StatelessPacket>,
        pub released: Vec<StatelessPacket>,
        pub produce_lens: VecDeque<usize>,
        pub produce_calls: usize,
        pub produce_clocks: Vec<u64>,
        pub close_calls: usize,
    }

    impl FakeEngine {
        pub fn new(state: ConnectionState) -> Self {
            Self {
                state,
                expose_connection_on_submit: false,
                connection_exposed: false,
                submissions: Vec::new(),
                submit_error: None,
                disconnect_after_submits: None,
                disconnect_after_produces: None,
                stateless: VecDeque::new(),
                released: Vec::new(),
                produce_lens: VecDeque::new(),
                produce_calls: 0,
                produce_clocks: Vec::new(),
                close_calls: 0,
            }
        }
    }

    impl Engine for FakeEngine {
        type ConnectionId = u8;

        fn create_connection(
            &mut self,
            _destination: SocketAddr,
            _now: u64,
        ) -> Result<Self::ConnectionId, EngineError> {
            self.connection_exposed = true;
            Ok(0)
        }

        fn submit_inbound(
            &mut self,
            bytes: &[u8],
            peer: SocketAddr,
            now: u64,
        ) -> Result<(), SubmitError> {
            self.submissions.push((bytes.to_vec(), peer, now));
            if self.expose_connection_on_submit {
                self.connection_exposed = true;
            }
            if let Some(n) = self.disconnect_after_submits {
                if self.submissions.len() >= n {
                    self.state = ConnectionState::Disconnected;
                }
            }
            match &self.submit_error {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            }
        }

        fn produce_outbound(
            &mut self,
            _conn: Self::ConnectionId,
            now: u64,
            buf: &mut [u8],
        ) -> Result<usize, EngineError> {
            self.produce_calls += 1;
            self.produce_clocks.push(now);
            if let Some(n) = self.disconnect_after_produces {
                if self.produce_calls >= n {
                    self.state = ConnectionState::Disconnected;
                }
            }
            let len = self.produce_lens.pop_front().unwrap_or(0);
            buf[..len].fill(0xAB);
            Ok(len)
        }

        fn first_connection(&self) -> Option<Self::ConnectionId> {
            self.connection_exposed.then_some(0)
        }

        fn connection_state(&self, _conn: Self::ConnectionId) -> ConnectionState {
            self.state
        }

        fn close(&mut self, _conn: Self::ConnectionId) -> Result<(), EngineError> {
            self.close_calls += 1;
            self.state = ConnectionState::Disconnected;
            Ok(())
        }

        fn dequeue_stateless(&mut self) -> Option<StatelessPacket> {
            self.stateless.pop_front()
        }

        fn release_stateless(&mut self, packet: StatelessPacket) {
            self.released.push(packet);
        }
    }
}
