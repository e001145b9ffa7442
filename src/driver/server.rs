//! Server-role driver loop.
//!
//! Accepts the first inbound connection and polls its state until the
//! engine reports it disconnected. The peer address of the first inbound
//! packet establishes the conversation partner for all subsequent sends;
//! no demultiplexing by connection identifier happens at this layer.

use std::net::SocketAddr;

use crate::clock::LogicalClock;
use crate::core::DriverError;
use crate::driver::{DriverConfig, produce_and_send};
use crate::engine::{ConnectionState, Engine};
use crate::transport::{DatagramGate, RecvOutcome};

/// The server-role connection driver.
///
/// Owns the socket and the engine context exclusively for the lifetime of
/// the loop; both are released when the driver is dropped, on every exit
/// path.
#[derive(Debug)]
pub struct ServerDriver<E: Engine> {
    engine: E,
    gate: DatagramGate,
    config: DriverConfig,
    clock: LogicalClock,
    /// Cached handle of the first accepted connection.
    connection: Option<E::ConnectionId>,
    /// Established conversation partner, recorded when the connection
    /// first appeared.
    client_addr: Option<SocketAddr>,
    last_state: Option<ConnectionState>,
}

impl<E: Engine> ServerDriver<E> {
    /// Build a server driver around an engine context and a bound gate.
    pub fn new(engine: E, gate: DatagramGate, config: DriverConfig) -> Self {
        Self {
            engine,
            gate,
            config,
            clock: LogicalClock::new(),
            connection: None,
            client_addr: None,
            last_state: None,
        }
    }

    /// The engine context, for inspection after the loop finishes.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Run the loop until the accepted connection disconnects or a fatal
    /// error occurs.
    pub async fn run(&mut self) -> Result<(), DriverError> {
        loop {
            if let Some(conn) = self.connection {
                if self.engine.connection_state(conn) == ConnectionState::Disconnected {
                    tracing::info!("connection disconnected, server loop done");
                    return Ok(());
                }
            }
            self.iterate().await?;
        }
    }

    /// One full loop iteration: bounded receive, clock tick, engine
    /// submission, stateless drain, connection pickup, produce/send.
    async fn iterate(&mut self) -> Result<(), DriverError> {
        match self.gate.wait_and_receive(self.config.recv_timeout).await? {
            RecvOutcome::Datagram { len, peer } if len > 0 => {
                let now = self.clock.tick_recv();
                tracing::debug!(bytes = len, peer = %peer, "received datagram");

                if let Err(rejection) =
                    self.engine.submit_inbound(self.gate.datagram(len), peer, now)
                {
                    tracing::warn!(peer = %peer, error = %rejection, "inbound packet rejected");
                }
                self.drain_stateless(peer).await?;

                if self.connection.is_none() {
                    if let Some(conn) = self.engine.first_connection() {
                        self.connection = Some(conn);
                        self.client_addr = Some(peer);
                        tracing::info!(
                            client = %peer,
                            state = %self.engine.connection_state(conn),
                            "connection established"
                        );
                    }
                }
            }
            // Timeout and the empty datagram both count as an idle
            // iteration: large tick, nothing to submit.
            _ => {
                self.clock.tick_idle();
            }
        }

        self.produce_cycle().await
    }

    /// Send every pending stateless packet to the inbound packet's source,
    /// releasing each exactly once. Release happens even when the send
    /// fails, before the failure aborts the loop.
    async fn drain_stateless(&mut self, peer: SocketAddr) -> Result<(), DriverError> {
        while let Some(packet) = self.engine.dequeue_stateless() {
            let sent = self.gate.send_to(packet.bytes(), peer).await;
            if let Ok(n) = &sent {
                tracing::debug!(bytes = *n, peer = %peer, "sent stateless packet");
            }
            self.engine.release_stateless(packet);
            sent?;
        }
        Ok(())
    }

    async fn produce_cycle(&mut self) -> Result<(), DriverError> {
        let (Some(conn), Some(client)) = (self.connection, self.client_addr) else {
            return Ok(());
        };

        let state = self.engine.connection_state(conn);
        if self.last_state != Some(state) {
            tracing::info!(state = %state, "connection state changed");
            self.last_state = Some(state);
        }

        produce_and_send(&mut self.engine, conn, self.clock.now(), &self.gate, client).await
    }
}
