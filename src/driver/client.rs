//! Client-role driver loop.
//!
//! Differs from the server in genesis and termination: the client creates
//! its one outbound connection up front and sends the handshake-initiating
//! datagram before ever entering the receive loop, and it bounds how long
//! it lingers after the handshake completes. Once the connection has been
//! ready for a few consecutive iterations (or a ready iteration passes
//! with no data), it requests a close rather than waiting forever for
//! application data that will never arrive. A connectivity checker's
//! heuristic, kept deliberately.

use std::net::SocketAddr;

use crate::clock::LogicalClock;
use crate::core::DriverError;
use crate::driver::{DriverConfig, produce_and_send};
use crate::engine::{ConnectionState, Engine};
use crate::transport::{DatagramGate, RecvOutcome};

/// The client-role connection driver.
#[derive(Debug)]
pub struct ClientDriver<E: Engine> {
    engine: E,
    gate: DatagramGate,
    config: DriverConfig,
    clock: LogicalClock,
    connection: E::ConnectionId,
    /// Resolved destination; all outbound packets go here.
    server_addr: SocketAddr,
    /// Consecutive iterations observed in the ready state.
    ready_loops: u32,
    last_state: Option<ConnectionState>,
}

impl<E: Engine> ClientDriver<E> {
    /// Create the one outbound connection at clock zero and wrap it in a
    /// driver. Connection creation failure is fatal.
    pub fn connect(
        mut engine: E,
        gate: DatagramGate,
        destination: SocketAddr,
        config: DriverConfig,
    ) -> Result<Self, DriverError> {
        let clock = LogicalClock::new();
        let connection = engine.create_connection(destination, clock.now())?;
        Ok(Self {
            engine,
            gate,
            config,
            clock,
            connection,
            server_addr: destination,
            ready_loops: 0,
            last_state: None,
        })
    }

    /// The engine context, for inspection after the loop finishes.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Send the handshake-initiating datagram, then run the loop until the
    /// connection disconnects or a fatal error occurs.
    pub async fn run(&mut self) -> Result<(), DriverError> {
        // First flight before the receive loop: the engine's initial
        // packet is what starts the handshake.
        produce_and_send(
            &mut self.engine,
            self.connection,
            self.clock.now(),
            &self.gate,
            self.server_addr,
        )
        .await?;

        while self.engine.connection_state(self.connection) != ConnectionState::Disconnected {
            self.iterate().await?;
        }
        tracing::info!("connection disconnected, client loop done");
        Ok(())
    }

    /// One full loop iteration: bounded receive, clock tick, engine
    /// submission, ready-linger bookkeeping, produce/send.
    async fn iterate(&mut self) -> Result<(), DriverError> {
        let outcome = self.gate.wait_and_receive(self.config.recv_timeout).await?;
        let received_data = matches!(outcome, RecvOutcome::Datagram { len, .. } if len > 0);

        match outcome {
            RecvOutcome::Datagram { len, peer } if len > 0 => {
                let now = self.clock.tick_recv();
                tracing::debug!(bytes = len, peer = %peer, "received datagram");

                if let Err(rejection) =
                    self.engine.submit_inbound(self.gate.datagram(len), peer, now)
                {
                    tracing::warn!(peer = %peer, error = %rejection, "inbound packet rejected");
                }
            }
            _ => {
                self.clock.tick_idle();
            }
        }

        let state = self.engine.connection_state(self.connection);
        if self.last_state != Some(state) {
            tracing::info!(state = %state, "connection state changed");
            self.last_state = Some(state);
        }

        // Bounded linger after the handshake: no application data is
        // coming, so once ready sticks, tear down.
        if state == ConnectionState::Ready {
            self.ready_loops += 1;
            if !received_data || self.ready_loops > self.config.ready_loop_limit {
                tracing::info!("connection established, disconnecting");
                self.engine.close(self.connection)?;
            }
        }

        // Poll production even right after a close request: the closing
        // handshake rides on the same produce/send cycle.
        produce_and_send(
            &mut self.engine,
            self.connection,
            self.clock.now(),
            &self.gate,
            self.server_addr,
        )
        .await
    }
}
