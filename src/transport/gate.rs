//! The socket I/O gate: one socket, one bounded wait, one receive.
//!
//! The driver loop blocks nowhere else. Waiting is bounded so the loop can
//! make periodic progress (advance the logical clock, re-check connection
//! state) even with no network activity.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;

use crate::core::constants::MAX_DATAGRAM_SIZE;

/// Outcome of one bounded wait on the gate.
///
/// A zero-length datagram is reported as `Datagram { len: 0, .. }`; it is
/// neither a timeout nor an error, though the driver treats it as an idle
/// tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvOutcome {
    /// A datagram arrived from `peer`.
    Datagram {
        /// Number of bytes received.
        len: usize,
        /// The sending peer's address.
        peer: SocketAddr,
    },
    /// The bounded wait elapsed with nothing to read.
    TimedOut,
}

/// Owns the driver's single UDP socket and its receive buffer.
#[derive(Debug)]
pub struct DatagramGate {
    socket: UdpSocket,
    recv_buffer: Vec<u8>,
}

impl DatagramGate {
    /// Bind a gate to the given local address.
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self {
            socket,
            recv_buffer: vec![0u8; MAX_DATAGRAM_SIZE],
        })
    }

    /// Get the local address.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Wait up to `timeout` for readability and perform a single receive.
    ///
    /// Timeout is a distinct outcome from "no bytes" and from an error; an
    /// `Err` here is fatal to the driver loop.
    pub async fn wait_and_receive(&mut self, timeout: Duration) -> io::Result<RecvOutcome> {
        match tokio::time::timeout(timeout, self.socket.recv_from(&mut self.recv_buffer)).await {
            Ok(Ok((len, peer))) => Ok(RecvOutcome::Datagram { len, peer }),
            Ok(Err(e)) => Err(e),
            Err(_elapsed) => Ok(RecvOutcome::TimedOut),
        }
    }

    /// The received bytes after a `Datagram` outcome.
    pub fn datagram(&self, len: usize) -> &[u8] {
        &self.recv_buffer[..len]
    }

    /// Send `bytes` to `addr`.
    pub async fn send_to(&self, bytes: &[u8], addr: SocketAddr) -> io::Result<usize> {
        self.socket.send_to(bytes, addr).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recv_outcome_is_copy() {
        let outcome = RecvOutcome::TimedOut;
        let copied = outcome;
        assert_eq!(outcome, copied);
    }

    #[tokio::test]
    async fn test_gate_bind() {
        let gate = DatagramGate::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        assert!(gate.local_addr().unwrap().port() != 0);
    }

    #[tokio::test]
    async fn test_gate_receives_datagram_with_peer() {
        let mut gate = DatagramGate::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let gate_addr = gate.local_addr().unwrap();

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender.send_to(b"hello gate", gate_addr).await.unwrap();

        let outcome = gate
            .wait_and_receive(Duration::from_secs(1))
            .await
            .unwrap();
        match outcome {
            RecvOutcome::Datagram { len, peer } => {
                assert_eq!(gate.datagram(len), b"hello gate");
                assert_eq!(peer, sender.local_addr().unwrap());
            }
            RecvOutcome::TimedOut => panic!("expected a datagram"),
        }
    }

    #[tokio::test]
    async fn test_gate_times_out_when_idle() {
        let mut gate = DatagramGate::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();

        let outcome = gate
            .wait_and_receive(Duration::from_millis(20))
            .await
            .unwrap();
        assert_eq!(outcome, RecvOutcome::TimedOut);
    }

    #[tokio::test]
    async fn test_gate_reports_zero_length_datagram() {
        let mut gate = DatagramGate::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let gate_addr = gate.local_addr().unwrap();

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender.send_to(&[], gate_addr).await.unwrap();

        let outcome = gate
            .wait_and_receive(Duration::from_secs(1))
            .await
            .unwrap();
        assert!(matches!(outcome, RecvOutcome::Datagram { len: 0, .. }));
    }

    #[tokio::test]
    async fn test_gate_send_to() {
        let gate = DatagramGate::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let sent = gate
            .send_to(b"outbound", receiver.local_addr().unwrap())
            .await
            .unwrap();
        assert_eq!(sent, 8);

        let mut buf = [0u8; 64];
        let (len, from) = receiver.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"outbound");
        assert_eq!(from, gate.local_addr().unwrap());
    }
}
