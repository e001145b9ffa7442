//! Driver constants.
//!
//! The clock increments are dimensionless logical units, sized so that
//! timer-driven engine behavior progresses deterministically: a receive
//! nudges the clock forward a little, an idle second pushes it a lot.

use std::time::Duration;

/// Default endpoint when none is given on the command line.
pub const DEFAULT_ENDPOINT: &str = "::";

/// Default UDP port.
pub const DEFAULT_PORT: u16 = 4443;

/// Default certificate file for the server role.
pub const DEFAULT_CERT_FILE: &str = "certs/cert.pem";

/// Default private key file for the server role.
pub const DEFAULT_KEY_FILE: &str = "certs/key.pem";

/// Maximum datagram size: receive buffer and outbound container bound.
pub const MAX_DATAGRAM_SIZE: usize = 1536;

/// Small logical clock increment, applied on every successful receive.
pub const RECV_CLOCK_TICK: u64 = 1_000;

/// Large logical clock increment, applied on every timeout or empty receive.
pub const IDLE_CLOCK_TICK: u64 = 1_000_000;

/// Bounded wait of the socket I/O gate.
///
/// Chosen so the loop makes periodic progress (clock advance, state
/// re-check) even with no network activity.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(1);

/// Consecutive ready-state iterations a client lingers before closing.
pub const READY_LOOP_LIMIT: u32 = 4;
