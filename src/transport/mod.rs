//! Socket-facing layer: address resolution and the single-socket I/O gate.
//!
//! - **Address resolution**: [`resolve_endpoint`] turns a textual endpoint
//!   into a [`std::net::SocketAddr`]; [`client_bind_addr`] derives the
//!   client's local bind address from the destination.
//! - **I/O gate**: [`DatagramGate`] owns the one UDP socket and performs
//!   the bounded wait / single receive the driver loop is built around.

mod gate;
mod resolver;

pub use gate::{DatagramGate, RecvOutcome};
pub use resolver::{client_bind_addr, resolve_endpoint, wildcard_for};
