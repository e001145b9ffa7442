//! # Firstflight
//!
//! A minimal single-connection QUIC-style transport driver: an event loop
//! that owns one UDP socket, feeds inbound datagrams into a connection state
//! machine, drains outbound datagrams and stateless responses produced by
//! that state machine, and advances a logical clock that governs
//! retransmission and connection lifecycle.
//!
//! The protocol engine itself (handshake, wire format, loss recovery) lives
//! behind the [`engine::Engine`] trait; this crate is the part that must get
//! ordering, blocking, and lifecycle semantics exactly right around it.
//!
//! ## Modules
//!
//! - [`core`]: Constants and error types
//! - [`clock`]: The logical clock driven by loop iterations, not wall time
//! - [`transport`]: Address resolution and the single-socket I/O gate
//! - [`engine`]: The engine boundary (trait, connection states, stateless packets)
//! - [`driver`]: The server-role and client-role driver loops
//!
//! ## Feature Flags
//!
//! - `demo-engine` (default): a cleartext demonstration engine so the
//!   `firstflight` binary works as a self-contained connectivity checker
//!
//! ## Example Usage
//!
//! ```ignore
//! use firstflight::prelude::*;
//!
//! let dest = resolve_endpoint("127.0.0.1", 4443)?;
//! let gate = DatagramGate::bind(client_bind_addr(dest)).await?;
//! let mut driver = ClientDriver::connect(DemoEngine::client(), gate, dest, DriverConfig::default())?;
//! driver.run().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod clock;
pub mod core;
pub mod driver;
pub mod engine;
pub mod transport;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::clock::LogicalClock;
    pub use crate::core::{DriverError, constants};
    pub use crate::driver::{ClientDriver, DriverConfig, OutboundPacket, ServerDriver};
    pub use crate::engine::{
        ConnectionState, Engine, EngineError, ServerCredentials, StatelessPacket, SubmitError,
    };
    #[cfg(feature = "demo-engine")]
    pub use crate::engine::demo::DemoEngine;
    pub use crate::transport::{DatagramGate, RecvOutcome, client_bind_addr, resolve_endpoint};
}

// Re-export commonly used items at crate root
pub use clock::LogicalClock;
pub use self::core::DriverError;
pub use driver::{ClientDriver, DriverConfig, ServerDriver};
pub use engine::{ConnectionState, Engine};
pub use transport::{DatagramGate, RecvOutcome};
