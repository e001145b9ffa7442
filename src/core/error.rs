//! Error types for the driver.
//!
//! Only fatal conditions live here: setup failures that abort before the
//! loop starts, and loop failures that abort it. Transient outcomes
//! (timeout, zero-length receive) are [`crate::transport::RecvOutcome`]
//! variants, and per-packet submission rejections are
//! [`crate::engine::SubmitError`] values that get logged and dropped.

use thiserror::Error;

use crate::engine::EngineError;

/// Fatal driver errors.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The endpoint text is not an IPv4 or IPv6 literal.
    #[error("could not parse address: {0}")]
    AddressParse(String),

    /// Engine context creation, connection creation, packet production,
    /// or close failed.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// Socket creation, bind, receive, or send failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
