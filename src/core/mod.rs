//! Core constants and error types shared across the driver.

pub mod constants;
mod error;

pub use error::DriverError;
