//! Signal Relay Client
//!
//! One-way command channel to the GPIO relay daemon driving the physical
//! signal heads. The controller only ever writes desired states; it never
//! reads hardware state back.

pub mod client;
pub mod command;

pub use client::{RelayClient, RelayConfig};
pub use command::{DesiredState, SignalId};

use thiserror::Error;

/// Relay error types
#[derive(Error, Debug)]
pub enum RelayError {
    /// Request could not be delivered
    #[error("Relay transport error: {0}")]
    Transport(String),

    /// Daemon answered with a non-success status
    #[error("Relay daemon returned HTTP {0}")]
    Status(u16),

    /// All delivery attempts exhausted
    #[error("Relay unreachable after {attempts} attempts")]
    Unreachable { attempts: u32 },
}
