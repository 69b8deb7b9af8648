//! Game status protocol port.

use crate::status::domain::{ServerAddress, ServerStatus};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type for status probes.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Queries one game server for its live status.
#[async_trait]
pub trait GameStatusProbe: Send + Sync {
    /// Sends a status query to `address`.
    async fn query(&self, address: &ServerAddress) -> ProbeResult<ServerStatus>;
}

/// Errors returned by status probes.
#[derive(Debug, Clone, Error)]
pub enum ProbeError {
    /// The host name did not resolve.
    #[error("could not resolve {address}: {cause}")]
    Resolve {
        /// Queried address.
        address: ServerAddress,
        /// Resolver error.
        cause: Arc<std::io::Error>,
    },

    /// The TCP connection failed or was reset mid-exchange.
    #[error("connection to {address} failed: {cause}")]
    Connection {
        /// Queried address.
        address: ServerAddress,
        /// Socket error.
        cause: Arc<std::io::Error>,
    },

    /// No answer arrived within the deadline.
    #[error("{address} did not answer within {after:?}")]
    Timeout {
        /// Queried address.
        address: ServerAddress,
        /// Deadline that expired.
        after: Duration,
    },

    /// The server answered with something other than a status response.
    #[error("malformed status response from {address}: {reason}")]
    Protocol {
        /// Queried address.
        address: ServerAddress,
        /// Decoder failure description.
        reason: String,
    },
}

impl ProbeError {
    /// Wraps a socket error.
    #[must_use]
    pub fn connection(address: &ServerAddress, err: std::io::Error) -> Self {
        Self::Connection {
            address: address.clone(),
            cause: Arc::new(err),
        }
    }

    /// Builds a protocol error.
    #[must_use]
    pub fn protocol(address: &ServerAddress, reason: impl Into<String>) -> Self {
        Self::Protocol {
            address: address.clone(),
            reason: reason.into(),
        }
    }
}
