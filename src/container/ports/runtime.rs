//! Remote container runtime port.

use crate::container::domain::ContainerSpec;
use crate::hosting::domain::{HostName, ServerName};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for container runtime operations.
pub type ContainerRuntimeResult<T> = Result<T, ContainerRuntimeError>;

/// Control contract for the container runtime on one host.
///
/// Every operation addresses the container named after the server.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Creates and starts a detached container from `spec`.
    async fn run(&self, host: &HostName, spec: &ContainerSpec) -> ContainerRuntimeResult<()>;

    /// Restarts an existing container.
    async fn restart(&self, host: &HostName, container: &ServerName)
    -> ContainerRuntimeResult<()>;

    /// Force-removes a container, stopping it first when running.
    async fn remove(&self, host: &HostName, container: &ServerName) -> ContainerRuntimeResult<()>;

    /// Returns up to `tail` trailing log lines.
    async fn logs(
        &self,
        host: &HostName,
        container: &ServerName,
        tail: usize,
    ) -> ContainerRuntimeResult<Vec<String>>;
}

/// Errors returned by container runtime adapters.
#[derive(Debug, Clone, Error)]
pub enum ContainerRuntimeError {
    /// The runtime endpoint on the host could not be reached.
    #[error("container runtime on {host} is unavailable: {cause}")]
    Unavailable {
        /// Host whose runtime failed.
        host: HostName,
        /// Underlying transport error.
        cause: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// No container with the given name exists on the host.
    #[error("container {container} not found on {host}")]
    NotFound {
        /// Host that was queried.
        host: HostName,
        /// Missing container name.
        container: String,
    },

    /// The runtime refused the request.
    #[error("container runtime on {host} rejected request with status {status}: {message}")]
    Rejected {
        /// Host whose runtime answered.
        host: HostName,
        /// HTTP status code.
        status: u16,
        /// Runtime-provided explanation.
        message: String,
    },

    /// The runtime answered with an unreadable payload.
    #[error("unreadable container runtime response from {host}: {reason}")]
    Decode {
        /// Host whose runtime answered.
        host: HostName,
        /// Decoder failure description.
        reason: String,
    },
}

impl ContainerRuntimeError {
    /// Wraps a transport failure for `host`.
    pub fn unavailable(host: &HostName, err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable {
            host: host.clone(),
            cause: Arc::new(err),
        }
    }

    /// Returns whether the host could not be reached at all.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}
