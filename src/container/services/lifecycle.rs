//! Container lifecycle client for provisioned servers.
//!
//! `start` and `delete` mutate remote state and propagate failures to the
//! caller. `restart` and `get_logs` degrade to display placeholders so that a
//! partitioned host never breaks a page render.

use crate::container::{
    domain::{ContainerDomainError, ContainerSpec, LOGS_UNAVAILABLE, LaunchSettings, OperationResult},
    ports::{ContainerRuntime, ContainerRuntimeError},
};
use crate::hosting::domain::{Server, ServerType};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Errors propagated by mutating container operations.
#[derive(Debug, Clone, Error)]
pub enum ContainerLifecycleError {
    /// The launch specification could not be assembled.
    #[error(transparent)]
    Launch(#[from] ContainerDomainError),
    /// The runtime call failed.
    #[error(transparent)]
    Runtime(#[from] ContainerRuntimeError),
}

/// Result type for mutating container operations.
pub type ContainerLifecycleResult<T> = Result<T, ContainerLifecycleError>;

/// Start, restart, delete, and log retrieval for server containers.
#[derive(Clone)]
pub struct ContainerLifecycleClient<R>
where
    R: ContainerRuntime,
{
    runtime: Arc<R>,
    settings: LaunchSettings,
    log_tail: usize,
}

impl<R> ContainerLifecycleClient<R>
where
    R: ContainerRuntime,
{
    /// Creates a client over `runtime`.
    #[must_use]
    pub const fn new(runtime: Arc<R>, settings: LaunchSettings, log_tail: usize) -> Self {
        Self {
            runtime,
            settings,
            log_tail,
        }
    }

    /// Launches the server's container, detached, with its port published.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerLifecycleError`] when the launch spec cannot be
    /// built or the runtime rejects or cannot receive the request.
    pub async fn start(
        &self,
        server: &Server,
        server_type: &ServerType,
    ) -> ContainerLifecycleResult<()> {
        let spec = ContainerSpec::for_server(server, server_type, &self.settings)?;
        self.runtime.run(server.host(), &spec).await?;
        info!(server = %server.name(), host = %server.host(), port = server.port(), "container started");
        Ok(())
    }

    /// Restarts the server's container, reporting the outcome instead of
    /// failing.
    pub async fn restart(&self, server: &Server) -> OperationResult {
        let result = self.runtime.restart(server.host(), server.name()).await;
        match &result {
            Ok(()) => info!(server = %server.name(), "container restarted"),
            Err(error) => warn!(server = %server.name(), %error, "container restart failed"),
        }
        OperationResult::restart(&result)
    }

    /// Force-removes the server's container.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerLifecycleError::Runtime`] when the runtime is
    /// unreachable or refuses the removal.
    pub async fn delete(&self, server: &Server) -> ContainerLifecycleResult<()> {
        self.runtime.remove(server.host(), server.name()).await?;
        info!(server = %server.name(), host = %server.host(), "container removed");
        Ok(())
    }

    /// Returns the trailing log lines, or a single placeholder line when the
    /// runtime cannot supply them.
    pub async fn get_logs(&self, server: &Server) -> Vec<String> {
        match self
            .runtime
            .logs(server.host(), server.name(), self.log_tail)
            .await
        {
            Ok(lines) => lines,
            Err(error) => {
                warn!(server = %server.name(), %error, "log collection failed");
                vec![LOGS_UNAVAILABLE.to_owned()]
            }
        }
    }
}
