//! Server orchestration: quota checks, allocation, container lifecycle, and
//! status views.

use crate::container::{
    domain::OperationResult,
    ports::ContainerRuntime,
    services::{ContainerLifecycleClient, ContainerLifecycleError},
};
use crate::hosting::{
    domain::{
        GameType, Host, HostName, HostingDomainError, Owner, PlayerName, Server, ServerDraft,
        ServerName, ServerType, ServerTypeId, Username,
    },
    ports::{HostingRepository, HostingRepositoryError, OwnerDirectory, OwnerDirectoryError},
    services::CapacityGate,
};
use crate::status::{
    domain::{StatusOutcome, StatusReport},
    ports::GameStatusProbe,
    services::StatusPoller,
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Request payload for provisioning a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateServerRequest {
    /// Requested server (and container) name.
    pub name: String,
    /// Name of the host to place the server on.
    pub host: String,
    /// Server type to run.
    pub server_type: ServerTypeId,
    /// Game mode.
    pub game_type: GameType,
    /// Player names granted operator rights; each must belong to the owner.
    pub operators: Vec<String>,
    /// Port to use instead of the next free one.
    pub pinned_port: Option<u16>,
}

impl CreateServerRequest {
    /// Creates a survival-mode request with no operators.
    #[must_use]
    pub fn new(name: impl Into<String>, host: impl Into<String>, server_type: ServerTypeId) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            server_type,
            game_type: GameType::default(),
            operators: Vec::new(),
            pinned_port: None,
        }
    }

    /// Sets the game mode.
    #[must_use]
    pub const fn with_game_type(mut self, game_type: GameType) -> Self {
        self.game_type = game_type;
        self
    }

    /// Sets the operator list.
    #[must_use]
    pub fn with_operators<I, S>(mut self, operators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.operators = operators.into_iter().map(Into::into).collect();
        self
    }

    /// Pins the server to a specific port.
    #[must_use]
    pub const fn with_pinned_port(mut self, port: u16) -> Self {
        self.pinned_port = Some(port);
        self
    }
}

/// Live status plus, for the owner, recent logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerDetail {
    /// The server record.
    pub server: Server,
    /// Result of the status query.
    pub status: StatusOutcome,
    /// Trailing log lines; empty unless the requester owns the server.
    pub logs: Vec<String>,
}

/// Service-level errors for server orchestration.
#[derive(Debug, Clone, Error)]
pub enum OrchestratorError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] HostingDomainError),

    /// The owner already holds their permitted number of servers.
    #[error("You are only allowed {limit} servers.")]
    QuotaExceeded {
        /// The owner's server limit.
        limit: u32,
    },

    /// The host is disabled or full.
    #[error("host {0} is not accepting new servers")]
    HostUnavailable(HostName),

    /// The server type is disabled.
    #[error("server type {0} is not available")]
    ServerTypeUnavailable(String),

    /// An operator is not one of the owner's registered players.
    #[error("player {0} is not registered to the requesting owner")]
    UnknownOperator(PlayerName),

    /// The requester may not act on this resource.
    #[error("{requester} is not permitted to {action}")]
    Forbidden {
        /// Identity that made the request.
        requester: Username,
        /// Attempted action.
        action: &'static str,
    },

    /// No owner exists with the given username.
    #[error("owner {0} not found")]
    OwnerNotFound(Username),

    /// No host exists with the given name.
    #[error("host {0} not found")]
    HostNotFound(HostName),

    /// No server exists with the given name.
    #[error("server {0} not found")]
    ServerNotFound(ServerName),

    /// No server type exists with the given identifier.
    #[error("server type {0} not found")]
    ServerTypeNotFound(ServerTypeId),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] HostingRepositoryError),

    /// Owner lookup failed.
    #[error(transparent)]
    Owners(#[from] OwnerDirectoryError),

    /// Container operation failed.
    #[error(transparent)]
    Container(#[from] ContainerLifecycleError),
}

impl OrchestratorError {
    /// Returns whether repeating the request may succeed, as when a racing
    /// creation claimed the same port first.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Repository(err) => err.is_retryable(),
            _ => false,
        }
    }
}

/// Result type for orchestration operations.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// Ties quota checks, port allocation, container lifecycle, and status
/// polling together.
#[derive(Clone)]
pub struct ServerOrchestrator<R, D, T, P, C>
where
    R: HostingRepository,
    D: OwnerDirectory,
    T: ContainerRuntime,
    P: GameStatusProbe,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    owners: Arc<D>,
    containers: ContainerLifecycleClient<T>,
    poller: StatusPoller<P>,
    gate: CapacityGate<R>,
    clock: Arc<C>,
}

impl<R, D, T, P, C> ServerOrchestrator<R, D, T, P, C>
where
    R: HostingRepository,
    D: OwnerDirectory,
    T: ContainerRuntime,
    P: GameStatusProbe,
    C: Clock + Send + Sync,
{
    /// Creates an orchestrator.
    #[must_use]
    pub fn new(
        repository: Arc<R>,
        owners: Arc<D>,
        containers: ContainerLifecycleClient<T>,
        poller: StatusPoller<P>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            gate: CapacityGate::new(Arc::clone(&repository)),
            repository,
            owners,
            containers,
            poller,
            clock,
        }
    }

    async fn find_owner_or_error(&self, username: &Username) -> OrchestratorResult<Owner> {
        self.owners
            .find_owner(username)
            .await?
            .ok_or_else(|| OrchestratorError::OwnerNotFound(username.clone()))
    }

    async fn find_server_or_error(&self, name: &str) -> OrchestratorResult<Server> {
        let server_name = ServerName::new(name)?;
        let found = self.repository.find_server(&server_name).await?;
        found.ok_or(OrchestratorError::ServerNotFound(server_name))
    }

    async fn find_server_type_or_error(&self, id: ServerTypeId) -> OrchestratorResult<ServerType> {
        self.repository
            .find_server_type(id)
            .await?
            .ok_or(OrchestratorError::ServerTypeNotFound(id))
    }

    fn ensure_owner(
        server: &Server,
        requester: &Username,
        action: &'static str,
    ) -> OrchestratorResult<()> {
        if server.is_owned_by(requester) {
            return Ok(());
        }
        Err(OrchestratorError::Forbidden {
            requester: requester.clone(),
            action,
        })
    }

    /// Provisions a server for `requester` and starts its container.
    ///
    /// The record is persisted before the container is launched. When the
    /// launch fails the record stays in the `created` state and the error is
    /// returned for the caller to reconcile.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::QuotaExceeded`] when the owner is at
    /// their limit, [`OrchestratorError::HostUnavailable`] or
    /// [`OrchestratorError::ServerTypeUnavailable`] for choices that are not
    /// on offer, [`OrchestratorError::UnknownOperator`] for operators the
    /// owner has not registered, allocation errors such as
    /// [`HostingDomainError::CapacityExhausted`] via the repository, and
    /// container errors when the launch fails.
    pub async fn create_server(
        &self,
        requester: &Username,
        request: CreateServerRequest,
    ) -> OrchestratorResult<Server> {
        let owner = self.find_owner_or_error(requester).await?;
        if !self.gate.can_user_create(&owner).await? {
            return Err(OrchestratorError::QuotaExceeded {
                limit: owner.server_limit(),
            });
        }

        let server_name = ServerName::new(request.name)?;
        let host_name = HostName::new(request.host)?;
        let host = self
            .repository
            .find_host(&host_name)
            .await?
            .ok_or_else(|| OrchestratorError::HostNotFound(host_name.clone()))?;
        if !self.gate.can_accept_server(&host).await? {
            return Err(OrchestratorError::HostUnavailable(host_name));
        }

        let server_type = self.find_server_type_or_error(request.server_type).await?;
        if !server_type.is_enabled() {
            return Err(OrchestratorError::ServerTypeUnavailable(
                server_type.to_string(),
            ));
        }

        let operators = validate_operators(&owner, request.operators)?;
        let mut draft = ServerDraft::new(
            server_name,
            requester.clone(),
            host_name,
            server_type.id(),
            &*self.clock,
        )
        .with_game_type(request.game_type)
        .with_operators(operators);
        if let Some(port) = request.pinned_port {
            draft = draft.with_pinned_port(port);
        }

        let mut server = self.repository.allocate_and_store(draft).await?;
        info!(
            server = %server.name(),
            owner = %requester,
            host = %server.host(),
            port = server.port(),
            "server provisioned"
        );

        if let Err(error) = self.containers.start(&server, &server_type).await {
            warn!(server = %server.name(), %error, "container start failed; record kept");
            return Err(error.into());
        }
        server.mark_running(&*self.clock)?;
        self.repository.update_server(&server).await?;
        Ok(server)
    }

    /// Restarts the requester's server.
    ///
    /// Runtime failures are reported in the returned [`OperationResult`]
    /// rather than as errors, and the lifecycle state reverts. The
    /// transient restarting state is never stored: the record is written once,
    /// after the runtime answers, so a cancelled call leaves it untouched.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Forbidden`] for a non-owner (before any
    /// runtime call), [`OrchestratorError::ServerNotFound`] for an unknown
    /// server, and repository errors.
    pub async fn restart_server(
        &self,
        requester: &Username,
        name: &str,
    ) -> OrchestratorResult<OperationResult> {
        let mut server = self.find_server_or_error(name).await?;
        Self::ensure_owner(&server, requester, "restart this server")?;

        let previous = server.begin_restart(&*self.clock)?;
        let outcome = self.containers.restart(&server).await;
        if outcome.ok {
            server.mark_running(&*self.clock)?;
        } else {
            server.abort_restart(previous, &*self.clock)?;
        }
        self.repository.update_server(&server).await?;
        Ok(outcome)
    }

    /// Removes the requester's server container, then its record.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Forbidden`] for a non-owner (before any
    /// runtime call), [`OrchestratorError::ServerNotFound`] for an unknown
    /// server, and [`OrchestratorError::Container`] when the container
    /// cannot be removed; the record is then left intact.
    pub async fn delete_server(&self, requester: &Username, name: &str) -> OrchestratorResult<()> {
        let server = self.find_server_or_error(name).await?;
        Self::ensure_owner(&server, requester, "delete this server")?;
        self.remove_server(&server).await
    }

    /// Deletes every server owned by `username`, container first, stopping
    /// at the first failure. Returns how many servers were removed.
    ///
    /// # Errors
    ///
    /// Returns the first container or repository error; servers processed
    /// before it stay deleted and the rest stay intact.
    pub async fn delete_owner_servers(&self, username: &Username) -> OrchestratorResult<usize> {
        let servers = self.repository.list_servers_by_owner(username).await?;
        let mut removed = 0_usize;
        for server in &servers {
            self.remove_server(server).await?;
            removed = removed.saturating_add(1);
        }
        info!(owner = %username, removed, "owner servers removed");
        Ok(removed)
    }

    async fn remove_server(&self, server: &Server) -> OrchestratorResult<()> {
        if let Err(error) = self.containers.delete(server).await {
            warn!(server = %server.name(), %error, "container removal failed; record kept");
            return Err(error.into());
        }
        self.repository.delete_server(server.id()).await?;
        info!(server = %server.name(), host = %server.host(), "server deleted");
        Ok(())
    }

    /// Enabled hosts below their server limit.
    ///
    /// # Errors
    ///
    /// Returns repository errors.
    pub async fn available_hosts(&self) -> OrchestratorResult<Vec<Host>> {
        let hosts = self.repository.list_hosts().await?;
        let mut available = Vec::with_capacity(hosts.len());
        for host in hosts {
            if self.gate.can_accept_server(&host).await? {
                available.push(host);
            }
        }
        Ok(available)
    }

    /// Enabled server types ordered by name.
    ///
    /// # Errors
    ///
    /// Returns repository errors.
    pub async fn available_server_types(&self) -> OrchestratorResult<Vec<ServerType>> {
        let types = self.repository.list_server_types().await?;
        Ok(types.into_iter().filter(ServerType::is_enabled).collect())
    }

    /// Player names `owner` may grant operator rights to.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::OwnerNotFound`] for an unknown owner.
    pub async fn operator_candidates(&self, owner: &Username) -> OrchestratorResult<Vec<PlayerName>> {
        let found = self.find_owner_or_error(owner).await?;
        Ok(found.players().iter().cloned().collect())
    }

    /// Status of every server.
    ///
    /// # Errors
    ///
    /// Returns repository errors; per-server query failures are inline.
    pub async fn status_overview(&self) -> OrchestratorResult<StatusReport<Server>> {
        let servers = self.repository.list_servers().await?;
        Ok(self.poller.poll_status(servers).await)
    }

    /// Status of `username`'s servers, visible only to that user.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::OwnerNotFound`] for an unknown user and
    /// [`OrchestratorError::Forbidden`] when `requester` is someone else.
    pub async fn owner_status(
        &self,
        requester: &Username,
        username: &Username,
    ) -> OrchestratorResult<StatusReport<Server>> {
        let owner = self.find_owner_or_error(username).await?;
        if !owner.is(requester) {
            return Err(OrchestratorError::Forbidden {
                requester: requester.clone(),
                action: "view this user's servers",
            });
        }
        let servers = self.repository.list_servers_by_owner(username).await?;
        Ok(self.poller.poll_status(servers).await)
    }

    /// Status of one server, plus logs when `requester` owns it.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::ServerNotFound`] for an unknown server.
    pub async fn server_detail(
        &self,
        requester: Option<&Username>,
        name: &str,
    ) -> OrchestratorResult<ServerDetail> {
        let server = self.find_server_or_error(name).await?;
        let report = self.poller.poll_status(vec![server.clone()]).await;
        let status = report.entries.into_iter().next().map_or_else(
            || StatusOutcome::unreachable("no status returned"),
            |entry| entry.outcome,
        );
        let logs = match requester {
            Some(user) if server.is_owned_by(user) => self.containers.get_logs(&server).await,
            _ => Vec::new(),
        };
        Ok(ServerDetail {
            server,
            status,
            logs,
        })
    }
}

fn validate_operators(owner: &Owner, requested: Vec<String>) -> OrchestratorResult<Vec<PlayerName>> {
    requested
        .into_iter()
        .map(|raw| {
            let player = PlayerName::new(raw)?;
            if owner.players().contains(&player) {
                Ok(player)
            } else {
                Err(OrchestratorError::UnknownOperator(player))
            }
        })
        .collect()
}
