//! Provisioned server aggregate root and its creation draft.

use super::{
    GameType, HostName, HostingDomainError, ParseServerLifecycleStateError, PlayerName, ServerId,
    ServerName, ServerTypeId, Username,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Lifecycle state of a provisioned server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerLifecycleState {
    /// The record exists; the container has not been confirmed started.
    Created,
    /// The container was started successfully.
    Running,
    /// A restart is in flight.
    Restarting,
}

impl ServerLifecycleState {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Restarting => "restarting",
        }
    }

    /// Returns whether transition to `target` is allowed.
    ///
    /// `Restarting -> Created` only happens when a restart of a server whose
    /// container was never confirmed fails and the prior state is restored.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Created, Self::Running | Self::Restarting)
                | (Self::Running, Self::Restarting)
                | (Self::Restarting, Self::Running | Self::Created)
        )
    }
}

impl fmt::Display for ServerLifecycleState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ServerLifecycleState {
    type Error = ParseServerLifecycleStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "created" => Ok(Self::Created),
            "running" => Ok(Self::Running),
            "restarting" => Ok(Self::Restarting),
            _ => Err(ParseServerLifecycleStateError(value.to_owned())),
        }
    }
}

/// A validated server request that has not been assigned a port yet.
///
/// Drafts become [`Server`] records through [`Server::provision`], which is
/// the only place a port is ever attached to a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerDraft {
    name: ServerName,
    owner: Username,
    host: HostName,
    server_type: ServerTypeId,
    game_type: GameType,
    operators: BTreeSet<PlayerName>,
    pinned_port: Option<u16>,
    requested_at: DateTime<Utc>,
}

impl ServerDraft {
    /// Creates a survival-mode draft with no operators.
    #[must_use]
    pub fn new(
        name: ServerName,
        owner: Username,
        host: HostName,
        server_type: ServerTypeId,
        clock: &impl Clock,
    ) -> Self {
        Self {
            name,
            owner,
            host,
            server_type,
            game_type: GameType::default(),
            operators: BTreeSet::new(),
            pinned_port: None,
            requested_at: clock.utc(),
        }
    }

    /// Sets the game mode.
    #[must_use]
    pub const fn with_game_type(mut self, game_type: GameType) -> Self {
        self.game_type = game_type;
        self
    }

    /// Replaces the operator allow-list.
    #[must_use]
    pub fn with_operators(mut self, operators: impl IntoIterator<Item = PlayerName>) -> Self {
        self.operators = operators.into_iter().collect();
        self
    }

    /// Requests a specific port instead of the next free one.
    #[must_use]
    pub const fn with_pinned_port(mut self, port: u16) -> Self {
        self.pinned_port = Some(port);
        self
    }

    /// Returns the requested server name.
    #[must_use]
    pub const fn name(&self) -> &ServerName {
        &self.name
    }

    /// Returns the owning account.
    #[must_use]
    pub const fn owner(&self) -> &Username {
        &self.owner
    }

    /// Returns the target host.
    #[must_use]
    pub const fn host(&self) -> &HostName {
        &self.host
    }

    /// Returns the requested server type.
    #[must_use]
    pub const fn server_type(&self) -> ServerTypeId {
        self.server_type
    }

    /// Returns the pinned port, if any.
    #[must_use]
    pub const fn pinned_port(&self) -> Option<u16> {
        self.pinned_port
    }
}

/// Provisioned server aggregate root.
///
/// A server is bound to exactly one `(host, port)` pair for its whole life;
/// there is no way to change the port after [`Server::provision`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    id: ServerId,
    name: ServerName,
    owner: Username,
    host: HostName,
    port: u16,
    server_type: ServerTypeId,
    game_type: GameType,
    operators: BTreeSet<PlayerName>,
    lifecycle_state: ServerLifecycleState,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing persisted server state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedServerData {
    /// Persisted server identifier.
    pub id: ServerId,
    /// Persisted server name.
    pub name: ServerName,
    /// Persisted owner.
    pub owner: Username,
    /// Persisted host.
    pub host: HostName,
    /// Persisted port.
    pub port: u16,
    /// Persisted server type.
    pub server_type: ServerTypeId,
    /// Persisted game mode.
    pub game_type: GameType,
    /// Persisted operator allow-list.
    pub operators: BTreeSet<PlayerName>,
    /// Persisted lifecycle state.
    pub lifecycle_state: ServerLifecycleState,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Server {
    /// Binds a draft to its allocated port, producing a `created` server.
    #[must_use]
    pub fn provision(draft: ServerDraft, port: u16) -> Self {
        Self {
            id: ServerId::new(),
            name: draft.name,
            owner: draft.owner,
            host: draft.host,
            port,
            server_type: draft.server_type,
            game_type: draft.game_type,
            operators: draft.operators,
            lifecycle_state: ServerLifecycleState::Created,
            created_at: draft.requested_at,
            updated_at: draft.requested_at,
        }
    }

    /// Reconstructs a server from persistence.
    #[must_use]
    pub fn from_persisted(data: PersistedServerData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            owner: data.owner,
            host: data.host,
            port: data.port,
            server_type: data.server_type,
            game_type: data.game_type,
            operators: data.operators,
            lifecycle_state: data.lifecycle_state,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the server identifier.
    #[must_use]
    pub const fn id(&self) -> ServerId {
        self.id
    }

    /// Returns the server name, which is also the container name.
    #[must_use]
    pub const fn name(&self) -> &ServerName {
        &self.name
    }

    /// Returns the owning account.
    #[must_use]
    pub const fn owner(&self) -> &Username {
        &self.owner
    }

    /// Returns the host the server lives on.
    #[must_use]
    pub const fn host(&self) -> &HostName {
        &self.host
    }

    /// Returns the assigned port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the server type identifier.
    #[must_use]
    pub const fn server_type(&self) -> ServerTypeId {
        self.server_type
    }

    /// Returns the game mode.
    #[must_use]
    pub const fn game_type(&self) -> GameType {
        self.game_type
    }

    /// Returns the operator allow-list.
    #[must_use]
    pub const fn operators(&self) -> &BTreeSet<PlayerName> {
        &self.operators
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn lifecycle_state(&self) -> ServerLifecycleState {
        self.lifecycle_state
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the `host:port` socket players connect to.
    #[must_use]
    pub fn socket(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns whether `requester` owns this server.
    #[must_use]
    pub fn is_owned_by(&self, requester: &Username) -> bool {
        self.owner == *requester
    }

    /// Marks the container as running.
    ///
    /// # Errors
    ///
    /// Returns [`HostingDomainError::InvalidLifecycleTransition`] when the
    /// server is already running.
    pub fn mark_running(&mut self, clock: &impl Clock) -> Result<(), HostingDomainError> {
        self.transition_to(ServerLifecycleState::Running)?;
        self.touch(clock);
        Ok(())
    }

    /// Enters the restarting state and returns the state to restore should
    /// the restart fail.
    ///
    /// # Errors
    ///
    /// Returns [`HostingDomainError::InvalidLifecycleTransition`] when a
    /// restart is already in flight.
    pub fn begin_restart(
        &mut self,
        clock: &impl Clock,
    ) -> Result<ServerLifecycleState, HostingDomainError> {
        let previous = self.lifecycle_state;
        self.transition_to(ServerLifecycleState::Restarting)?;
        self.touch(clock);
        Ok(previous)
    }

    /// Leaves the restarting state without a confirmed restart.
    ///
    /// # Errors
    ///
    /// Returns [`HostingDomainError::InvalidLifecycleTransition`] when no
    /// restart is in flight or `previous` is not a restorable state.
    pub fn abort_restart(
        &mut self,
        previous: ServerLifecycleState,
        clock: &impl Clock,
    ) -> Result<(), HostingDomainError> {
        self.transition_to(previous)?;
        self.touch(clock);
        Ok(())
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }

    fn transition_to(
        &mut self,
        target_state: ServerLifecycleState,
    ) -> Result<(), HostingDomainError> {
        if !self.lifecycle_state.can_transition_to(target_state) {
            return Err(HostingDomainError::InvalidLifecycleTransition {
                from: self.lifecycle_state.as_str().to_owned(),
                to: target_state.as_str().to_owned(),
            });
        }

        self.lifecycle_state = target_state;
        Ok(())
    }
}

impl fmt::Display for Server {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} ({}:{})", self.name, self.host, self.port)
    }
}
