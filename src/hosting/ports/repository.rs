//! Repository port for hosts, server types, and provisioned servers.

use crate::hosting::domain::{
    Host, HostName, HostingDomainError, Server, ServerDraft, ServerId, ServerName, ServerType,
    ServerTypeId, Username,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for hosting repository operations.
pub type HostingRepositoryResult<T> = Result<T, HostingRepositoryError>;

/// Persistence contract for the hosting aggregate roots.
#[async_trait]
pub trait HostingRepository: Send + Sync {
    /// Stores a host, replacing any host with the same name.
    async fn store_host(&self, host: &Host) -> HostingRepositoryResult<()>;

    /// Finds a host by name.
    async fn find_host(&self, name: &HostName) -> HostingRepositoryResult<Option<Host>>;

    /// Returns all hosts ordered by name.
    async fn list_hosts(&self) -> HostingRepositoryResult<Vec<Host>>;

    /// Stores a new server type.
    ///
    /// # Errors
    ///
    /// Returns [`HostingRepositoryError::DuplicateServerType`] when the
    /// `(name, version)` pair is already registered.
    async fn store_server_type(&self, server_type: &ServerType) -> HostingRepositoryResult<()>;

    /// Finds a server type by identifier.
    async fn find_server_type(
        &self,
        id: ServerTypeId,
    ) -> HostingRepositoryResult<Option<ServerType>>;

    /// Finds a server type by its unique `(name, version)` pair.
    async fn find_server_type_by_name(
        &self,
        name: &str,
        version: &str,
    ) -> HostingRepositoryResult<Option<ServerType>>;

    /// Returns all server types ordered by name, then version.
    async fn list_server_types(&self) -> HostingRepositoryResult<Vec<ServerType>>;

    /// Assigns a port to `draft` and stores the resulting server.
    ///
    /// The ports already assigned on the draft's host are read and the new
    /// row is written inside one critical section scoped to that host, so
    /// two concurrent calls can never compute the same port.
    ///
    /// # Errors
    ///
    /// Returns [`HostingRepositoryError::HostNotFound`] for an unknown host,
    /// [`HostingRepositoryError::Allocation`] when no usable port exists,
    /// [`HostingRepositoryError::DuplicateServerName`] when the name is
    /// taken, and [`HostingRepositoryError::PortConflict`] when a racing
    /// writer claimed the port first.
    async fn allocate_and_store(&self, draft: ServerDraft) -> HostingRepositoryResult<Server>;

    /// Persists lifecycle changes to an existing server.
    ///
    /// The assigned port is never rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`HostingRepositoryError::ServerNotFound`] when the server
    /// does not exist.
    async fn update_server(&self, server: &Server) -> HostingRepositoryResult<()>;

    /// Finds a server by its unique name.
    async fn find_server(&self, name: &ServerName) -> HostingRepositoryResult<Option<Server>>;

    /// Returns all servers ordered by creation time.
    async fn list_servers(&self) -> HostingRepositoryResult<Vec<Server>>;

    /// Returns the servers owned by `owner` ordered by creation time.
    async fn list_servers_by_owner(&self, owner: &Username)
    -> HostingRepositoryResult<Vec<Server>>;

    /// Counts servers placed on `host`.
    async fn count_servers_on_host(&self, host: &HostName) -> HostingRepositoryResult<usize>;

    /// Counts servers owned by `owner`.
    async fn count_servers_by_owner(&self, owner: &Username) -> HostingRepositoryResult<usize>;

    /// Removes a server record.
    ///
    /// # Errors
    ///
    /// Returns [`HostingRepositoryError::ServerNotFound`] when the server
    /// does not exist.
    async fn delete_server(&self, id: ServerId) -> HostingRepositoryResult<()>;
}

/// Errors returned by hosting repository implementations.
#[derive(Debug, Clone, Error)]
pub enum HostingRepositoryError {
    /// No host with the given name exists.
    #[error("host not found: {0}")]
    HostNotFound(HostName),

    /// A server with the same name already exists.
    #[error("duplicate server name: {0}")]
    DuplicateServerName(ServerName),

    /// A server type with the same name and version already exists.
    #[error("duplicate server type: {name} ({version})")]
    DuplicateServerType {
        /// Server type name.
        name: String,
        /// Server type version.
        version: String,
    },

    /// Another writer claimed the same `(host, port)` pair concurrently.
    #[error("port {port} on host {host} was claimed concurrently")]
    PortConflict {
        /// Host of the conflicting assignment.
        host: HostName,
        /// Conflicting port.
        port: u16,
    },

    /// The port could not be resolved for the draft.
    #[error(transparent)]
    Allocation(HostingDomainError),

    /// The server was not found.
    #[error("server not found: {0}")]
    ServerNotFound(ServerId),

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted hosting data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl HostingRepositoryError {
    /// Wraps persisted-data decoding or validation failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Returns whether repeating the operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::PortConflict { .. })
    }
}
