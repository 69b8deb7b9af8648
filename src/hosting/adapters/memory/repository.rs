//! In-memory repository for hosting records.

use crate::hosting::{
    domain::{
        Host, HostName, Server, ServerDraft, ServerId, ServerName, ServerType, ServerTypeId,
        Username, resolve_port,
    },
    ports::{HostingRepository, HostingRepositoryError, HostingRepositoryResult},
};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe in-memory hosting repository.
///
/// Allocation and insertion run under a single write lock, which serialises
/// them across every host at once.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHostingRepository {
    state: Arc<RwLock<InMemoryHostingState>>,
}

#[derive(Debug, Default)]
struct InMemoryHostingState {
    hosts: BTreeMap<HostName, Host>,
    server_types: HashMap<ServerTypeId, ServerType>,
    servers: HashMap<ServerId, Server>,
    name_index: HashMap<ServerName, ServerId>,
}

impl InMemoryHostingState {
    fn ports_on_host(&self, host: &HostName) -> BTreeSet<u16> {
        self.servers
            .values()
            .filter(|server| server.host() == host)
            .map(Server::port)
            .collect()
    }

    fn sorted_servers(&self, filter: impl Fn(&Server) -> bool) -> Vec<Server> {
        let mut servers: Vec<&Server> = self
            .servers
            .values()
            .filter(|server| filter(server))
            .collect();
        servers.sort_by(|left, right| {
            left.created_at()
                .cmp(&right.created_at())
                .then_with(|| left.name().cmp(right.name()))
        });
        servers.into_iter().cloned().collect()
    }
}

impl InMemoryHostingRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> HostingRepositoryResult<RwLockReadGuard<'_, InMemoryHostingState>> {
        self.state.read().map_err(|err| {
            HostingRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> HostingRepositoryResult<RwLockWriteGuard<'_, InMemoryHostingState>> {
        self.state.write().map_err(|err| {
            HostingRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl HostingRepository for InMemoryHostingRepository {
    async fn store_host(&self, host: &Host) -> HostingRepositoryResult<()> {
        let mut state = self.write()?;
        state.hosts.insert(host.name().clone(), host.clone());
        Ok(())
    }

    async fn find_host(&self, name: &HostName) -> HostingRepositoryResult<Option<Host>> {
        Ok(self.read()?.hosts.get(name).cloned())
    }

    async fn list_hosts(&self) -> HostingRepositoryResult<Vec<Host>> {
        Ok(self.read()?.hosts.values().cloned().collect())
    }

    async fn store_server_type(&self, server_type: &ServerType) -> HostingRepositoryResult<()> {
        let mut state = self.write()?;
        let duplicate = state.server_types.values().any(|existing| {
            existing.name() == server_type.name() && existing.version() == server_type.version()
        });
        if duplicate {
            return Err(HostingRepositoryError::DuplicateServerType {
                name: server_type.name().to_owned(),
                version: server_type.version().to_owned(),
            });
        }
        state
            .server_types
            .insert(server_type.id(), server_type.clone());
        Ok(())
    }

    async fn find_server_type(
        &self,
        id: ServerTypeId,
    ) -> HostingRepositoryResult<Option<ServerType>> {
        Ok(self.read()?.server_types.get(&id).cloned())
    }

    async fn find_server_type_by_name(
        &self,
        name: &str,
        version: &str,
    ) -> HostingRepositoryResult<Option<ServerType>> {
        let state = self.read()?;
        Ok(state
            .server_types
            .values()
            .find(|server_type| server_type.name() == name && server_type.version() == version)
            .cloned())
    }

    async fn list_server_types(&self) -> HostingRepositoryResult<Vec<ServerType>> {
        let state = self.read()?;
        let mut server_types: Vec<ServerType> = state.server_types.values().cloned().collect();
        server_types.sort_by(|left, right| {
            left.name()
                .cmp(right.name())
                .then_with(|| left.version().cmp(right.version()))
        });
        Ok(server_types)
    }

    async fn allocate_and_store(&self, draft: ServerDraft) -> HostingRepositoryResult<Server> {
        let mut state = self.write()?;

        let host = state
            .hosts
            .get(draft.host())
            .cloned()
            .ok_or_else(|| HostingRepositoryError::HostNotFound(draft.host().clone()))?;

        if state.name_index.contains_key(draft.name()) {
            return Err(HostingRepositoryError::DuplicateServerName(
                draft.name().clone(),
            ));
        }

        let assigned = state.ports_on_host(host.name());
        let port = resolve_port(&host, draft.pinned_port(), &assigned)
            .map_err(HostingRepositoryError::Allocation)?;

        let server = Server::provision(draft, port);
        state.name_index.insert(server.name().clone(), server.id());
        state.servers.insert(server.id(), server.clone());
        Ok(server)
    }

    async fn update_server(&self, server: &Server) -> HostingRepositoryResult<()> {
        let mut state = self.write()?;
        let stored = state
            .servers
            .get_mut(&server.id())
            .ok_or(HostingRepositoryError::ServerNotFound(server.id()))?;
        *stored = server.clone();
        Ok(())
    }

    async fn find_server(&self, name: &ServerName) -> HostingRepositoryResult<Option<Server>> {
        let state = self.read()?;
        Ok(state
            .name_index
            .get(name)
            .and_then(|id| state.servers.get(id))
            .cloned())
    }

    async fn list_servers(&self) -> HostingRepositoryResult<Vec<Server>> {
        Ok(self.read()?.sorted_servers(|_| true))
    }

    async fn list_servers_by_owner(
        &self,
        owner: &Username,
    ) -> HostingRepositoryResult<Vec<Server>> {
        Ok(self
            .read()?
            .sorted_servers(|server| server.owner() == owner))
    }

    async fn count_servers_on_host(&self, host: &HostName) -> HostingRepositoryResult<usize> {
        let state = self.read()?;
        Ok(state
            .servers
            .values()
            .filter(|server| server.host() == host)
            .count())
    }

    async fn count_servers_by_owner(&self, owner: &Username) -> HostingRepositoryResult<usize> {
        let state = self.read()?;
        Ok(state
            .servers
            .values()
            .filter(|server| server.owner() == owner)
            .count())
    }

    async fn delete_server(&self, id: ServerId) -> HostingRepositoryResult<()> {
        let mut state = self.write()?;
        let removed = state
            .servers
            .remove(&id)
            .ok_or(HostingRepositoryError::ServerNotFound(id))?;
        state.name_index.remove(removed.name());
        Ok(())
    }
}
