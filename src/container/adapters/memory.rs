//! In-memory container runtime for lifecycle tests and local runs.

use crate::container::{
    domain::ContainerSpec,
    ports::{ContainerRuntime, ContainerRuntimeError, ContainerRuntimeResult},
};
use crate::hosting::domain::{HostName, ServerName};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Container runtime that records launches instead of contacting hosts.
///
/// Hosts can be marked unreachable to exercise partition handling; every
/// operation against such a host fails with
/// [`ContainerRuntimeError::Unavailable`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryContainerRuntime {
    state: Arc<RwLock<InMemoryRuntimeState>>,
}

#[derive(Debug, Default)]
struct InMemoryRuntimeState {
    containers: HashMap<(HostName, String), RecordedContainer>,
    unreachable_hosts: HashSet<HostName>,
}

#[derive(Debug, Clone)]
struct RecordedContainer {
    spec: ContainerSpec,
    restarts: u32,
    logs: Vec<String>,
}

impl InMemoryContainerRuntime {
    /// Creates a runtime with no containers and every host reachable.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `host` as unreachable or reachable again.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn set_unreachable(&self, host: &HostName, unreachable: bool) -> ContainerRuntimeResult<()> {
        let mut state = self.write(host)?;
        if unreachable {
            state.unreachable_hosts.insert(host.clone());
        } else {
            state.unreachable_hosts.remove(host);
        }
        Ok(())
    }

    /// Appends a log line to a running container.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerRuntimeError::NotFound`] when no such container
    /// exists.
    pub fn append_log(
        &self,
        host: &HostName,
        container: &ServerName,
        line: impl Into<String>,
    ) -> ContainerRuntimeResult<()> {
        let mut state = self.write(host)?;
        let recorded = state
            .containers
            .get_mut(&key(host, container.as_str()))
            .ok_or_else(|| not_found(host, container.as_str()))?;
        recorded.logs.push(line.into());
        Ok(())
    }

    /// Returns the launch spec of a recorded container.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn container(
        &self,
        host: &HostName,
        container: &ServerName,
    ) -> ContainerRuntimeResult<Option<ContainerSpec>> {
        let state = self.read(host)?;
        Ok(state
            .containers
            .get(&key(host, container.as_str()))
            .map(|recorded| recorded.spec.clone()))
    }

    /// Returns how many times a container has been restarted.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn restart_count(
        &self,
        host: &HostName,
        container: &ServerName,
    ) -> ContainerRuntimeResult<u32> {
        let state = self.read(host)?;
        Ok(state
            .containers
            .get(&key(host, container.as_str()))
            .map_or(0, |recorded| recorded.restarts))
    }

    fn read(&self, host: &HostName) -> ContainerRuntimeResult<RwLockReadGuard<'_, InMemoryRuntimeState>> {
        self.state.read().map_err(|err| {
            ContainerRuntimeError::unavailable(host, std::io::Error::other(err.to_string()))
        })
    }

    fn write(
        &self,
        host: &HostName,
    ) -> ContainerRuntimeResult<RwLockWriteGuard<'_, InMemoryRuntimeState>> {
        self.state.write().map_err(|err| {
            ContainerRuntimeError::unavailable(host, std::io::Error::other(err.to_string()))
        })
    }

    fn reachable_write(
        &self,
        host: &HostName,
    ) -> ContainerRuntimeResult<RwLockWriteGuard<'_, InMemoryRuntimeState>> {
        let state = self.write(host)?;
        if state.unreachable_hosts.contains(host) {
            return Err(ContainerRuntimeError::unavailable(
                host,
                std::io::Error::new(ErrorKind::ConnectionRefused, "connection refused"),
            ));
        }
        Ok(state)
    }
}

#[async_trait]
impl ContainerRuntime for InMemoryContainerRuntime {
    async fn run(&self, host: &HostName, spec: &ContainerSpec) -> ContainerRuntimeResult<()> {
        let mut state = self.reachable_write(host)?;
        let container_key = key(host, spec.name());
        if state.containers.contains_key(&container_key) {
            return Err(ContainerRuntimeError::Rejected {
                host: host.clone(),
                status: 409,
                message: format!("container name {} is already in use", spec.name()),
            });
        }
        state.containers.insert(
            container_key,
            RecordedContainer {
                spec: spec.clone(),
                restarts: 0,
                logs: Vec::new(),
            },
        );
        Ok(())
    }

    async fn restart(
        &self,
        host: &HostName,
        container: &ServerName,
    ) -> ContainerRuntimeResult<()> {
        let mut state = self.reachable_write(host)?;
        let recorded = state
            .containers
            .get_mut(&key(host, container.as_str()))
            .ok_or_else(|| not_found(host, container.as_str()))?;
        recorded.restarts = recorded.restarts.saturating_add(1);
        Ok(())
    }

    async fn remove(&self, host: &HostName, container: &ServerName) -> ContainerRuntimeResult<()> {
        let mut state = self.reachable_write(host)?;
        state
            .containers
            .remove(&key(host, container.as_str()))
            .map(|_| ())
            .ok_or_else(|| not_found(host, container.as_str()))
    }

    async fn logs(
        &self,
        host: &HostName,
        container: &ServerName,
        tail: usize,
    ) -> ContainerRuntimeResult<Vec<String>> {
        let state = self.reachable_write(host)?;
        let recorded = state
            .containers
            .get(&key(host, container.as_str()))
            .ok_or_else(|| not_found(host, container.as_str()))?;
        let skip = recorded.logs.len().saturating_sub(tail);
        Ok(recorded.logs.iter().skip(skip).cloned().collect())
    }
}

fn key(host: &HostName, container: &str) -> (HostName, String) {
    (host.clone(), container.to_owned())
}

fn not_found(host: &HostName, container: &str) -> ContainerRuntimeError {
    ContainerRuntimeError::NotFound {
        host: host.clone(),
        container: container.to_owned(),
    }
}
