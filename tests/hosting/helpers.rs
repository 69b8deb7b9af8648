//! Shared fixtures for hosting integration tests.

use std::sync::Arc;
use std::time::Duration;

use eyre::Result;
use mockable::DefaultClock;
use wrangler::config::WranglerConfig;
use wrangler::container::{ports::ContainerRuntime, services::ContainerLifecycleClient};
use wrangler::hosting::{
    adapters::memory::{InMemoryHostingRepository, InMemoryOwnerDirectory},
    domain::{HostName, Owner, PlayerName, Server, ServerDraft, ServerName, ServerType, ServerTypeId, Username},
    ports::HostingRepository,
    services::{CreateServerRequest, ServerOrchestrator},
};
use wrangler::status::{adapters::InMemoryStatusProbe, services::StatusPoller};

pub const HOST: &str = "minecraft-00.cvn";
pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";

pub type TestOrchestrator<T> = ServerOrchestrator<
    InMemoryHostingRepository,
    InMemoryOwnerDirectory,
    T,
    InMemoryStatusProbe,
    DefaultClock,
>;

pub struct World<T: ContainerRuntime> {
    pub repository: Arc<InMemoryHostingRepository>,
    pub probe: Arc<InMemoryStatusProbe>,
    pub orchestrator: TestOrchestrator<T>,
    pub host: HostName,
    pub vanilla: ServerTypeId,
}

impl<T: ContainerRuntime> World<T> {
    pub fn request(&self, name: &str) -> CreateServerRequest {
        CreateServerRequest::new(name, self.host.as_str(), self.vanilla)
    }

    /// Stores a server record without touching the container runtime.
    pub async fn seed_server(&self, name: &str, owner: &str) -> Result<Server> {
        let draft = ServerDraft::new(
            ServerName::new(name)?,
            username(owner)?,
            self.host.clone(),
            self.vanilla,
            &DefaultClock,
        );
        Ok(self.repository.allocate_and_store(draft).await?)
    }
}

pub fn username(name: &str) -> Result<Username> {
    Ok(Username::new(name)?)
}

/// Builds a world with one default host, one server type, `alice` (limit 10)
/// and `bob` (default quota), driving containers through `runtime`.
pub async fn world<T: ContainerRuntime>(runtime: Arc<T>) -> Result<World<T>> {
    let config = WranglerConfig::default();
    let repository = Arc::new(InMemoryHostingRepository::new());
    let owners = Arc::new(InMemoryOwnerDirectory::new());
    let probe = Arc::new(InMemoryStatusProbe::new());

    let host = HostName::new(HOST)?;
    repository.store_host(&config.quotas.host(host.clone())?).await?;
    let vanilla = ServerType::new("Vanilla", "1.20.4", "itzg/minecraft-server")?;
    repository.store_server_type(&vanilla).await?;

    owners.insert(Owner::new(username(ALICE)?, 10).with_players([PlayerName::new("Alice_MC")?]))?;
    owners.insert(config.quotas.owner(username(BOB)?))?;

    let orchestrator = ServerOrchestrator::new(
        Arc::clone(&repository),
        owners,
        ContainerLifecycleClient::new(
            runtime,
            config.runtime.launch_settings(),
            config.runtime.log_tail,
        ),
        StatusPoller::new(
            Arc::clone(&probe),
            Duration::from_millis(500),
            config.status.max_concurrency,
        ),
        Arc::new(DefaultClock),
    );

    Ok(World {
        repository,
        probe,
        orchestrator,
        host,
        vanilla: vanilla.id(),
    })
}
