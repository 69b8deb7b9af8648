//! Host and owner capacity checks.
//!
//! These are advisory pre-checks used to populate choices and reject
//! requests early. Port uniqueness is enforced by the repository's per-host
//! critical section, not here.

use crate::hosting::{
    domain::{Host, Owner, host_accepts_server, owner_may_create},
    ports::{HostingRepository, HostingRepositoryResult},
};
use std::sync::Arc;

/// Compares configured limits against current server counts.
#[derive(Clone)]
pub struct CapacityGate<R>
where
    R: HostingRepository,
{
    repository: Arc<R>,
}

impl<R> CapacityGate<R>
where
    R: HostingRepository,
{
    /// Creates a gate backed by `repository` counts.
    #[must_use]
    pub const fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Returns whether `host` is enabled and below its server limit.
    ///
    /// # Errors
    ///
    /// Returns repository errors from the count query.
    pub async fn can_accept_server(&self, host: &Host) -> HostingRepositoryResult<bool> {
        if !host.is_enabled() {
            return Ok(false);
        }
        let current = self.repository.count_servers_on_host(host.name()).await?;
        Ok(host_accepts_server(host, current))
    }

    /// Returns whether `owner` is below their server limit.
    ///
    /// # Errors
    ///
    /// Returns repository errors from the count query.
    pub async fn can_user_create(&self, owner: &Owner) -> HostingRepositoryResult<bool> {
        let current = self
            .repository
            .count_servers_by_owner(owner.username())
            .await?;
        Ok(owner_may_create(owner, current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hosting::{
        adapters::memory::InMemoryHostingRepository,
        domain::{HostName, PortRange, ServerDraft, ServerName, ServerTypeId, Username},
    };
    use mockable::DefaultClock;
    use rstest::{fixture, rstest};

    #[fixture]
    fn host() -> Host {
        Host::new(
            HostName::new("minecraft-00.cvn").expect("valid host"),
            PortRange::new(25565, 25693).expect("valid range"),
            2,
        )
    }

    async fn provision(repository: &InMemoryHostingRepository, host: &Host, name: &str, owner: &str) {
        let draft = ServerDraft::new(
            ServerName::new(name).expect("valid name"),
            Username::new(owner).expect("valid username"),
            host.name().clone(),
            ServerTypeId::new(),
            &DefaultClock,
        );
        repository
            .allocate_and_store(draft)
            .await
            .expect("allocation should succeed");
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn host_closes_when_its_limit_is_reached(host: Host) {
        let repository = Arc::new(InMemoryHostingRepository::new());
        repository.store_host(&host).await.expect("host stored");
        let gate = CapacityGate::new(Arc::clone(&repository));

        assert!(gate.can_accept_server(&host).await.expect("count"));
        provision(&repository, &host, "mc-00", "alice").await;
        assert!(gate.can_accept_server(&host).await.expect("count"));
        provision(&repository, &host, "mc-01", "bob").await;
        assert!(!gate.can_accept_server(&host).await.expect("count"));
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn disabled_hosts_never_accept(host: Host) {
        let repository = Arc::new(InMemoryHostingRepository::new());
        let disabled = host.with_enabled(false);
        repository.store_host(&disabled).await.expect("host stored");
        let gate = CapacityGate::new(repository);

        assert!(!gate.can_accept_server(&disabled).await.expect("count"));
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn owners_are_limited_by_their_own_quota(host: Host) {
        let repository = Arc::new(InMemoryHostingRepository::new());
        repository.store_host(&host).await.expect("host stored");
        let gate = CapacityGate::new(Arc::clone(&repository));
        let owner = Owner::new(Username::new("alice").expect("valid username"), 1);

        assert!(gate.can_user_create(&owner).await.expect("count"));
        provision(&repository, &host, "mc-00", "alice").await;
        assert!(!gate.can_user_create(&owner).await.expect("count"));
    }
}
