//! Port assignment through the orchestrator.

use std::collections::BTreeSet;
use std::sync::Arc;

use eyre::{Result, ensure};
use rstest::rstest;
use wrangler::container::adapters::InMemoryContainerRuntime;
use wrangler::hosting::{
    domain::HostingDomainError,
    ports::{HostingRepository, HostingRepositoryError},
    services::OrchestratorError,
};

use super::helpers::{ALICE, BOB, username, world};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pinned_port_leaves_gap_for_next_allocation() -> Result<()> {
    let world = world(Arc::new(InMemoryContainerRuntime::new())).await?;
    let alice = username(ALICE)?;

    let mut ports = Vec::new();
    for (index, name) in ["mc-1", "mc-2", "mc-3", "mc-4"].into_iter().enumerate() {
        let request = if index == 2 {
            world.request(name).with_pinned_port(25570)
        } else {
            world.request(name)
        };
        let server = world.orchestrator.create_server(&alice, request).await?;
        ports.push(server.port());
    }

    ensure!(
        ports == vec![25565, 25566, 25570, 25567],
        "unexpected ports {ports:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pinned_port_already_taken_is_rejected() -> Result<()> {
    let world = world(Arc::new(InMemoryContainerRuntime::new())).await?;
    let alice = username(ALICE)?;
    world
        .orchestrator
        .create_server(&alice, world.request("mc-1"))
        .await?;

    let result = world
        .orchestrator
        .create_server(&alice, world.request("mc-2").with_pinned_port(25565))
        .await;

    ensure!(
        matches!(
            result,
            Err(OrchestratorError::Repository(HostingRepositoryError::Allocation(
                HostingDomainError::PortInUse { .. }
            )))
        ),
        "expected PortInUse, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_server_names_are_rejected() -> Result<()> {
    let world = world(Arc::new(InMemoryContainerRuntime::new())).await?;
    world
        .orchestrator
        .create_server(&username(ALICE)?, world.request("mc-1"))
        .await?;

    let result = world
        .orchestrator
        .create_server(&username(BOB)?, world.request("mc-1"))
        .await;

    ensure!(
        matches!(
            result,
            Err(OrchestratorError::Repository(
                HostingRepositoryError::DuplicateServerName(_)
            ))
        ),
        "expected DuplicateServerName, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_creations_never_share_a_port() -> Result<()> {
    let world = Arc::new(world(Arc::new(InMemoryContainerRuntime::new())).await?);
    let alice = username(ALICE)?;

    let handles: Vec<_> = (0..7)
        .map(|index| {
            let shared = Arc::clone(&world);
            let owner = alice.clone();
            tokio::spawn(async move {
                shared
                    .orchestrator
                    .create_server(&owner, shared.request(&format!("mc-{index}")))
                    .await
            })
        })
        .collect();

    let mut ports = BTreeSet::new();
    for handle in handles {
        let server = handle.await??;
        ensure!(ports.insert(server.port()), "port {} reused", server.port());
    }
    ensure!(ports.len() == 7, "expected seven servers");
    ensure!(
        world.repository.count_servers_on_host(&world.host).await? == 7,
        "repository count mismatch"
    );
    Ok(())
}
