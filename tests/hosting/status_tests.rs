//! Status polling over provisioned servers.

use std::sync::Arc;

use eyre::{Result, ensure};
use rstest::rstest;
use wrangler::container::adapters::InMemoryContainerRuntime;
use wrangler::hosting::services::OrchestratorError;
use wrangler::status::domain::{ServerAddress, ServerStatus};

use super::helpers::{ALICE, BOB, HOST, username, world};

fn status(players: u32, capacity: u32) -> ServerStatus {
    ServerStatus {
        version: "1.20.4".to_owned(),
        online_players: players,
        max_players: capacity,
        motd: "A Minecraft Server".to_owned(),
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn mixed_poll_keeps_order_and_counts_only_reachable_servers() -> Result<()> {
    let world = world(Arc::new(InMemoryContainerRuntime::new())).await?;
    let alice = username(ALICE)?;
    let names = ["mc-1", "mc-2", "mc-3", "mc-4", "mc-5"];
    for name in names {
        world
            .orchestrator
            .create_server(&alice, world.request(name))
            .await?;
    }
    // mc-1, mc-3 and mc-5 answer; mc-2 and mc-4 do not.
    world
        .probe
        .set_online(ServerAddress::new(HOST, 25565), status(3, 20))?;
    world
        .probe
        .set_online(ServerAddress::new(HOST, 25567), status(0, 10))?;
    world
        .probe
        .set_online(ServerAddress::new(HOST, 25569), status(5, 8))?;

    let report = world.orchestrator.status_overview().await?;

    let polled: Vec<&str> = report
        .entries
        .iter()
        .map(|entry| entry.target.name().as_str())
        .collect();
    ensure!(polled == names, "entries out of order: {polled:?}");
    ensure!(report.total_players == 8, "players {}", report.total_players);
    ensure!(report.total_capacity == 38, "capacity {}", report.total_capacity);
    let reachable = [true, false, true, false, true];
    for (entry, expect_online) in report.entries.iter().zip(reachable) {
        ensure!(
            entry.outcome.is_online() == expect_online,
            "unexpected outcome for {}",
            entry.target.name()
        );
        if !expect_online {
            ensure!(
                entry.outcome.error().is_some_and(|error| !error.is_empty()),
                "unreachable entry must carry an error"
            );
        }
    }
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn owner_status_is_private() -> Result<()> {
    let world = world(Arc::new(InMemoryContainerRuntime::new())).await?;
    let alice = username(ALICE)?;
    world
        .orchestrator
        .create_server(&alice, world.request("mc-1"))
        .await?;

    let own = world.orchestrator.owner_status(&alice, &alice).await?;
    ensure!(own.len() == 1, "owner sees their server");

    let foreign = world
        .orchestrator
        .owner_status(&username(BOB)?, &alice)
        .await;
    ensure!(
        matches!(foreign, Err(OrchestratorError::Forbidden { .. })),
        "expected Forbidden, got {foreign:?}"
    );

    let unknown = world
        .orchestrator
        .owner_status(&alice, &username("carol")?)
        .await;
    ensure!(
        matches!(unknown, Err(OrchestratorError::OwnerNotFound(_))),
        "expected OwnerNotFound, got {unknown:?}"
    );
    Ok(())
}
