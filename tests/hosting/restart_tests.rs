//! Restarts that never reach a runtime answer leave the record usable.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use eyre::{Result, ensure, eyre};
use rstest::rstest;
use wrangler::container::{
    domain::{ContainerSpec, RESTART_SUCCEEDED},
    ports::{ContainerRuntime, ContainerRuntimeResult},
};
use wrangler::hosting::{
    domain::{HostName, ServerName},
    ports::HostingRepository,
};

use super::helpers::{ALICE, World, username, world};

/// Runtime whose first restart hangs far beyond any caller's patience.
#[derive(Default)]
struct StalledRestartRuntime {
    stalled: AtomicBool,
}

#[async_trait]
impl ContainerRuntime for StalledRestartRuntime {
    async fn run(&self, _host: &HostName, _spec: &ContainerSpec) -> ContainerRuntimeResult<()> {
        Ok(())
    }

    async fn restart(&self, _host: &HostName, _container: &ServerName) -> ContainerRuntimeResult<()> {
        if !self.stalled.swap(true, Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        Ok(())
    }

    async fn remove(&self, _host: &HostName, _container: &ServerName) -> ContainerRuntimeResult<()> {
        Ok(())
    }

    async fn logs(
        &self,
        _host: &HostName,
        _container: &ServerName,
        _tail: usize,
    ) -> ContainerRuntimeResult<Vec<String>> {
        Ok(Vec::new())
    }
}

async fn stored_state(world: &World<StalledRestartRuntime>, name: &str) -> Result<String> {
    let server = world
        .repository
        .find_server(&ServerName::new(name)?)
        .await?
        .ok_or_else(|| eyre!("{name} missing"))?;
    Ok(server.lifecycle_state().as_str().to_owned())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancelled_restart_does_not_strand_the_record() -> Result<()> {
    let world = world(Arc::new(StalledRestartRuntime::default())).await?;
    world.seed_server("mc-1", ALICE).await?;
    let alice = username(ALICE)?;

    let cancelled = tokio::time::timeout(
        Duration::from_millis(100),
        world.orchestrator.restart_server(&alice, "mc-1"),
    )
    .await;
    ensure!(cancelled.is_err(), "first restart should time out");

    let after_cancel = stored_state(&world, "mc-1").await?;
    ensure!(after_cancel == "created", "state after cancel: {after_cancel}");

    let retried = world.orchestrator.restart_server(&alice, "mc-1").await?;
    ensure!(retried.ok, "retry should succeed: {}", retried.message);
    ensure!(retried.message == RESTART_SUCCEEDED, "message {}", retried.message);

    let after_retry = stored_state(&world, "mc-1").await?;
    ensure!(after_retry == "running", "state after retry: {after_retry}");
    Ok(())
}
