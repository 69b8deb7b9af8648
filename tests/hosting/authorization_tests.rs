//! Ownership checks run before any container runtime call.

use std::sync::Arc;

use async_trait::async_trait;
use eyre::{Result, ensure};
use mockall::mock;
use rstest::rstest;
use wrangler::container::{
    domain::ContainerSpec,
    ports::{ContainerRuntime, ContainerRuntimeResult},
};
use wrangler::hosting::{
    domain::{HostName, ServerName},
    ports::HostingRepository,
    services::OrchestratorError,
};

use super::helpers::{ALICE, BOB, username, world};

mock! {
    pub Runtime {}

    #[async_trait]
    impl ContainerRuntime for Runtime {
        async fn run(&self, host: &HostName, spec: &ContainerSpec) -> ContainerRuntimeResult<()>;
        async fn restart(&self, host: &HostName, container: &ServerName) -> ContainerRuntimeResult<()>;
        async fn remove(&self, host: &HostName, container: &ServerName) -> ContainerRuntimeResult<()>;
        async fn logs(
            &self,
            host: &HostName,
            container: &ServerName,
            tail: usize,
        ) -> ContainerRuntimeResult<Vec<String>>;
    }
}

fn silent_runtime() -> MockRuntime {
    let mut runtime = MockRuntime::new();
    runtime.expect_run().never();
    runtime.expect_restart().never();
    runtime.expect_remove().never();
    runtime.expect_logs().never();
    runtime
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn non_owner_restart_is_forbidden_without_runtime_call() -> Result<()> {
    let world = world(Arc::new(silent_runtime())).await?;
    world.seed_server("mc-1", ALICE).await?;

    let result = world
        .orchestrator
        .restart_server(&username(BOB)?, "mc-1")
        .await;

    ensure!(
        matches!(result, Err(OrchestratorError::Forbidden { .. })),
        "expected Forbidden, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn non_owner_delete_is_forbidden_and_record_kept() -> Result<()> {
    let world = world(Arc::new(silent_runtime())).await?;
    let server = world.seed_server("mc-1", ALICE).await?;

    let result = world
        .orchestrator
        .delete_server(&username(BOB)?, "mc-1")
        .await;

    ensure!(
        matches!(result, Err(OrchestratorError::Forbidden { .. })),
        "expected Forbidden, got {result:?}"
    );
    ensure!(
        world.repository.find_server(server.name()).await?.is_some(),
        "record must survive a forbidden delete"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn anonymous_detail_skips_log_collection() -> Result<()> {
    let world = world(Arc::new(silent_runtime())).await?;
    world.seed_server("mc-1", ALICE).await?;

    let detail = world.orchestrator.server_detail(None, "mc-1").await?;

    ensure!(detail.logs.is_empty(), "anonymous viewers see no logs");
    ensure!(!detail.status.is_online(), "probe has no answer configured");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn owner_restart_reaches_the_runtime_once() -> Result<()> {
    let mut runtime = MockRuntime::new();
    runtime
        .expect_restart()
        .withf(|host, container| host.as_str() == "minecraft-00.cvn" && container.as_str() == "mc-1")
        .times(1)
        .returning(|_, _| Ok(()));
    let world = world(Arc::new(runtime)).await?;
    world.seed_server("mc-1", ALICE).await?;

    let outcome = world
        .orchestrator
        .restart_server(&username(ALICE)?, "mc-1")
        .await?;

    ensure!(outcome.ok, "restart should report success");
    Ok(())
}
