//! Docker Engine adapter built on bollard.
//!
//! Talks to the unauthenticated Engine API each host exposes on
//! `tcp://{host}:{port}`. A client is connected per call, so hosts can be
//! added without restarting the service.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, LogsOptions, RemoveContainerOptions, StartContainerOptions,
};
use bollard::errors::Error as EngineError;
use bollard::image::CreateImageOptions;
use bollard::models::{HostConfig, PortBinding, RestartPolicy, RestartPolicyNameEnum};
use bollard::{API_DEFAULT_VERSION, Docker};
use futures_util::TryStreamExt;
use tracing::{debug, info};

use crate::container::domain::{self, ContainerSpec, VolumeBinding};
use crate::container::ports::{ContainerRuntime, ContainerRuntimeError, ContainerRuntimeResult};
use crate::hosting::domain::{HostName, ServerName};

const NOT_FOUND: u16 = 404;
const NOT_MODIFIED: u16 = 304;

/// Container runtime backed by the Docker Engine API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DockerEngineRuntime {
    port: u16,
    timeout: Duration,
}

impl DockerEngineRuntime {
    /// Builds an adapter that reaches each host's engine on `port`, bounding
    /// every request by `timeout`.
    #[must_use]
    pub const fn new(port: u16, timeout: Duration) -> Self {
        Self { port, timeout }
    }

    fn connect(&self, host: &HostName) -> ContainerRuntimeResult<Docker> {
        let address = format!("tcp://{host}:{port}", port = self.port);
        Docker::connect_with_http(&address, self.timeout.as_secs().max(1), API_DEFAULT_VERSION)
            .map_err(|err| ContainerRuntimeError::unavailable(host, err))
    }

    async fn pull_image(
        &self,
        docker: &Docker,
        host: &HostName,
        image: &str,
    ) -> ContainerRuntimeResult<()> {
        let (repository, tag) = split_image_reference(image);
        info!(%host, image, "pulling container image");
        let options = CreateImageOptions {
            from_image: repository,
            tag,
            ..Default::default()
        };
        // Draining the progress stream waits for the pull to finish.
        docker
            .create_image(Some(options), None, None)
            .map_err(|err| map_engine_error(host, image, err))
            .try_for_each(|_| async { Ok(()) })
            .await
    }
}

#[async_trait]
impl ContainerRuntime for DockerEngineRuntime {
    async fn run(&self, host: &HostName, spec: &ContainerSpec) -> ContainerRuntimeResult<()> {
        let docker = self.connect(host)?;
        let options = Some(CreateContainerOptions {
            name: spec.name(),
            platform: None,
        });

        let first_attempt = docker
            .create_container(options.clone(), container_config(spec))
            .await;
        match first_attempt {
            Err(EngineError::DockerResponseServerError {
                status_code: NOT_FOUND,
                ..
            }) => {
                debug!(%host, image = spec.image(), "image missing on host");
                self.pull_image(&docker, host, spec.image()).await?;
                docker
                    .create_container(options, container_config(spec))
                    .await
                    .map_err(|err| map_engine_error(host, spec.name(), err))?;
            }
            other => {
                other.map_err(|err| map_engine_error(host, spec.name(), err))?;
            }
        }

        match docker
            .start_container(spec.name(), None::<StartContainerOptions<String>>)
            .await
        {
            // Already running.
            Err(EngineError::DockerResponseServerError {
                status_code: NOT_MODIFIED,
                ..
            }) => Ok(()),
            other => other.map_err(|err| map_engine_error(host, spec.name(), err)),
        }
    }

    async fn restart(
        &self,
        host: &HostName,
        container: &ServerName,
    ) -> ContainerRuntimeResult<()> {
        self.connect(host)?
            .restart_container(container.as_str(), None)
            .await
            .map_err(|err| map_engine_error(host, container.as_str(), err))
    }

    async fn remove(&self, host: &HostName, container: &ServerName) -> ContainerRuntimeResult<()> {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        self.connect(host)?
            .remove_container(container.as_str(), Some(options))
            .await
            .map_err(|err| map_engine_error(host, container.as_str(), err))
    }

    async fn logs(
        &self,
        host: &HostName,
        container: &ServerName,
        tail: usize,
    ) -> ContainerRuntimeResult<Vec<String>> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            tail: tail.to_string(),
            ..Default::default()
        };
        self.connect(host)?
            .logs(container.as_str(), Some(options))
            .map_err(|err| map_engine_error(host, container.as_str(), err))
            .map_ok(|output| log_lines(&output.into_bytes()))
            .try_concat()
            .await
    }
}

fn map_engine_error(host: &HostName, container: &str, error: EngineError) -> ContainerRuntimeError {
    match error {
        EngineError::DockerResponseServerError {
            status_code: NOT_FOUND,
            ..
        } => ContainerRuntimeError::NotFound {
            host: host.clone(),
            container: container.to_owned(),
        },
        EngineError::DockerResponseServerError {
            status_code,
            message,
        } => ContainerRuntimeError::Rejected {
            host: host.clone(),
            status: status_code,
            message,
        },
        EngineError::JsonDataError { .. } | EngineError::JsonSerdeError { .. } => {
            ContainerRuntimeError::Decode {
                host: host.clone(),
                reason: error.to_string(),
            }
        }
        other => ContainerRuntimeError::unavailable(host, other),
    }
}

fn container_config(spec: &ContainerSpec) -> Config<String> {
    let port_key = format!("{}/tcp", spec.container_port());
    let binding = PortBinding {
        host_ip: None,
        host_port: Some(spec.host_port().to_string()),
    };
    let binds: Vec<String> = spec
        .volume()
        .map(VolumeBinding::as_bind)
        .into_iter()
        .collect();

    Config {
        image: Some(spec.image().to_owned()),
        env: Some(spec.environment().to_vec()),
        exposed_ports: Some(HashMap::from([(port_key.clone(), HashMap::new())])),
        host_config: Some(HostConfig {
            port_bindings: Some(HashMap::from([(port_key, Some(vec![binding]))])),
            restart_policy: Some(engine_restart_policy(spec.restart_policy())),
            binds: (!binds.is_empty()).then_some(binds),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn engine_restart_policy(policy: domain::RestartPolicy) -> RestartPolicy {
    let name = match policy.name() {
        "always" => RestartPolicyNameEnum::ALWAYS,
        _ => RestartPolicyNameEnum::NO,
    };
    RestartPolicy {
        name: Some(name),
        maximum_retry_count: Some(i64::from(policy.maximum_retry_count)),
    }
}

/// Splits `repo[:tag]` into repository and tag, defaulting the tag to
/// `latest`. A colon inside a registry host (`registry:5000/image`) is not a
/// tag separator.
fn split_image_reference(image: &str) -> (&str, &str) {
    match image.rsplit_once(':') {
        Some((repository, tag)) if !tag.contains('/') => (repository, tag),
        _ => (image, "latest"),
    }
}

fn log_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::to_owned)
        .collect()
}
