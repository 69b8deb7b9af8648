//! Launch specification for a game-server container.
//!
//! The environment is assembled in a fixed order: `EULA`, `OPS`, `MOTD`, and
//! `MODE` first, followed by every server-type entry in declaration order.
//! A server type carrying the modpack marker variable additionally gets the
//! shared modpack directory mounted read-only.

use super::ContainerDomainError;
use crate::hosting::domain::{Server, ServerType};
use minijinja::{Environment, context};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Host directory bound into a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeBinding {
    /// Absolute path on the host.
    pub host_path: String,
    /// Mount point inside the container.
    pub container_path: String,
    /// Whether the mount is read-only.
    pub read_only: bool,
}

impl VolumeBinding {
    /// Formats the binding in Docker `Binds` notation (`host:container:mode`).
    #[must_use]
    pub fn as_bind(&self) -> String {
        let mode = if self.read_only { "ro" } else { "rw" };
        format!("{}:{}:{mode}", self.host_path, self.container_path)
    }
}

/// Restart policy applied by the container runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartPolicy {
    /// Maximum retries; zero means unlimited.
    pub maximum_retry_count: u32,
}

impl RestartPolicy {
    /// Always restart, with unlimited retries.
    #[must_use]
    pub const fn always() -> Self {
        Self {
            maximum_retry_count: 0,
        }
    }

    /// Runtime name of the policy.
    #[must_use]
    pub const fn name(self) -> &'static str {
        "always"
    }
}

/// Inputs to launch-spec assembly that do not come from the server record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSettings {
    /// Game port exposed inside the container.
    pub container_port: u16,
    /// Administrative account always granted operator rights.
    pub admin_operator: String,
    /// `minijinja` template for the MOTD; receives `name` and `server_type`.
    pub motd_template: String,
    /// Environment variable whose presence triggers the modpack mount.
    pub modpack_marker: String,
    /// Modpack directory mounted when the marker is present.
    pub modpack_volume: VolumeBinding,
}

/// Everything the runtime needs to create and start one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    name: String,
    image: String,
    environment: Vec<String>,
    container_port: u16,
    host_port: u16,
    volume: Option<VolumeBinding>,
    restart_policy: RestartPolicy,
}

impl ContainerSpec {
    /// Builds the launch specification for `server` running `server_type`.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerDomainError::MotdTemplate`] when the MOTD template
    /// cannot be rendered.
    pub fn for_server(
        server: &Server,
        server_type: &ServerType,
        settings: &LaunchSettings,
    ) -> Result<Self, ContainerDomainError> {
        let motd = render_motd(server, server_type, &settings.motd_template)?;
        let operators = std::iter::once(settings.admin_operator.as_str())
            .filter(|admin| !admin.is_empty())
            .chain(server.operators().iter().map(|player| player.as_str()))
            .collect::<Vec<_>>()
            .join(",");

        let mut environment = vec![
            "EULA=TRUE".to_owned(),
            format!("OPS={operators}"),
            format!("MOTD={motd}"),
            format!("MODE={}", server.game_type().code()),
        ];
        environment.extend(server_type.environment().iter().map(ToString::to_string));

        let volume = server_type
            .environment()
            .iter()
            .any(|var| var.name() == settings.modpack_marker)
            .then(|| settings.modpack_volume.clone());

        Ok(Self {
            name: server.name().as_str().to_owned(),
            image: server_type.docker_image().to_owned(),
            environment,
            container_port: settings.container_port,
            host_port: server.port(),
            volume,
            restart_policy: RestartPolicy::always(),
        })
    }

    /// Container name, identical to the server name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Image reference.
    #[must_use]
    pub fn image(&self) -> &str {
        &self.image
    }

    /// `NAME=value` environment entries in launch order.
    #[must_use]
    pub fn environment(&self) -> &[String] {
        &self.environment
    }

    /// Game port inside the container.
    #[must_use]
    pub const fn container_port(&self) -> u16 {
        self.container_port
    }

    /// Host port the container port is published on.
    #[must_use]
    pub const fn host_port(&self) -> u16 {
        self.host_port
    }

    /// Optional modpack mount.
    #[must_use]
    pub const fn volume(&self) -> Option<&VolumeBinding> {
        self.volume.as_ref()
    }

    /// Restart policy.
    #[must_use]
    pub const fn restart_policy(&self) -> RestartPolicy {
        self.restart_policy
    }
}

impl fmt::Display for ContainerSpec {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{} [{}] {}->{}/tcp",
            self.name, self.image, self.host_port, self.container_port
        )
    }
}

fn render_motd(
    server: &Server,
    server_type: &ServerType,
    template: &str,
) -> Result<String, ContainerDomainError> {
    let environment = Environment::new();
    environment
        .render_str(
            template,
            context! {
                name => server.name().as_str(),
                server_type => server_type.name(),
                version => server_type.version(),
            },
        )
        .map_err(|error| ContainerDomainError::MotdTemplate {
            server: server.name().as_str().to_owned(),
            reason: error.to_string(),
        })
}
