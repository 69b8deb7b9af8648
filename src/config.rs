//! Explicit configuration passed into service construction.
//!
//! Every field has a default, so an empty JSON object is a complete
//! configuration:
//!
//! ```
//! use wrangler::config::WranglerConfig;
//!
//! let config: WranglerConfig = serde_json::from_str("{}").expect("defaults apply");
//! assert_eq!(config.runtime.docker_port, 2375);
//! assert_eq!(config.quotas.user_server_limit, 2);
//! ```

use crate::container::domain::{LaunchSettings, VolumeBinding};
use crate::hosting::domain::{
    EnvironmentVar, Host, HostName, HostingDomainError, Owner, PortRange, Username,
};
use crate::hosting::services::ModpackImportSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {path}: {cause}")]
    Read {
        /// File that was read.
        path: PathBuf,
        /// I/O error.
        cause: Arc<std::io::Error>,
    },

    /// The file is not valid configuration JSON.
    #[error("failed to parse config file {path}: {reason}")]
    Parse {
        /// File that was parsed.
        path: PathBuf,
        /// Parser error description.
        reason: String,
    },

    /// A value is out of its permitted range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WranglerConfig {
    /// Container runtime and launch settings.
    pub runtime: RuntimeConfig,
    /// Status polling settings.
    pub status: StatusConfig,
    /// Default quotas for owners and hosts.
    pub quotas: QuotaConfig,
    /// Modpack catalogue import settings.
    pub modpacks: ModpackConfig,
}

impl WranglerConfig {
    /// Loads and validates configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, or
    /// when a value fails validation.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file_path = path.as_ref();
        let contents = std::fs::read_to_string(file_path).map_err(|err| ConfigError::Read {
            path: file_path.to_path_buf(),
            cause: Arc::new(err),
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|err| ConfigError::Parse {
            path: file_path.to_path_buf(),
            reason: err.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.status.max_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "status.max_concurrency must be at least 1".to_owned(),
            ));
        }
        if self.status.query_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "status.query_timeout_ms must be positive".to_owned(),
            ));
        }
        self.quotas
            .host_port_range()
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;
        self.modpacks
            .environment()
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;
        Ok(())
    }
}

/// Container runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Port the Docker Engine API listens on at every host.
    pub docker_port: u16,
    /// Timeout for each runtime HTTP request, in seconds.
    pub request_timeout_secs: u64,
    /// Game port exposed inside every container.
    pub container_port: u16,
    /// Number of trailing log lines fetched.
    pub log_tail: usize,
    /// Account granted operator rights on every server.
    pub admin_operator: String,
    /// `minijinja` MOTD template.
    pub motd_template: String,
    /// Environment variable that triggers the modpack mount.
    pub modpack_marker: String,
    /// Modpack directory mounted when the marker is present.
    pub modpack_volume: VolumeBinding,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            docker_port: 2375,
            request_timeout_secs: 10,
            container_port: 25565,
            log_tail: 50,
            admin_operator: "lkmhaqer".to_owned(),
            motd_template: "Phukish Minecraft {{ name }} ({{ server_type }})".to_owned(),
            modpack_marker: "CF_SERVER_MOD".to_owned(),
            modpack_volume: VolumeBinding {
                host_path: "/srv/modpacks".to_owned(),
                container_path: "/modpacks".to_owned(),
                read_only: true,
            },
        }
    }
}

impl RuntimeConfig {
    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Settings used to assemble container launch specs.
    #[must_use]
    pub fn launch_settings(&self) -> LaunchSettings {
        LaunchSettings {
            container_port: self.container_port,
            admin_operator: self.admin_operator.clone(),
            motd_template: self.motd_template.clone(),
            modpack_marker: self.modpack_marker.clone(),
            modpack_volume: self.modpack_volume.clone(),
        }
    }
}

/// Status polling settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Deadline for each server query, in milliseconds.
    pub query_timeout_ms: u64,
    /// Maximum queries in flight.
    pub max_concurrency: usize,
    /// Port assumed when an address omits one.
    pub default_game_port: u16,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            query_timeout_ms: 3_000,
            max_concurrency: 16,
            default_game_port: 25565,
        }
    }
}

impl StatusConfig {
    /// Per-query deadline.
    #[must_use]
    pub const fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

/// Defaults applied when registering owners and hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Servers a new owner may hold.
    pub user_server_limit: u32,
    /// Servers a new host may run.
    pub host_server_limit: u32,
    /// Inclusive lower bound of a new host's port range.
    pub host_min_port: u16,
    /// Exclusive upper bound of a new host's port range.
    pub host_max_port: u16,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            user_server_limit: 2,
            host_server_limit: 7,
            host_min_port: 25565,
            host_max_port: 25693,
        }
    }
}

impl QuotaConfig {
    /// Default port range for new hosts.
    ///
    /// # Errors
    ///
    /// Returns [`HostingDomainError::InvalidPortRange`] when the bounds are
    /// inverted or equal.
    pub const fn host_port_range(&self) -> Result<PortRange, HostingDomainError> {
        PortRange::new(self.host_min_port, self.host_max_port)
    }

    /// Builds an owner with the default server limit.
    #[must_use]
    pub const fn owner(&self, username: Username) -> Owner {
        Owner::new(username, self.user_server_limit)
    }

    /// Builds an enabled host with the default range and limit.
    ///
    /// # Errors
    ///
    /// Returns [`HostingDomainError::InvalidPortRange`] when the configured
    /// range is invalid.
    pub fn host(&self, name: HostName) -> Result<Host, HostingDomainError> {
        Ok(Host::new(
            name,
            self.host_port_range()?,
            self.host_server_limit,
        ))
    }
}

/// Modpack catalogue import settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModpackConfig {
    /// Catalogue base URL; must end with `/`.
    pub base_url: String,
    /// Number of popular packs imported.
    pub popular_limit: usize,
    /// Image every imported server type runs.
    pub docker_image: String,
    /// Environment shared by every imported type, as `(name, value)` pairs.
    pub base_environment: Vec<(String, String)>,
    /// Timeout for each catalogue request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ModpackConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.modpacks.ch/public/modpack/".to_owned(),
            popular_limit: 20,
            docker_image: "itzg/minecraft-server:multiarch".to_owned(),
            base_environment: vec![
                ("TYPE".to_owned(), "FTBA".to_owned()),
                ("MEMORY".to_owned(), "4G".to_owned()),
            ],
            request_timeout_secs: 10,
        }
    }
}

impl ModpackConfig {
    /// Validated base environment.
    ///
    /// # Errors
    ///
    /// Returns [`HostingDomainError::InvalidEnvironmentVarName`] for an
    /// unusable variable name.
    pub fn environment(&self) -> Result<Vec<EnvironmentVar>, HostingDomainError> {
        self.base_environment
            .iter()
            .map(|(name, value)| EnvironmentVar::new(name.as_str(), value.as_str()))
            .collect()
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Settings for [`crate::hosting::services::ModpackImportService`].
    ///
    /// # Errors
    ///
    /// Returns [`HostingDomainError::InvalidEnvironmentVarName`] for an
    /// unusable base variable name.
    pub fn import_settings(&self) -> Result<ModpackImportSettings, HostingDomainError> {
        Ok(ModpackImportSettings {
            popular_limit: self.popular_limit,
            docker_image: self.docker_image.clone(),
            base_environment: self.environment()?,
        })
    }
}
