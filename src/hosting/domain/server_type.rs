//! Versioned container image configurations servers are launched from.

use super::{HostingDomainError, ServerTypeId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single `NAME=value` environment entry attached to a server type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnvironmentVar {
    name: String,
    value: String,
}

impl EnvironmentVar {
    /// Creates an environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`HostingDomainError::InvalidEnvironmentVarName`] when the
    /// trimmed name is empty or contains `=`.
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, HostingDomainError> {
        let normalized = name.into().trim().to_owned();
        if normalized.is_empty() || normalized.contains('=') {
            return Err(HostingDomainError::InvalidEnvironmentVarName(normalized));
        }
        Ok(Self {
            name: normalized,
            value: value.into(),
        })
    }

    /// Returns the variable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the variable value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for EnvironmentVar {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}={}", self.name, self.value)
    }
}

/// A named, versioned container image configuration.
///
/// The `(name, version)` pair is unique. Only the enabled flag changes once a
/// type is in use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerType {
    id: ServerTypeId,
    name: String,
    version: String,
    docker_image: String,
    environment: Vec<EnvironmentVar>,
    enabled: bool,
}

impl ServerType {
    /// Creates an enabled server type with no environment.
    ///
    /// # Errors
    ///
    /// Returns [`HostingDomainError::EmptyServerTypeField`] when the name,
    /// version, or image is empty after trimming.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        docker_image: impl Into<String>,
    ) -> Result<Self, HostingDomainError> {
        Self::with_id(ServerTypeId::new(), name, version, docker_image)
    }

    /// Creates a server type with a known identifier.
    ///
    /// # Errors
    ///
    /// Returns [`HostingDomainError::EmptyServerTypeField`] when the name,
    /// version, or image is empty after trimming.
    pub fn with_id(
        id: ServerTypeId,
        name: impl Into<String>,
        version: impl Into<String>,
        docker_image: impl Into<String>,
    ) -> Result<Self, HostingDomainError> {
        Ok(Self {
            id,
            name: non_empty(name.into(), "name")?,
            version: non_empty(version.into(), "version")?,
            docker_image: non_empty(docker_image.into(), "docker_image")?,
            environment: Vec::new(),
            enabled: true,
        })
    }

    /// Replaces the environment entries.
    #[must_use]
    pub fn with_environment(mut self, values: impl IntoIterator<Item = EnvironmentVar>) -> Self {
        self.environment = values.into_iter().collect();
        self
    }

    /// Sets whether the type may be chosen for new servers.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Returns the server type identifier.
    #[must_use]
    pub const fn id(&self) -> ServerTypeId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the version label.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the container image reference.
    #[must_use]
    pub fn docker_image(&self) -> &str {
        &self.docker_image
    }

    /// Returns the environment entries in declaration order.
    #[must_use]
    pub fn environment(&self) -> &[EnvironmentVar] {
        &self.environment
    }

    /// Returns whether the type is enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl fmt::Display for ServerType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} ({})", self.name, self.version)
    }
}

fn non_empty(value: String, field: &'static str) -> Result<String, HostingDomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(HostingDomainError::EmptyServerTypeField { field });
    }
    Ok(trimmed.to_owned())
}
