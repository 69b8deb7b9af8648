//! Identifier and validated-name types for the hosting domain.

use super::HostingDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum length for a server name, matching `VARCHAR(32)`.
const MAX_SERVER_NAME_LENGTH: usize = 32;

/// Maximum length for a host name, matching `VARCHAR(255)`.
const MAX_HOST_NAME_LENGTH: usize = 255;

/// Maximum length for an in-game player name.
const MAX_PLAYER_NAME_LENGTH: usize = 16;

/// Unique identifier for a provisioned server record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerId(Uuid);

impl ServerId {
    /// Creates a new random server identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a server identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ServerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Unique identifier for a server type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerTypeId(Uuid);

impl ServerTypeId {
    /// Creates a new random server type identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a server type identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ServerTypeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ServerTypeId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Validated, globally unique server name.
///
/// The name doubles as the container name on the remote runtime, so it is
/// restricted to a slug that both accept.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServerName(String);

impl ServerName {
    /// Creates a validated server name.
    ///
    /// # Errors
    ///
    /// Returns [`HostingDomainError`] when the trimmed value is empty, longer
    /// than 32 characters, or not a slug.
    pub fn new(value: impl Into<String>) -> Result<Self, HostingDomainError> {
        let normalized = value.into().trim().to_owned();

        if normalized.is_empty() {
            return Err(HostingDomainError::EmptyServerName);
        }

        if normalized.len() > MAX_SERVER_NAME_LENGTH {
            return Err(HostingDomainError::ServerNameTooLong(normalized));
        }

        let starts_alphanumeric = normalized
            .chars()
            .next()
            .is_some_and(|character| character.is_ascii_alphanumeric());
        let is_slug = normalized.chars().all(|character| {
            character.is_ascii_alphanumeric() || character == '-' || character == '_'
        });
        if !starts_alphanumeric || !is_slug {
            return Err(HostingDomainError::InvalidServerName(normalized));
        }

        Ok(Self(normalized))
    }

    /// Returns the server name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ServerName {
    type Error = HostingDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ServerName> for String {
    fn from(value: ServerName) -> Self {
        value.0
    }
}

impl AsRef<str> for ServerName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ServerName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Validated network name of a hosting machine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HostName(String);

impl HostName {
    /// Creates a validated host name.
    ///
    /// # Errors
    ///
    /// Returns [`HostingDomainError::EmptyHostName`] when the trimmed value is
    /// empty, or [`HostingDomainError::InvalidHostName`] when it contains
    /// whitespace or exceeds 255 characters.
    pub fn new(value: impl Into<String>) -> Result<Self, HostingDomainError> {
        let normalized = value.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(HostingDomainError::EmptyHostName);
        }
        if normalized.len() > MAX_HOST_NAME_LENGTH || normalized.chars().any(char::is_whitespace)
        {
            return Err(HostingDomainError::InvalidHostName(normalized));
        }
        Ok(Self(normalized))
    }

    /// Returns the host name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for HostName {
    type Error = HostingDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<HostName> for String {
    fn from(value: HostName) -> Self {
        value.0
    }
}

impl AsRef<str> for HostName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for HostName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// In-game player identity, as granted operator rights on a server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerName(String);

impl PlayerName {
    /// Creates a validated player name.
    ///
    /// # Errors
    ///
    /// Returns [`HostingDomainError::InvalidPlayerName`] unless the trimmed
    /// value has 1-16 characters from `[A-Za-z0-9_]`.
    pub fn new(value: impl Into<String>) -> Result<Self, HostingDomainError> {
        let normalized = value.into().trim().to_owned();
        let is_valid = !normalized.is_empty()
            && normalized.len() <= MAX_PLAYER_NAME_LENGTH
            && normalized
                .chars()
                .all(|character| character.is_ascii_alphanumeric() || character == '_');
        if !is_valid {
            return Err(HostingDomainError::InvalidPlayerName(normalized));
        }
        Ok(Self(normalized))
    }

    /// Returns the player name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PlayerName {
    type Error = HostingDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PlayerName> for String {
    fn from(value: PlayerName) -> Self {
        value.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Account identity of a server owner or requester.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Creates a username.
    ///
    /// # Errors
    ///
    /// Returns [`HostingDomainError::EmptyUsername`] when the trimmed value is
    /// empty.
    pub fn new(value: impl Into<String>) -> Result<Self, HostingDomainError> {
        let normalized = value.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(HostingDomainError::EmptyUsername);
        }
        Ok(Self(normalized))
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Username {
    type Error = HostingDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
