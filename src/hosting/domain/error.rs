//! Error types for hosting domain validation and parsing.

use super::{HostName, PortRange};
use thiserror::Error;

/// Errors returned while constructing or mutating hosting domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostingDomainError {
    /// The server name is empty after trimming.
    #[error("server name must not be empty")]
    EmptyServerName,

    /// The server name is not a slug.
    #[error(
        "server name '{0}' must start with a letter or digit and contain only letters, digits, '-' or '_'"
    )]
    InvalidServerName(String),

    /// The server name exceeds the 32-character storage limit.
    #[error("server name exceeds 32 character limit: {0}")]
    ServerNameTooLong(String),

    /// The host name is empty after trimming.
    #[error("host name must not be empty")]
    EmptyHostName,

    /// The host name contains whitespace or exceeds the storage limit.
    #[error("invalid host name: {0}")]
    InvalidHostName(String),

    /// The player name is not a valid in-game identity.
    #[error("invalid player name '{0}' (1-16 characters of letters, digits and '_')")]
    InvalidPlayerName(String),

    /// The account username is empty after trimming.
    #[error("username must not be empty")]
    EmptyUsername,

    /// The server type name or version is empty.
    #[error("server type {field} must not be empty")]
    EmptyServerTypeField {
        /// Name of the offending field.
        field: &'static str,
    },

    /// An environment variable name is empty or contains `=`.
    #[error("invalid environment variable name: '{0}'")]
    InvalidEnvironmentVarName(String),

    /// A port range does not satisfy `min_port < max_port`.
    #[error("invalid port range [{min_port}, {max_port})")]
    InvalidPortRange {
        /// Inclusive lower bound.
        min_port: u16,
        /// Exclusive upper bound.
        max_port: u16,
    },

    /// Every port in the host range is already assigned.
    #[error("no free port on host {host} in range {range}")]
    CapacityExhausted {
        /// Host whose range is exhausted.
        host: HostName,
        /// The exhausted range.
        range: PortRange,
    },

    /// A pinned port lies outside the host range.
    #[error("port {port} is outside the range {range} of host {host}")]
    PortOutOfRange {
        /// Host the port was requested on.
        host: HostName,
        /// Requested port.
        port: u16,
        /// Configured host range.
        range: PortRange,
    },

    /// A pinned port is already assigned to another server on the host.
    #[error("port {port} is already assigned on host {host}")]
    PortInUse {
        /// Host the port was requested on.
        host: HostName,
        /// Requested port.
        port: u16,
    },

    /// Transitioning between two lifecycle states is invalid.
    #[error("invalid server lifecycle transition: {from} -> {to}")]
    InvalidLifecycleTransition {
        /// Current lifecycle state.
        from: String,
        /// Requested target lifecycle state.
        to: String,
    },
}

/// Error returned while parsing lifecycle state from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown server lifecycle state: {0}")]
pub struct ParseServerLifecycleStateError(pub String);

/// Error returned while parsing a game mode code.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown game mode code: {0}")]
pub struct ParseGameTypeError(pub i32);
