//! Live status values and the aggregate poll report.

use serde::{Deserialize, Serialize};

/// Status reported by a reachable game server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    /// Version banner, e.g. `1.20.4` or `Paper 1.20.4`.
    pub version: String,
    /// Players currently online.
    pub online_players: u32,
    /// Player capacity.
    pub max_players: u32,
    /// Plain-text message of the day.
    pub motd: String,
}

/// Result of querying one server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StatusOutcome {
    /// The server answered.
    Online(ServerStatus),
    /// The query failed; the version text is empty.
    Unreachable {
        /// Always empty; kept so that views can render it like a banner.
        version_text: String,
        /// Captured failure description.
        error: String,
    },
}

impl StatusOutcome {
    /// Builds the placeholder for a failed query.
    #[must_use]
    pub fn unreachable(error: impl Into<String>) -> Self {
        Self::Unreachable {
            version_text: String::new(),
            error: error.into(),
        }
    }

    /// Returns the live status when the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<&ServerStatus> {
        match self {
            Self::Online(status) => Some(status),
            Self::Unreachable { .. } => None,
        }
    }

    /// Returns the captured error when the query failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Online(_) => None,
            Self::Unreachable { error, .. } => Some(error),
        }
    }

    /// Returns whether the server answered.
    #[must_use]
    pub const fn is_online(&self) -> bool {
        matches!(self, Self::Online(_))
    }
}

/// One polled target with its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry<T> {
    /// The polled target.
    pub target: T,
    /// What the query produced.
    pub outcome: StatusOutcome,
}

/// Poll results in input order plus player totals over reachable servers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport<T> {
    /// Entries in the order the targets were supplied.
    pub entries: Vec<StatusEntry<T>>,
    /// Sum of online players over reachable servers.
    pub total_players: u64,
    /// Sum of capacity over reachable servers.
    pub total_capacity: u64,
}

impl<T> StatusReport<T> {
    /// Builds a report, computing totals from the online entries.
    #[must_use]
    pub fn from_entries(entries: Vec<StatusEntry<T>>) -> Self {
        let (total_players, total_capacity) = entries
            .iter()
            .filter_map(|entry| entry.outcome.status())
            .fold((0_u64, 0_u64), |(players, capacity), status| {
                (
                    players.saturating_add(u64::from(status.online_players)),
                    capacity.saturating_add(u64::from(status.max_players)),
                )
            });
        Self {
            entries,
            total_players,
            total_capacity,
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the report has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
