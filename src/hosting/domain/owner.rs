//! Account owners as seen by the hosting core.

use super::{PlayerName, Username};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An account that may own servers.
///
/// Owners are managed by the account system; the core reads the identity,
/// the server quota, and the in-game players registered to the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    username: Username,
    server_limit: u32,
    players: BTreeSet<PlayerName>,
}

impl Owner {
    /// Creates an owner with no registered players.
    #[must_use]
    pub const fn new(username: Username, server_limit: u32) -> Self {
        Self {
            username,
            server_limit,
            players: BTreeSet::new(),
        }
    }

    /// Replaces the in-game players registered to this account.
    #[must_use]
    pub fn with_players(mut self, players: impl IntoIterator<Item = PlayerName>) -> Self {
        self.players = players.into_iter().collect();
        self
    }

    /// Returns the account identity.
    #[must_use]
    pub const fn username(&self) -> &Username {
        &self.username
    }

    /// Returns the maximum number of servers the owner may hold.
    #[must_use]
    pub const fn server_limit(&self) -> u32 {
        self.server_limit
    }

    /// Returns the in-game players registered to this account.
    #[must_use]
    pub const fn players(&self) -> &BTreeSet<PlayerName> {
        &self.players
    }

    /// Returns whether `requester` is this owner.
    #[must_use]
    pub fn is(&self, requester: &Username) -> bool {
        self.username == *requester
    }
}
