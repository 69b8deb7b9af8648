//! Standard game modes a server can be launched in.

use super::ParseGameTypeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Game mode selector passed to the container as a numeric code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    /// Survival mode (code `0`).
    #[default]
    Survival,
    /// Creative mode (code `1`).
    Creative,
}

impl GameType {
    /// Returns the numeric code understood by the server image.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Survival => 0,
            Self::Creative => 1,
        }
    }

    /// Returns the canonical lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Survival => "survival",
            Self::Creative => "creative",
        }
    }
}

impl TryFrom<i32> for GameType {
    type Error = ParseGameTypeError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Survival),
            1 => Ok(Self::Creative),
            other => Err(ParseGameTypeError(other)),
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
