//! User-facing outcome of best-effort container operations.

use serde::{Deserialize, Serialize};

/// Message reported after a successful restart.
pub const RESTART_SUCCEEDED: &str = "Success!";

/// Message reported when a restart could not be carried out.
pub const RESTART_FAILED: &str = "Error restarting this server.";

/// Placeholder log line returned when logs cannot be collected.
pub const LOGS_UNAVAILABLE: &str = "Unable to collect logs.";

/// Success flag plus a message suitable for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Display message.
    pub message: String,
}

impl OperationResult {
    /// Builds a successful outcome.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    /// Builds a failed outcome.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }

    /// Outcome of a restart attempt.
    #[must_use]
    pub fn restart<E>(result: &Result<(), E>) -> Self {
        match result {
            Ok(()) => Self::success(RESTART_SUCCEEDED),
            Err(_) => Self::failure(RESTART_FAILED),
        }
    }
}
