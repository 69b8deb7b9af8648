//! Error types for container launch specifications.

use thiserror::Error;

/// Errors raised while assembling a container launch specification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContainerDomainError {
    /// The message-of-the-day template failed to render.
    #[error("failed to render MOTD for server '{server}': {reason}")]
    MotdTemplate {
        /// Server the MOTD was rendered for.
        server: String,
        /// Renderer failure description.
        reason: String,
    },
}
