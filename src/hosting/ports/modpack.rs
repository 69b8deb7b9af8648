//! Port onto an external modpack catalogue.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for modpack catalogue operations.
pub type ModpackSourceResult<T> = Result<T, ModpackSourceError>;

/// Latest published version of a modpack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModpackVersion {
    /// Catalogue identifier of the version.
    pub id: u64,
    /// Human-readable version label.
    pub name: String,
}

/// Catalogue entry describing one modpack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModpackDescriptor {
    /// Catalogue identifier of the pack.
    pub id: u64,
    /// Display name of the pack.
    pub name: String,
    /// Most recent version, if the pack has published any.
    pub latest_version: Option<ModpackVersion>,
}

/// Read contract for a modpack catalogue.
#[async_trait]
pub trait ModpackSource: Send + Sync {
    /// Returns the identifiers of the most installed packs, most popular first.
    async fn popular_pack_ids(&self, limit: usize) -> ModpackSourceResult<Vec<u64>>;

    /// Fetches one pack's descriptor.
    async fn fetch_pack(&self, id: u64) -> ModpackSourceResult<ModpackDescriptor>;
}

/// Errors returned by modpack catalogue adapters.
#[derive(Debug, Clone, Error)]
pub enum ModpackSourceError {
    /// The catalogue could not be reached or timed out.
    #[error("modpack catalogue transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),

    /// The catalogue answered with a non-success status.
    #[error("modpack catalogue returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// The catalogue payload could not be decoded.
    #[error("invalid modpack catalogue payload: {0}")]
    Decode(String),
}

impl ModpackSourceError {
    /// Wraps a transport failure.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
