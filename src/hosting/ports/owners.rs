//! Read-only port onto the account system.

use crate::hosting::domain::{Owner, Username};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for owner directory lookups.
pub type OwnerDirectoryResult<T> = Result<T, OwnerDirectoryError>;

/// Lookup contract for server owners.
#[async_trait]
pub trait OwnerDirectory: Send + Sync {
    /// Finds an owner by username.
    async fn find_owner(&self, username: &Username) -> OwnerDirectoryResult<Option<Owner>>;
}

/// Errors returned by owner directory adapters.
#[derive(Debug, Clone, Error)]
pub enum OwnerDirectoryError {
    /// The account system could not be queried.
    #[error("owner directory unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl OwnerDirectoryError {
    /// Wraps an account-system failure.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
