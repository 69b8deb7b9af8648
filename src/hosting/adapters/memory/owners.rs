//! In-memory owner directory.

use crate::hosting::{
    domain::{Owner, Username},
    ports::{OwnerDirectory, OwnerDirectoryError, OwnerDirectoryResult},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory owner directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOwnerDirectory {
    owners: Arc<RwLock<HashMap<Username, Owner>>>,
}

impl InMemoryOwnerDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an owner.
    ///
    /// # Errors
    ///
    /// Returns [`OwnerDirectoryError::Unavailable`] when lock acquisition
    /// fails.
    pub fn insert(&self, owner: Owner) -> OwnerDirectoryResult<()> {
        let mut owners = self
            .owners
            .write()
            .map_err(|err| OwnerDirectoryError::unavailable(std::io::Error::other(err.to_string())))?;
        owners.insert(owner.username().clone(), owner);
        Ok(())
    }
}

#[async_trait]
impl OwnerDirectory for InMemoryOwnerDirectory {
    async fn find_owner(&self, username: &Username) -> OwnerDirectoryResult<Option<Owner>> {
        let owners = self
            .owners
            .read()
            .map_err(|err| OwnerDirectoryError::unavailable(std::io::Error::other(err.to_string())))?;
        Ok(owners.get(username).cloned())
    }
}
