//! In-memory status probe with scripted answers.

use crate::status::{
    domain::{ServerAddress, ServerStatus},
    ports::{GameStatusProbe, ProbeError, ProbeResult},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Probe that answers from a table of scripted statuses.
///
/// Addresses without an entry behave like a closed port. An optional delay
/// per address lets tests exercise query deadlines.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStatusProbe {
    state: Arc<RwLock<ScriptedAnswers>>,
}

#[derive(Debug, Default)]
struct ScriptedAnswers {
    online: HashMap<ServerAddress, ServerStatus>,
    delays: HashMap<ServerAddress, Duration>,
}

impl InMemoryStatusProbe {
    /// Creates a probe for which every address is unreachable.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `address` answer with `status`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Connection`] when lock acquisition fails.
    pub fn set_online(&self, address: ServerAddress, status: ServerStatus) -> ProbeResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| ProbeError::connection(&address, std::io::Error::other(err.to_string())))?;
        state.online.insert(address, status);
        Ok(())
    }

    /// Delays every answer from `address` by `delay`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Connection`] when lock acquisition fails.
    pub fn set_delay(&self, address: ServerAddress, delay: Duration) -> ProbeResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| ProbeError::connection(&address, std::io::Error::other(err.to_string())))?;
        state.delays.insert(address, delay);
        Ok(())
    }
}

#[async_trait]
impl GameStatusProbe for InMemoryStatusProbe {
    async fn query(&self, address: &ServerAddress) -> ProbeResult<ServerStatus> {
        let (answer, delay) = {
            let state = self.state.read().map_err(|err| {
                ProbeError::connection(address, std::io::Error::other(err.to_string()))
            })?;
            (
                state.online.get(address).cloned(),
                state.delays.get(address).copied(),
            )
        };

        if let Some(pause) = delay {
            tokio::time::sleep(pause).await;
        }

        answer.ok_or_else(|| {
            ProbeError::connection(
                address,
                std::io::Error::new(ErrorKind::ConnectionRefused, "connection refused"),
            )
        })
    }
}
