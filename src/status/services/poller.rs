//! Best-effort status polling across many servers.

use crate::status::{
    domain::{StatusEntry, StatusOutcome, StatusReport, StatusTarget},
    ports::{GameStatusProbe, ProbeError},
};
use futures_util::{StreamExt, stream};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Queries servers concurrently and isolates per-server failures.
///
/// At most `max_concurrency` queries are in flight, each bounded by
/// `query_timeout`. Output order always matches input order.
#[derive(Clone)]
pub struct StatusPoller<P>
where
    P: GameStatusProbe,
{
    probe: Arc<P>,
    query_timeout: Duration,
    max_concurrency: usize,
}

impl<P> StatusPoller<P>
where
    P: GameStatusProbe,
{
    /// Creates a poller.
    #[must_use]
    pub fn new(probe: Arc<P>, query_timeout: Duration, max_concurrency: usize) -> Self {
        Self {
            probe,
            query_timeout,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Polls every target and aggregates player totals over those that
    /// answered.
    pub async fn poll_status<T>(&self, targets: Vec<T>) -> StatusReport<T>
    where
        T: StatusTarget,
    {
        let entries = stream::iter(targets)
            .map(|target| async move {
                let outcome = self.query_one(&target).await;
                StatusEntry { target, outcome }
            })
            .buffered(self.max_concurrency)
            .collect::<Vec<_>>()
            .await;
        StatusReport::from_entries(entries)
    }

    async fn query_one<T>(&self, target: &T) -> StatusOutcome
    where
        T: StatusTarget,
    {
        let address = target.status_address();
        let result = tokio::time::timeout(self.query_timeout, self.probe.query(&address))
            .await
            .unwrap_or_else(|_| {
                Err(ProbeError::Timeout {
                    address: address.clone(),
                    after: self.query_timeout,
                })
            });
        match result {
            Ok(status) => StatusOutcome::Online(status),
            Err(error) => {
                debug!(%address, %error, "status query failed");
                StatusOutcome::unreachable(error.to_string())
            }
        }
    }
}
