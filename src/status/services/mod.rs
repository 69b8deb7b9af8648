//! Service layer for status polling.

mod poller;

pub use poller::StatusPoller;
