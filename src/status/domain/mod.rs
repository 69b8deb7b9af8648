//! Domain model for live game status.

mod address;
mod report;

pub use address::{ParseServerAddressError, ServerAddress, StatusTarget};
pub use report::{ServerStatus, StatusEntry, StatusOutcome, StatusReport};
