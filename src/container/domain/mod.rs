//! Domain model for container launches and operation outcomes.

mod error;
mod launch;
mod outcome;

pub use error::ContainerDomainError;
pub use launch::{ContainerSpec, LaunchSettings, RestartPolicy, VolumeBinding};
pub use outcome::{LOGS_UNAVAILABLE, OperationResult, RESTART_FAILED, RESTART_SUCCEEDED};
