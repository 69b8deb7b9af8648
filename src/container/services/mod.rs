//! Service layer for container lifecycle operations.

mod lifecycle;

pub use lifecycle::{ContainerLifecycleClient, ContainerLifecycleError, ContainerLifecycleResult};
