//! Port contracts for container runtimes.

pub mod runtime;

pub use runtime::{ContainerRuntime, ContainerRuntimeError, ContainerRuntimeResult};
