//! Adapter implementations for the container runtime port.

mod docker;
mod memory;

pub use docker::DockerEngineRuntime;
pub use memory::InMemoryContainerRuntime;
