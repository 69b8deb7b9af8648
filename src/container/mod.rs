//! Container runtime bounded context.
//!
//! Builds launch specifications for provisioned servers and drives the
//! remote container runtime on each host through the [`ports::ContainerRuntime`]
//! port.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
