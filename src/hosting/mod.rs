//! Game server hosting bounded context.
//!
//! Owns hosts, server types, and provisioned servers together with the
//! quota and port-allocation rules that govern them. The orchestrator ties
//! persistence to the container and status contexts.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
