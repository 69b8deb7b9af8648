//! Wrangler: game server hosting control plane.
//!
//! Provisions containerised Minecraft servers across a fleet of hosts,
//! enforces per-owner and per-host quotas, assigns unique ports, and reports
//! live status gathered over the game's own status protocol.
//!
//! # Architecture
//!
//! Each bounded context follows hexagonal architecture:
//!
//! - **Domain**: Pure business rules with no infrastructure dependencies
//! - **Ports**: Trait interfaces onto storage and remote systems
//! - **Adapters**: Concrete implementations (Diesel, Docker Engine HTTP,
//!   Server List Ping, in-memory)
//! - **Services**: Use cases composed from ports
//!
//! # Modules
//!
//! - [`hosting`]: Hosts, server types, servers, quotas, and orchestration
//! - [`container`]: Container launch specs and lifecycle control
//! - [`status`]: Live status queries and aggregation
//! - [`config`]: Explicit service configuration
//! - [`telemetry`]: Logging setup

pub mod config;
pub mod container;
pub mod hosting;
pub mod status;
pub mod telemetry;
