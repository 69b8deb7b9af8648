//! `PostgreSQL` adapters for hosting persistence.

mod models;
mod repository;
mod schema;

pub use repository::{HostingPgPool, PostgresHostingRepository};
