//! Diesel row models for hosting persistence.

use super::schema::{hosts, server_types, servers};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Row model for host records, used for both reads and upserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = hosts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct HostRow {
    /// Unique network name.
    pub name: String,
    /// Whether the host accepts new servers.
    pub enabled: bool,
    /// Inclusive lower port bound.
    pub min_port: i32,
    /// Exclusive upper port bound.
    pub max_port: i32,
    /// Maximum number of servers on the host.
    pub server_limit: i32,
}

/// Row model for server type records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = server_types)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ServerTypeRow {
    /// Internal identifier.
    pub id: uuid::Uuid,
    /// Display name.
    pub name: String,
    /// Version label.
    pub version: String,
    /// Container image reference.
    pub docker_image: String,
    /// Environment entries payload.
    pub environment: Value,
    /// Whether the type is enabled.
    pub enabled: bool,
}

/// Query result row for server records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = servers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ServerRow {
    /// Internal identifier.
    pub id: uuid::Uuid,
    /// Unique server name.
    pub name: String,
    /// Owning account username.
    pub owner: String,
    /// Host name.
    pub host_name: String,
    /// Assigned port.
    pub port: i32,
    /// Server type identifier.
    pub server_type_id: uuid::Uuid,
    /// Game mode code.
    pub game_type: i32,
    /// Operator allow-list payload.
    pub operators: Value,
    /// Lifecycle state.
    pub lifecycle_state: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for server records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = servers)]
pub struct NewServerRow {
    /// Internal identifier.
    pub id: uuid::Uuid,
    /// Unique server name.
    pub name: String,
    /// Owning account username.
    pub owner: String,
    /// Host name.
    pub host_name: String,
    /// Assigned port.
    pub port: i32,
    /// Server type identifier.
    pub server_type_id: uuid::Uuid,
    /// Game mode code.
    pub game_type: i32,
    /// Operator allow-list payload.
    pub operators: Value,
    /// Lifecycle state.
    pub lifecycle_state: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
