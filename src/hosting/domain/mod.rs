//! Domain model for hosts, server types, and provisioned servers.
//!
//! The hosting domain owns the port-allocation and capacity rules. Storage,
//! container runtimes, and status protocols remain outside this boundary.

mod allocation;
mod error;
mod game_type;
mod host;
mod ids;
mod owner;
mod server;
mod server_type;

pub use allocation::{allocate_port, host_accepts_server, owner_may_create, resolve_port};
pub use error::{HostingDomainError, ParseGameTypeError, ParseServerLifecycleStateError};
pub use game_type::GameType;
pub use host::{Host, PortRange};
pub use ids::{HostName, PlayerName, ServerId, ServerName, ServerTypeId, Username};
pub use owner::Owner;
pub use server::{PersistedServerData, Server, ServerDraft, ServerLifecycleState};
pub use server_type::{EnvironmentVar, ServerType};
