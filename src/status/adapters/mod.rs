//! Adapter implementations for the game status probe port.

mod memory;
mod slp;
mod varint;

pub use memory::InMemoryStatusProbe;
pub use slp::{DEFAULT_PROTOCOL_VERSION, ServerListPingProbe};
