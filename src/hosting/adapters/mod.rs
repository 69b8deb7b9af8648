//! Adapter implementations for hosting persistence and modpack catalogues.

pub mod memory;
pub mod postgres;

mod ftb;

pub use ftb::FtbModpackSource;
