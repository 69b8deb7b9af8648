//! In-memory adapters for hosting persistence and owner lookup.

mod owners;
mod repository;

pub use owners::InMemoryOwnerDirectory;
pub use repository::InMemoryHostingRepository;
