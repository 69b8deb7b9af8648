//! Port contracts for hosting persistence and external collaborators.

pub mod modpack;
pub mod owners;
pub mod repository;

pub use modpack::{
    ModpackDescriptor, ModpackSource, ModpackSourceError, ModpackSourceResult, ModpackVersion,
};
pub use owners::{OwnerDirectory, OwnerDirectoryError, OwnerDirectoryResult};
pub use repository::{HostingRepository, HostingRepositoryError, HostingRepositoryResult};
