//! Service layer orchestrating hosting use cases.

mod capacity;
mod modpack;
mod orchestrator;

pub use capacity::CapacityGate;
pub use modpack::{
    ImportSummary, MODPACK_ID_VAR, MODPACK_VERSION_ID_VAR, ModpackImportError,
    ModpackImportResult, ModpackImportService, ModpackImportSettings,
};
pub use orchestrator::{
    CreateServerRequest, OrchestratorError, OrchestratorResult, ServerDetail, ServerOrchestrator,
};
