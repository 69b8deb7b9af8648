//! Imports popular modpacks as server types.

use crate::hosting::{
    domain::{EnvironmentVar, HostingDomainError, ServerType},
    ports::{
        HostingRepository, HostingRepositoryError, ModpackDescriptor, ModpackSource,
        ModpackSourceError,
    },
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable carrying the catalogue pack identifier.
pub const MODPACK_ID_VAR: &str = "FTB_MODPACK_ID";
/// Environment variable carrying the catalogue version identifier.
pub const MODPACK_VERSION_ID_VAR: &str = "FTB_MODPACK_VERSION_ID";

/// Settings shared by every imported server type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModpackImportSettings {
    /// Number of popular packs requested.
    pub popular_limit: usize,
    /// Image every imported type runs.
    pub docker_image: String,
    /// Environment applied ahead of the pack identifiers.
    pub base_environment: Vec<EnvironmentVar>,
}

/// Server types touched by one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Types registered by this run.
    pub created: Vec<ServerType>,
    /// Types that were already registered.
    pub existing: Vec<ServerType>,
}

/// Service-level errors for modpack import.
#[derive(Debug, Clone, Error)]
pub enum ModpackImportError {
    /// A pack produced an invalid server type.
    #[error(transparent)]
    Domain(#[from] HostingDomainError),

    /// The catalogue request failed.
    #[error(transparent)]
    Source(#[from] ModpackSourceError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] HostingRepositoryError),
}

/// Result type for modpack import.
pub type ModpackImportResult<T> = Result<T, ModpackImportError>;

/// Get-or-creates one server type per popular modpack.
#[derive(Clone)]
pub struct ModpackImportService<R, S>
where
    R: HostingRepository,
    S: ModpackSource,
{
    repository: Arc<R>,
    source: Arc<S>,
    settings: ModpackImportSettings,
}

impl<R, S> ModpackImportService<R, S>
where
    R: HostingRepository,
    S: ModpackSource,
{
    /// Creates an import service.
    #[must_use]
    pub const fn new(repository: Arc<R>, source: Arc<S>, settings: ModpackImportSettings) -> Self {
        Self {
            repository,
            source,
            settings,
        }
    }

    /// Imports the most installed packs.
    ///
    /// Types are keyed by pack name and latest version name; packs with no
    /// published version are skipped.
    ///
    /// # Errors
    ///
    /// Returns the first catalogue, validation, or repository error. Types
    /// registered before it remain registered.
    pub async fn import_popular(&self) -> ModpackImportResult<ImportSummary> {
        let ids = self
            .source
            .popular_pack_ids(self.settings.popular_limit)
            .await?;
        let mut summary = ImportSummary::default();
        for id in ids {
            let pack = self.source.fetch_pack(id).await?;
            self.import_pack(&pack, &mut summary).await?;
        }
        info!(
            created = summary.created.len(),
            existing = summary.existing.len(),
            "modpack import finished"
        );
        Ok(summary)
    }

    async fn import_pack(
        &self,
        pack: &ModpackDescriptor,
        summary: &mut ImportSummary,
    ) -> ModpackImportResult<()> {
        let Some(version) = &pack.latest_version else {
            debug!(pack = pack.id, name = %pack.name, "modpack has no versions; skipped");
            return Ok(());
        };

        if let Some(existing) = self
            .repository
            .find_server_type_by_name(&pack.name, &version.name)
            .await?
        {
            summary.existing.push(existing);
            return Ok(());
        }

        let mut environment = self.settings.base_environment.clone();
        environment.push(EnvironmentVar::new(MODPACK_ID_VAR, pack.id.to_string())?);
        environment.push(EnvironmentVar::new(
            MODPACK_VERSION_ID_VAR,
            version.id.to_string(),
        )?);
        let server_type = ServerType::new(
            pack.name.as_str(),
            version.name.as_str(),
            self.settings.docker_image.as_str(),
        )?
        .with_environment(environment);
        self.repository.store_server_type(&server_type).await?;
        info!(server_type = %server_type, "modpack server type registered");
        summary.created.push(server_type);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hosting::{
        adapters::memory::InMemoryHostingRepository,
        ports::{ModpackSourceResult, ModpackVersion},
    };
    use async_trait::async_trait;
    use rstest::{fixture, rstest};
    use std::collections::HashMap;

    struct StubCatalogue {
        packs: HashMap<u64, ModpackDescriptor>,
        popular: Vec<u64>,
    }

    #[async_trait]
    impl ModpackSource for StubCatalogue {
        async fn popular_pack_ids(&self, limit: usize) -> ModpackSourceResult<Vec<u64>> {
            Ok(self.popular.iter().copied().take(limit).collect())
        }

        async fn fetch_pack(&self, id: u64) -> ModpackSourceResult<ModpackDescriptor> {
            self.packs
                .get(&id)
                .cloned()
                .ok_or(ModpackSourceError::Status { status: 404 })
        }
    }

    fn pack(id: u64, name: &str, version: Option<(u64, &str)>) -> ModpackDescriptor {
        ModpackDescriptor {
            id,
            name: name.to_owned(),
            latest_version: version.map(|(version_id, version_name)| ModpackVersion {
                id: version_id,
                name: version_name.to_owned(),
            }),
        }
    }

    #[fixture]
    fn catalogue() -> StubCatalogue {
        let packs = [
            pack(23, "FTB Academy", Some((2065, "1.3.0"))),
            pack(35, "FTB Revelation", Some((99, "3.6.0"))),
            pack(80, "Empty Pack", None),
        ];
        StubCatalogue {
            popular: packs.iter().map(|entry| entry.id).collect(),
            packs: packs.into_iter().map(|entry| (entry.id, entry)).collect(),
        }
    }

    fn settings() -> ModpackImportSettings {
        ModpackImportSettings {
            popular_limit: 20,
            docker_image: "itzg/minecraft-server:multiarch".to_owned(),
            base_environment: vec![
                EnvironmentVar::new("TYPE", "FTBA").expect("valid var"),
                EnvironmentVar::new("MEMORY", "4G").expect("valid var"),
            ],
        }
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn import_registers_each_versioned_pack_once(catalogue: StubCatalogue) {
        let repository = Arc::new(InMemoryHostingRepository::new());
        let service =
            ModpackImportService::new(Arc::clone(&repository), Arc::new(catalogue), settings());

        let first = service.import_popular().await.expect("import succeeds");
        assert_eq!(first.created.len(), 2);
        assert!(first.existing.is_empty());

        let second = service.import_popular().await.expect("import succeeds");
        assert!(second.created.is_empty());
        assert_eq!(second.existing, first.created);
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn imported_types_carry_pack_identifiers(catalogue: StubCatalogue) {
        let repository = Arc::new(InMemoryHostingRepository::new());
        let service =
            ModpackImportService::new(Arc::clone(&repository), Arc::new(catalogue), settings());
        service.import_popular().await.expect("import succeeds");

        let academy = repository
            .find_server_type_by_name("FTB Academy", "1.3.0")
            .await
            .expect("lookup")
            .expect("type registered");
        let rendered: Vec<String> = academy
            .environment()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            rendered,
            vec![
                "TYPE=FTBA",
                "MEMORY=4G",
                "FTB_MODPACK_ID=23",
                "FTB_MODPACK_VERSION_ID=2065"
            ]
        );
        assert_eq!(academy.docker_image(), "itzg/minecraft-server:multiarch");
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn catalogue_failures_propagate(mut catalogue: StubCatalogue) {
        catalogue.popular.push(404);
        let service = ModpackImportService::new(
            Arc::new(InMemoryHostingRepository::new()),
            Arc::new(catalogue),
            settings(),
        );

        let error = service.import_popular().await.expect_err("missing pack");
        assert!(matches!(
            error,
            ModpackImportError::Source(ModpackSourceError::Status { status: 404 })
        ));
    }
}
