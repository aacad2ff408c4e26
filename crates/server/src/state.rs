use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};

use drillbook_core::{
    CatalogStore, CatalogSyncer, Config, Enricher, LookupStrategy, SanitizedConfig,
    SnapshotImporter, SolvedStore,
};

/// Shared application state
pub struct AppState {
    config: Config,
    catalog: Arc<dyn CatalogStore>,
    solved: Arc<dyn SolvedStore>,
    syncer: CatalogSyncer,
    importer: SnapshotImporter,
    /// Written for the duration of a catalog sync, read by enrichment runs.
    /// Enrichment must never see a half-replaced catalog.
    catalog_lock: RwLock<()>,
}

impl AppState {
    pub fn new(
        config: Config,
        catalog: Arc<dyn CatalogStore>,
        solved: Arc<dyn SolvedStore>,
        syncer: CatalogSyncer,
    ) -> Self {
        let importer = SnapshotImporter::new(Arc::clone(&solved));
        Self {
            config,
            catalog,
            solved,
            syncer,
            importer,
            catalog_lock: RwLock::new(()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn catalog(&self) -> &dyn CatalogStore {
        self.catalog.as_ref()
    }

    pub fn solved_store(&self) -> &dyn SolvedStore {
        self.solved.as_ref()
    }

    pub fn syncer(&self) -> &CatalogSyncer {
        &self.syncer
    }

    pub fn importer(&self) -> &SnapshotImporter {
        &self.importer
    }

    /// Claim exclusive use of the catalog for a sync. Fails while another
    /// sync or any enrichment is running.
    pub fn try_begin_sync(&self) -> Result<RwLockWriteGuard<'_, ()>, TryLockError> {
        self.catalog_lock.try_write()
    }

    /// Claim shared use of the catalog for enrichment. Fails while a sync
    /// is running; enrichments may overlap each other.
    pub fn try_begin_enrich(&self) -> Result<RwLockReadGuard<'_, ()>, TryLockError> {
        self.catalog_lock.try_read()
    }

    pub fn enricher(&self, strategy: LookupStrategy) -> Enricher {
        Enricher::new(Arc::clone(&self.catalog), Arc::clone(&self.solved)).with_strategy(strategy)
    }
}
