pub mod catalog;
pub mod catalog_source;
pub mod config;
pub mod enrich;
pub mod metrics;
pub mod problem;
pub mod solved;
pub mod stats;
pub mod sync;
pub mod testing;

pub use catalog::{CatalogEntry, CatalogError, CatalogStore, SqliteCatalogStore};
pub use catalog_source::{
    CatalogSource, CatalogSourceError, LeetCodeClient, LeetCodeConfig, RawCatalogItem,
};
pub use config::{
    config_path, load_config, load_config_from_str, validate_config, Config, ConfigError,
    DatabaseConfig, SanitizedConfig, ServerConfig, StatsConfig, CONFIG_PATH_ENV,
};
pub use enrich::{EnrichMode, Enricher, EnrichmentReport, LookupStrategy};
pub use problem::Difficulty;
pub use solved::{
    normalize_owner_id, ImportError, ImportReport, RawSolvedItem, SkippedRecord,
    SnapshotImporter, SolvedError, SolvedRecord, SolvedStore, SqliteSolvedStore,
};
pub use stats::{summarize, GroupingField, StatisticsSummary, StatsSource, TopicCount};
pub use sync::{CatalogSyncer, SyncConfig, SyncError, SyncErrorKind, SyncOutcome, SyncReport};
