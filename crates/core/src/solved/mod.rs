//! Solved sets: per-owner records of solved problems.
//!
//! A solved set is imported from a captured snapshot and fully replaces
//! whatever the owner had before. Records start without topic tags; the
//! enrichment pass fills them in from the catalog.

mod importer;
mod sqlite_store;
mod store;
mod types;

pub use importer::SnapshotImporter;
pub use sqlite_store::SqliteSolvedStore;
pub use store::SolvedStore;
pub use types::*;
