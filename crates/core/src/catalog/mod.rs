//! Local copy of the external problem catalog.
//!
//! The catalog is replaced wholesale on every sync: cleared once when the
//! sync starts, then appended to page by page. A sync that dies halfway
//! leaves a consistent prefix of the freshest data.
//!
//! Only one sync may write to the catalog at a time. That is a precondition
//! for callers, not something the store enforces.

mod sqlite;
mod types;

pub use sqlite::SqliteCatalogStore;
pub use types::*;

use std::collections::{BTreeMap, HashMap};

use crate::problem::Difficulty;

/// Trait for catalog storage.
pub trait CatalogStore: Send + Sync {
    /// Remove every entry.
    fn clear(&self) -> Result<(), CatalogError>;

    /// Append one batch of entries.
    ///
    /// The batch is written atomically. A slug that is already stored, or
    /// that appears twice in the batch, fails the whole batch with
    /// `CatalogError::Consistency`.
    ///
    /// Returns the number of entries written.
    fn append_batch(&self, entries: &[CatalogEntry]) -> Result<u64, CatalogError>;

    /// Clear and append in a single transaction.
    fn replace_all(&self, entries: &[CatalogEntry]) -> Result<u64, CatalogError>;

    /// Point lookup by slug.
    fn find_by_slug(&self, slug: &str) -> Result<Option<CatalogEntry>, CatalogError>;

    /// List entries in fetch order.
    fn list(&self, limit: u32, offset: u32) -> Result<Vec<CatalogEntry>, CatalogError>;

    /// Number of stored entries.
    fn count(&self) -> Result<u64, CatalogError>;

    /// Entry counts grouped by difficulty.
    fn count_by_difficulty(&self) -> Result<BTreeMap<Difficulty, u64>, CatalogError>;

    /// Map of slug to topic tags for every entry.
    fn topic_index(&self) -> Result<HashMap<String, Vec<String>>, CatalogError>;
}
