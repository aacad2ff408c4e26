//! Solved store trait definition.

use std::collections::BTreeMap;

use super::{SolvedError, SolvedRecord};
use crate::problem::Difficulty;

/// Trait for solved-record storage, keyed by (slug, owner).
pub trait SolvedStore: Send + Sync {
    /// Replace every record of `owner_id` with `records` in one transaction.
    ///
    /// Returns the number of records written.
    fn replace_for_owner(&self, owner_id: &str, records: &[SolvedRecord])
        -> Result<u64, SolvedError>;

    /// All records of an owner, ordered by slug.
    fn list_for_owner(&self, owner_id: &str) -> Result<Vec<SolvedRecord>, SolvedError>;

    /// Records of an owner that have no topic tags yet.
    fn list_unenriched(&self, owner_id: &str) -> Result<Vec<SolvedRecord>, SolvedError>;

    /// Get one record.
    fn get(&self, owner_id: &str, slug: &str) -> Result<Option<SolvedRecord>, SolvedError>;

    /// Overwrite the topic tags of one record.
    ///
    /// Fails with `SolvedError::NotFound` if the record doesn't exist.
    fn set_topic_tags(&self, owner_id: &str, slug: &str, tags: &[String])
        -> Result<(), SolvedError>;

    /// Record counts of an owner grouped by difficulty.
    fn count_by_difficulty(&self, owner_id: &str)
        -> Result<BTreeMap<Difficulty, u64>, SolvedError>;
}
