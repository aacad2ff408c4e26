//! Statistics over catalog entries or solved records.
//!
//! The same group-by-count runs over either set. Only the grouping field
//! changes.

mod summary;

pub use summary::*;

use crate::catalog::CatalogEntry;
use crate::problem::Difficulty;
use crate::solved::SolvedRecord;

/// Anything that can be summarized.
pub trait StatsSource {
    fn difficulty(&self) -> Difficulty;

    /// Topic tags, empty when unknown.
    fn topic_tags(&self) -> &[String];
}

impl StatsSource for CatalogEntry {
    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    fn topic_tags(&self) -> &[String] {
        &self.topic_tags
    }
}

impl StatsSource for SolvedRecord {
    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    fn topic_tags(&self) -> &[String] {
        self.topic_tags.as_deref().unwrap_or(&[])
    }
}
