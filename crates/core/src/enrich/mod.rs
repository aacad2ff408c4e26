//! Enrichment: copy topic tags from the catalog onto solved records.
//!
//! Each record is joined independently by slug. A record with no catalog
//! match is left as it is, and a failure on one record never blocks the
//! others. Running enrichment twice yields the same end state.

mod enricher;
mod types;

pub use enricher::Enricher;
pub use types::*;
