use serde::{Deserialize, Serialize};

/// Which records an enrichment pass visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichMode {
    /// Only records that have never been enriched.
    #[default]
    MissingOnly,
    /// Every record of the owner.
    Force,
}

/// How catalog entries are looked up during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStrategy {
    /// One indexed lookup per record.
    #[default]
    PointLookup,
    /// Load the whole slug → tags map once, then join in memory.
    Preloaded,
}

/// Result of one enrichment pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichmentReport {
    pub owner_id: String,
    /// Records visited.
    pub scanned: u64,
    /// Records whose tags were written.
    pub enriched: u64,
    /// Records with no catalog entry.
    pub unmatched: u64,
    /// Records whose lookup or write failed.
    pub failed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
