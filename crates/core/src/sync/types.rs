//! Sync run results and errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::catalog::CatalogError;
use crate::catalog_source::CatalogSourceError;

/// How a sync run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// An empty page was reached.
    Completed,
    /// The offset ceiling was reached before an empty page.
    CompletedWithWarning,
    /// A batch-level error stopped the run. Pages committed before the
    /// failure stay in the catalog.
    Aborted,
}

impl SyncOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncOutcome::Completed => "completed",
            SyncOutcome::CompletedWithWarning => "completed_with_warning",
            SyncOutcome::Aborted => "aborted",
        }
    }
}

/// Category of the error that aborted a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncErrorKind {
    Network,
    Protocol,
    Consistency,
    Store,
}

/// Batch-level errors that abort a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Network failure at offset {offset} after {attempts} attempts: {source}")]
    RetriesExhausted {
        offset: u32,
        attempts: u32,
        source: CatalogSourceError,
    },

    #[error("Catalog source failed at offset {offset}: {source}")]
    Source {
        offset: u32,
        source: CatalogSourceError,
    },

    #[error("Duplicate slug in fetched catalog: {0}")]
    Consistency(String),

    #[error("Catalog store error: {0}")]
    Store(CatalogError),
}

impl SyncError {
    pub fn kind(&self) -> SyncErrorKind {
        match self {
            SyncError::RetriesExhausted { .. } => SyncErrorKind::Network,
            SyncError::Source { .. } => SyncErrorKind::Protocol,
            SyncError::Consistency(_) => SyncErrorKind::Consistency,
            SyncError::Store(_) => SyncErrorKind::Store,
        }
    }
}

impl From<CatalogError> for SyncError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Consistency { slug } => SyncError::Consistency(slug),
            other => SyncError::Store(other),
        }
    }
}

/// Result of one sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    /// Identifier of this run (for log correlation).
    pub run_id: Uuid,
    /// How the run ended.
    pub outcome: SyncOutcome,
    /// Entries written to the catalog.
    pub succeeded: u64,
    /// Raw items dropped as invalid.
    pub skipped: u64,
    /// Pages that could not be committed.
    pub failed: u64,
    /// Why the run did not complete cleanly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Category of the aborting error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<SyncErrorKind>,
    /// Non-empty pages fetched.
    pub pages_fetched: u64,
    /// Fetch retries performed.
    pub retries: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    pub(crate) fn start() -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            outcome: SyncOutcome::Completed,
            succeeded: 0,
            skipped: 0,
            failed: 0,
            reason: None,
            error_kind: None,
            pages_fetched: 0,
            retries: 0,
            started_at: now,
            finished_at: now,
        }
    }

    /// Whether the catalog now holds a complete (or ceiling-capped) copy.
    pub fn is_complete(&self) -> bool {
        self.outcome != SyncOutcome::Aborted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serialization() {
        assert_eq!(
            serde_json::to_string(&SyncOutcome::CompletedWithWarning).unwrap(),
            "\"completed_with_warning\""
        );
        assert_eq!(SyncOutcome::Aborted.as_str(), "aborted");
    }

    #[test]
    fn test_catalog_consistency_maps_to_sync_consistency() {
        let err: SyncError = CatalogError::Consistency {
            slug: "two-sum".to_string(),
        }
        .into();
        assert_eq!(err.kind(), SyncErrorKind::Consistency);

        let err: SyncError = CatalogError::Database("locked".to_string()).into();
        assert_eq!(err.kind(), SyncErrorKind::Store);
    }

    #[test]
    fn test_report_skips_empty_reason() {
        let report = SyncReport::start();
        let json = serde_json::to_string(&report).unwrap();
        assert!(!json.contains("reason"));
        assert!(json.contains("run_id"));
        assert!(report.is_complete());
    }
}
