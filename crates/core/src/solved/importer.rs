//! Solved-set snapshot import.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{
    normalize_owner_id, ImportError, ImportReport, RawSolvedItem, SkippedRecord, SolvedRecord,
    SolvedStore,
};
use crate::metrics;
use crate::problem::{normalize_acceptance_rate, normalize_slug, Difficulty};

/// Keys under which a wrapped snapshot may carry its record list.
const WRAPPER_KEYS: [&str; 2] = ["questions", "problems"];

/// Imports captured solved-set snapshots, replacing an owner's records.
pub struct SnapshotImporter {
    store: Arc<dyn SolvedStore>,
}

impl SnapshotImporter {
    pub fn new(store: Arc<dyn SolvedStore>) -> Self {
        Self { store }
    }

    /// Parse a raw snapshot and import it for `owner_id`.
    ///
    /// A snapshot whose overall structure is wrong fails with
    /// `ImportError::Parse`. Individual bad records are skipped and listed
    /// in the report.
    pub async fn import_snapshot(
        &self,
        owner_id: &str,
        raw: &str,
    ) -> Result<ImportReport, ImportError> {
        let result = self.parse_and_import(owner_id, raw);
        record_run(&result);
        result
    }

    /// Import records that were already decoded.
    pub async fn import_records(
        &self,
        owner_id: &str,
        items: Vec<RawSolvedItem>,
    ) -> Result<ImportReport, ImportError> {
        let result = check_owner(owner_id).and_then(|owner| {
            let report = ImportReport::new(owner);
            self.write(owner, items.into_iter().map(Some).collect(), report)
        });
        record_run(&result);
        result
    }

    fn parse_and_import(&self, owner_id: &str, raw: &str) -> Result<ImportReport, ImportError> {
        let owner = check_owner(owner_id)?;
        let values = parse_snapshot(raw)?;
        let mut report = ImportReport::new(owner);

        let mut items = Vec::with_capacity(values.len());
        for (index, value) in values.into_iter().enumerate() {
            match serde_json::from_value::<RawSolvedItem>(value) {
                Ok(item) => items.push(Some(item)),
                Err(e) => {
                    warn!(owner_id = owner, index, "Undecodable snapshot record: {}", e);
                    report.failed += 1;
                    report.skipped_records.push(SkippedRecord {
                        index,
                        reason: format!("undecodable record: {}", e),
                    });
                    items.push(None);
                }
            }
        }

        self.write(owner, items, report)
    }

    /// Validate, collapse duplicates and replace the owner's records.
    ///
    /// `None` marks a position whose record already failed to decode.
    fn write(
        &self,
        owner: &str,
        items: Vec<Option<RawSolvedItem>>,
        mut report: ImportReport,
    ) -> Result<ImportReport, ImportError> {
        let solved_at = Utc::now();
        let mut records: Vec<SolvedRecord> = Vec::with_capacity(items.len());
        let mut position_by_slug: HashMap<String, usize> = HashMap::new();

        for (index, item) in items.into_iter().enumerate() {
            let Some(item) = item else { continue };

            let record = match to_record(owner, item, solved_at) {
                Ok(record) => record,
                Err(reason) => {
                    warn!(owner_id = owner, index, "Skipping snapshot record: {}", reason);
                    report.skipped += 1;
                    report.skipped_records.push(SkippedRecord { index, reason });
                    continue;
                }
            };

            match position_by_slug.get(&record.slug) {
                Some(&pos) => {
                    debug!(owner_id = owner, slug = %record.slug, "Collapsing duplicate slug");
                    report.collapsed += 1;
                    records[pos] = record;
                }
                None => {
                    position_by_slug.insert(record.slug.clone(), records.len());
                    records.push(record);
                }
            }
        }

        report.skipped_records.sort_by_key(|s| s.index);
        report.succeeded = self.store.replace_for_owner(owner, &records)?;

        metrics::IMPORT_RECORDS
            .with_label_values(&["imported"])
            .inc_by(report.succeeded);
        metrics::IMPORT_RECORDS
            .with_label_values(&["skipped"])
            .inc_by(report.skipped + report.failed);
        metrics::IMPORT_RECORDS
            .with_label_values(&["collapsed"])
            .inc_by(report.collapsed);

        if report.skipped + report.failed > 0 {
            report.reason = Some(format!(
                "{} record(s) could not be imported",
                report.skipped + report.failed
            ));
        }

        info!(
            owner_id = owner,
            imported = report.succeeded,
            skipped = report.skipped,
            failed = report.failed,
            collapsed = report.collapsed,
            "Solved snapshot imported"
        );

        Ok(report)
    }
}

fn check_owner(owner_id: &str) -> Result<&str, ImportError> {
    normalize_owner_id(owner_id).ok_or_else(|| ImportError::Parse("owner id is empty".to_string()))
}

fn record_run(result: &Result<ImportReport, ImportError>) {
    let label = if result.is_ok() { "success" } else { "failed" };
    metrics::IMPORT_RUNS.with_label_values(&[label]).inc();
}

/// Split a snapshot into per-record JSON values.
///
/// Accepts a bare array or an object wrapping the array under a known key.
fn parse_snapshot(raw: &str) -> Result<Vec<Value>, ImportError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| ImportError::Parse(e.to_string()))?;

    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => {
            for key in WRAPPER_KEYS {
                if let Some(Value::Array(items)) = map.remove(key) {
                    return Ok(items);
                }
            }
            Err(ImportError::Parse(format!(
                "expected a record array under one of {:?}",
                WRAPPER_KEYS
            )))
        }
        other => Err(ImportError::Parse(format!(
            "expected an array or object, got {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn to_record(
    owner: &str,
    item: RawSolvedItem,
    solved_at: chrono::DateTime<Utc>,
) -> Result<SolvedRecord, String> {
    let frontend_id = item.frontend_id();

    let raw_slug = item.slug().ok_or_else(|| "missing slug".to_string())?;
    let slug = normalize_slug(raw_slug).ok_or_else(|| format!("unusable slug '{}'", raw_slug))?;

    let difficulty = item
        .difficulty
        .as_deref()
        .ok_or_else(|| "missing difficulty".to_string())?
        .parse::<Difficulty>()?;

    let title = item
        .title
        .as_deref()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| slug.clone());

    let status = item
        .status
        .as_deref()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "ac".to_string());

    Ok(SolvedRecord {
        slug,
        owner_id: owner.to_string(),
        title,
        difficulty,
        status,
        acceptance_rate: item
            .acceptance_rate()
            .map(normalize_acceptance_rate)
            .unwrap_or(0.0),
        is_paywalled: item.paid_only().unwrap_or(false),
        solved_at,
        topic_tags: None,
        frontend_id,
    })
}
