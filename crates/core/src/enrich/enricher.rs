use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{EnrichMode, EnrichmentReport, LookupStrategy};
use crate::catalog::{CatalogError, CatalogStore};
use crate::metrics;
use crate::solved::{normalize_owner_id, SolvedError, SolvedRecord, SolvedStore};

/// Joins solved records against the catalog by slug.
pub struct Enricher {
    catalog: Arc<dyn CatalogStore>,
    solved: Arc<dyn SolvedStore>,
    strategy: LookupStrategy,
}

impl Enricher {
    pub fn new(catalog: Arc<dyn CatalogStore>, solved: Arc<dyn SolvedStore>) -> Self {
        Self {
            catalog,
            solved,
            strategy: LookupStrategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: LookupStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Enrich the records of `owner_id`.
    ///
    /// Only a failure to list the owner's records is returned as an error.
    /// Per-record failures are counted in the report.
    pub async fn enrich_all(
        &self,
        owner_id: &str,
        mode: EnrichMode,
    ) -> Result<EnrichmentReport, SolvedError> {
        let owner_id = normalize_owner_id(owner_id).unwrap_or_default();
        let records = match mode {
            EnrichMode::MissingOnly => self.solved.list_unenriched(owner_id)?,
            EnrichMode::Force => self.solved.list_for_owner(owner_id)?,
        };

        let mut report = EnrichmentReport {
            owner_id: owner_id.to_string(),
            ..Default::default()
        };

        let index = match self.strategy {
            LookupStrategy::PointLookup => None,
            LookupStrategy::Preloaded => match self.catalog.topic_index() {
                Ok(index) => Some(index),
                Err(e) => {
                    warn!(
                        owner_id,
                        "Failed to preload catalog topics, using point lookups: {}", e
                    );
                    None
                }
            },
        };

        for record in &records {
            report.scanned += 1;

            let tags = match self.lookup(index.as_ref(), &record.slug) {
                Ok(Some(tags)) => tags,
                Ok(None) => {
                    debug!(owner_id, slug = %record.slug, "No catalog entry for solved record");
                    report.unmatched += 1;
                    metrics::ENRICHMENT_RECORDS
                        .with_label_values(&["unmatched"])
                        .inc();
                    continue;
                }
                Err(e) => {
                    warn!(owner_id, slug = %record.slug, "Catalog lookup failed: {}", e);
                    self.count_failure(&mut report);
                    continue;
                }
            };

            match self.apply(record, &tags) {
                Ok(()) => {
                    report.enriched += 1;
                    metrics::ENRICHMENT_RECORDS
                        .with_label_values(&["enriched"])
                        .inc();
                }
                Err(e) => {
                    warn!(owner_id, slug = %record.slug, "Failed to write topic tags: {}", e);
                    self.count_failure(&mut report);
                }
            }
        }

        if report.failed > 0 {
            report.reason = Some(format!("{} record(s) could not be enriched", report.failed));
        }

        info!(
            owner_id,
            scanned = report.scanned,
            enriched = report.enriched,
            unmatched = report.unmatched,
            failed = report.failed,
            "Enrichment finished"
        );

        Ok(report)
    }

    fn lookup(
        &self,
        index: Option<&HashMap<String, Vec<String>>>,
        slug: &str,
    ) -> Result<Option<Vec<String>>, CatalogError> {
        match index {
            Some(index) => Ok(index.get(slug).cloned()),
            None => Ok(self.catalog.find_by_slug(slug)?.map(|e| e.topic_tags)),
        }
    }

    /// Write tags unless the record already carries exactly these.
    fn apply(&self, record: &SolvedRecord, tags: &[String]) -> Result<(), SolvedError> {
        if record.topic_tags.as_deref() == Some(tags) {
            return Ok(());
        }
        self.solved
            .set_topic_tags(&record.owner_id, &record.slug, tags)
    }

    fn count_failure(&self, report: &mut EnrichmentReport) {
        report.failed += 1;
        metrics::ENRICHMENT_RECORDS
            .with_label_values(&["failed"])
            .inc();
    }
}
