//! Import, enrichment and statistics integration tests.
//!
//! Runs the downstream half of the pipeline against real SQLite stores:
//! sync the catalog from a mock source, import a solved snapshot, join
//! topic tags, then summarize.

use std::sync::Arc;

use tempfile::TempDir;

use drillbook_core::{
    summarize,
    testing::{fixtures, MockCatalogSource},
    CatalogSource, CatalogStore, CatalogSyncer, Difficulty, EnrichMode, Enricher, GroupingField,
    LookupStrategy, SnapshotImporter, SolvedStore, SqliteCatalogStore, SqliteSolvedStore,
    SyncConfig, SyncOutcome,
};

struct TestHarness {
    catalog: Arc<SqliteCatalogStore>,
    solved: Arc<SqliteSolvedStore>,
    importer: SnapshotImporter,
    _temp_dir: TempDir,
}

impl TestHarness {
    async fn with_synced_catalog() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("drillbook.db");
        let catalog = Arc::new(SqliteCatalogStore::new(&db_path).unwrap());
        let solved = Arc::new(SqliteSolvedStore::new(&db_path).unwrap());

        let source = Arc::new(MockCatalogSource::new());
        source
            .set_items(vec![
                fixtures::raw_item("two-sum", "Easy", &["Array", "Hash Table"]),
                fixtures::raw_item("valid-parentheses", "Easy", &["String", "Stack"]),
                fixtures::raw_item("lru-cache", "Medium", &["Hash Table", "Design"]),
                fixtures::raw_item("median-of-two-sorted-arrays", "Hard", &["Array", "Binary Search"]),
            ])
            .await;

        let syncer = CatalogSyncer::new(
            source as Arc<dyn CatalogSource>,
            Arc::clone(&catalog) as Arc<dyn CatalogStore>,
            SyncConfig {
                page_size: 2,
                page_delay_ms: 0,
                ..Default::default()
            },
        );
        let report = syncer.run().await;
        assert_eq!(report.outcome, SyncOutcome::Completed);

        let importer = SnapshotImporter::new(Arc::clone(&solved) as Arc<dyn SolvedStore>);

        Self {
            catalog,
            solved,
            importer,
            _temp_dir: temp_dir,
        }
    }

    fn enricher(&self, strategy: LookupStrategy) -> Enricher {
        Enricher::new(
            Arc::clone(&self.catalog) as Arc<dyn CatalogStore>,
            Arc::clone(&self.solved) as Arc<dyn SolvedStore>,
        )
        .with_strategy(strategy)
    }
}

#[tokio::test]
async fn test_import_skips_record_without_slug() {
    let harness = TestHarness::with_synced_catalog().await;
    let raw = r#"[
        {"id": 1, "title": "Two Sum", "titleSlug": "two-sum", "difficulty": "Easy", "status": "ac"},
        {"id": 20, "title": "Valid Parentheses", "difficulty": "Easy", "status": "ac"},
        {"id": 146, "title": "LRU Cache", "titleSlug": "lru-cache", "difficulty": "Medium", "status": "ac"}
    ]"#;

    let report = harness.importer.import_snapshot("alice", raw).await.unwrap();

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.skipped_records[0].index, 1);
    assert_eq!(harness.solved.list_for_owner("alice").unwrap().len(), 2);
}

#[tokio::test]
async fn test_untrimmed_owner_round_trips() {
    let harness = TestHarness::with_synced_catalog().await;
    let raw = r#"[{"slug": "two-sum", "titleSlug": "two-sum", "difficulty": "Easy"}]"#;

    let report = harness.importer.import_snapshot(" alice", raw).await.unwrap();
    assert_eq!(report.owner_id, "alice");
    assert_eq!(report.succeeded, 1);

    let enriched = harness
        .enricher(LookupStrategy::PointLookup)
        .enrich_all(" alice", EnrichMode::MissingOnly)
        .await
        .unwrap();
    assert_eq!(enriched.scanned, 1);
    assert_eq!(enriched.enriched, 1);

    let records = harness.solved.list_for_owner(" alice").unwrap();
    let summary = summarize(&records, GroupingField::TopicTags, 5);
    assert_eq!(summary.total_count, 1);
    assert_eq!(summary.top_topics.len(), 2);
}

#[tokio::test]
async fn test_enrichment_is_idempotent() {
    let harness = TestHarness::with_synced_catalog().await;
    let snapshot = fixtures::solved_snapshot(&[
        ("two-sum", "Easy"),
        ("lru-cache", "Medium"),
        ("deleted-problem", "Hard"),
    ]);
    harness.importer.import_snapshot("alice", &snapshot).await.unwrap();

    let enricher = harness.enricher(LookupStrategy::PointLookup);
    let first = enricher.enrich_all("alice", EnrichMode::MissingOnly).await.unwrap();
    let after_first = harness.solved.list_for_owner("alice").unwrap();

    let second = enricher.enrich_all("alice", EnrichMode::Force).await.unwrap();
    let after_second = harness.solved.list_for_owner("alice").unwrap();

    assert_eq!(first.enriched, 2);
    assert_eq!(first.unmatched, 1);
    assert_eq!(second.unmatched, 1);
    assert_eq!(after_first, after_second);

    let lru = harness.solved.get("alice", "lru-cache").unwrap().unwrap();
    assert_eq!(
        lru.topic_tags,
        Some(vec!["Hash Table".to_string(), "Design".to_string()])
    );
}

#[tokio::test]
async fn test_preloaded_and_point_lookup_agree() {
    let harness = TestHarness::with_synced_catalog().await;
    let snapshot = fixtures::solved_snapshot(&[("two-sum", "Easy"), ("valid-parentheses", "Easy")]);
    harness.importer.import_snapshot("alice", &snapshot).await.unwrap();
    harness.importer.import_snapshot("bob", &snapshot).await.unwrap();

    harness
        .enricher(LookupStrategy::PointLookup)
        .enrich_all("alice", EnrichMode::MissingOnly)
        .await
        .unwrap();
    harness
        .enricher(LookupStrategy::Preloaded)
        .enrich_all("bob", EnrichMode::MissingOnly)
        .await
        .unwrap();

    let tags = |owner: &str| {
        harness
            .solved
            .list_for_owner(owner)
            .unwrap()
            .into_iter()
            .map(|r| (r.slug, r.topic_tags))
            .collect::<Vec<_>>()
    };
    assert_eq!(tags("alice"), tags("bob"));
}

#[tokio::test]
async fn test_reimport_then_enrich_and_summarize() {
    let harness = TestHarness::with_synced_catalog().await;
    harness
        .importer
        .import_snapshot(
            "alice",
            &fixtures::solved_snapshot(&[("two-sum", "Easy"), ("lru-cache", "Medium")]),
        )
        .await
        .unwrap();

    // Updated snapshot replaces the previous one entirely
    harness
        .importer
        .import_snapshot(
            "alice",
            &fixtures::solved_snapshot(&[
                ("two-sum", "Easy"),
                ("valid-parentheses", "Easy"),
                ("lru-cache", "Medium"),
                ("median-of-two-sorted-arrays", "Hard"),
            ]),
        )
        .await
        .unwrap();

    harness
        .enricher(LookupStrategy::PointLookup)
        .enrich_all("alice", EnrichMode::MissingOnly)
        .await
        .unwrap();

    let records = harness.solved.list_for_owner("alice").unwrap();
    let summary = summarize(&records, GroupingField::TopicTags, 2);

    assert_eq!(summary.total_count, 4);
    assert_eq!(summary.count_by_difficulty[&Difficulty::Easy], 2);
    assert_eq!(summary.count_by_difficulty[&Difficulty::Medium], 1);
    assert_eq!(summary.count_by_difficulty[&Difficulty::Hard], 1);

    // Records are listed by slug: lru-cache, median-..., two-sum, valid-parentheses
    let top: Vec<(&str, u64)> = summary
        .top_topics
        .iter()
        .map(|t| (t.topic.as_str(), t.count))
        .collect();
    assert_eq!(top, vec![("Hash Table", 2), ("Array", 2)]);

    // SQL grouping agrees with the in-memory one
    assert_eq!(
        harness.solved.count_by_difficulty("alice").unwrap(),
        summary.count_by_difficulty
    );
}

#[tokio::test]
async fn test_catalog_summary_by_difficulty() {
    let harness = TestHarness::with_synced_catalog().await;
    let entries = harness.catalog.list(100, 0).unwrap();

    let summary = summarize(&entries, GroupingField::Difficulty, 10);

    assert_eq!(summary.total_count, 4);
    let top: Vec<(&str, u64)> = summary
        .top_topics
        .iter()
        .map(|t| (t.topic.as_str(), t.count))
        .collect();
    assert_eq!(top, vec![("Easy", 2), ("Medium", 1), ("Hard", 1)]);
    assert_eq!(
        harness.catalog.count_by_difficulty().unwrap(),
        summary.count_by_difficulty
    );
}
