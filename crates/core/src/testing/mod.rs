//! Testing utilities and mock implementations.
//!
//! `MockCatalogSource` stands in for the remote catalog so the sync driver
//! can be exercised without network access. The in-memory SQLite stores
//! cover the storage side.
//!
//! # Example
//!
//! ```rust,ignore
//! use drillbook_core::testing::{fixtures, MockCatalogSource};
//!
//! let source = MockCatalogSource::new();
//! source.set_items(fixtures::catalog_items(250)).await;
//! ```

mod mock_catalog_source;

pub use mock_catalog_source::{MockCatalogSource, RecordedFetch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::Utc;

    use crate::catalog::CatalogEntry;
    use crate::catalog_source::RawCatalogItem;
    use crate::problem::Difficulty;

    const TOPICS: [&str; 5] = ["Array", "Hash Table", "String", "Dynamic Programming", "Tree"];

    /// Create a raw catalog item as the remote would return it.
    pub fn raw_item(slug: &str, difficulty: &str, tags: &[&str]) -> RawCatalogItem {
        RawCatalogItem {
            title: slug
                .split('-')
                .map(|w| {
                    let mut chars = w.chars();
                    match chars.next() {
                        Some(first) => first.to_uppercase().chain(chars).collect(),
                        None => String::new(),
                    }
                })
                .collect::<Vec<String>>()
                .join(" "),
            slug: slug.to_string(),
            difficulty: difficulty.to_string(),
            topic_tags: tags.iter().map(|t| t.to_string()).collect(),
            paid_only: false,
            ac_rate: Some(50.0),
            frontend_id: None,
        }
    }

    /// Create `count` distinct raw items, cycling difficulties and topics.
    pub fn catalog_items(count: usize) -> Vec<RawCatalogItem> {
        (0..count)
            .map(|i| {
                let difficulty = ["Easy", "Medium", "Hard"][i % 3];
                let tags = [TOPICS[i % TOPICS.len()], TOPICS[(i + 1) % TOPICS.len()]];
                let mut item = raw_item(&format!("problem-{}", i + 1), difficulty, &tags);
                item.frontend_id = Some((i + 1).to_string());
                item
            })
            .collect()
    }

    /// Create a normalized catalog entry.
    pub fn catalog_entry(
        slug: &str,
        difficulty: Difficulty,
        tags: &[&str],
        sequence_id: u64,
    ) -> CatalogEntry {
        CatalogEntry {
            slug: slug.to_string(),
            title: slug.to_string(),
            difficulty,
            topic_tags: tags.iter().map(|t| t.to_string()).collect(),
            sequence_id,
            imported_at: Utc::now(),
            paid_only: false,
            acceptance_rate: Some(0.5),
            frontend_id: None,
        }
    }

    /// Build a solved-set snapshot in the captured wire format.
    pub fn solved_snapshot(records: &[(&str, &str)]) -> String {
        let items: Vec<serde_json::Value> = records
            .iter()
            .enumerate()
            .map(|(i, (slug, difficulty))| {
                serde_json::json!({
                    "id": i + 1,
                    "title": slug,
                    "titleSlug": slug,
                    "difficulty": difficulty,
                    "status": "ac",
                    "acRate": 48.5,
                    "paidOnly": false,
                })
            })
            .collect();
        serde_json::Value::Array(items).to_string()
    }
}
