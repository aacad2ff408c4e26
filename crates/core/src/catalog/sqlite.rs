//! SQLite-backed catalog store implementation.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, Transaction};

use super::{CatalogEntry, CatalogError, CatalogStore};
use crate::problem::Difficulty;

/// SQLite-backed catalog store.
pub struct SqliteCatalogStore {
    conn: Mutex<Connection>,
}

impl SqliteCatalogStore {
    /// Create a new SQLite catalog store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, CatalogError> {
        let conn = Connection::open(path).map_err(|e| CatalogError::Database(e.to_string()))?;
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| CatalogError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite catalog store (useful for testing).
    pub fn in_memory() -> Result<Self, CatalogError> {
        let conn =
            Connection::open_in_memory().map_err(|e| CatalogError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CatalogError> {
        conn.execute_batch(
            r#"
            -- One row per problem, replaced on every sync
            CREATE TABLE IF NOT EXISTS catalog_entries (
                slug TEXT PRIMARY KEY,
                sequence_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                difficulty TEXT NOT NULL,
                topic_tags TEXT NOT NULL DEFAULT '[]',
                paid_only INTEGER NOT NULL DEFAULT 0,
                acceptance_rate REAL,
                frontend_id TEXT,
                imported_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_catalog_entries_sequence ON catalog_entries(sequence_id);
            CREATE INDEX IF NOT EXISTS idx_catalog_entries_difficulty ON catalog_entries(difficulty);
            "#,
        )
        .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CatalogError> {
        self.conn
            .lock()
            .map_err(|e| CatalogError::Internal(format!("catalog connection poisoned: {}", e)))
    }

    /// Insert a batch inside an open transaction.
    fn insert_entries(tx: &Transaction, entries: &[CatalogEntry]) -> Result<u64, CatalogError> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in entries {
            if !seen.insert(entry.slug.as_str()) {
                return Err(CatalogError::Consistency {
                    slug: entry.slug.clone(),
                });
            }
        }

        let mut stmt = tx
            .prepare(
                "INSERT INTO catalog_entries (slug, sequence_id, title, difficulty, topic_tags, paid_only, acceptance_rate, frontend_id, imported_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let mut written = 0;
        for entry in entries {
            let tags_json = serde_json::to_string(&entry.topic_tags)
                .map_err(|e| CatalogError::Internal(e.to_string()))?;

            stmt.execute(params![
                &entry.slug,
                entry.sequence_id as i64,
                &entry.title,
                entry.difficulty.as_str(),
                tags_json,
                entry.paid_only,
                entry.acceptance_rate,
                &entry.frontend_id,
                entry.imported_at.to_rfc3339(),
            ])
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(ref err, _)
                    if err.code == ErrorCode::ConstraintViolation =>
                {
                    CatalogError::Consistency {
                        slug: entry.slug.clone(),
                    }
                }
                _ => CatalogError::Database(e.to_string()),
            })?;
            written += 1;
        }

        Ok(written)
    }

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<CatalogEntry> {
        let difficulty_str: String = row.get(3)?;
        let difficulty = difficulty_str.parse::<Difficulty>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
            )
        })?;

        let tags_json: String = row.get(4)?;
        let topic_tags: Vec<String> = serde_json::from_str(&tags_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

        let imported_at_str: String = row.get(8)?;
        let imported_at = DateTime::parse_from_rfc3339(&imported_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    8,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

        let sequence_id: i64 = row.get(1)?;

        Ok(CatalogEntry {
            slug: row.get(0)?,
            sequence_id: sequence_id as u64,
            title: row.get(2)?,
            difficulty,
            topic_tags,
            paid_only: row.get(5)?,
            acceptance_rate: row.get(6)?,
            frontend_id: row.get(7)?,
            imported_at,
        })
    }
}

const SELECT_COLUMNS: &str = "SELECT slug, sequence_id, title, difficulty, topic_tags, paid_only, acceptance_rate, frontend_id, imported_at FROM catalog_entries";

impl CatalogStore for SqliteCatalogStore {
    fn clear(&self) -> Result<(), CatalogError> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM catalog_entries", [])
            .map_err(|e| CatalogError::Database(e.to_string()))?;
        Ok(())
    }

    fn append_batch(&self, entries: &[CatalogEntry]) -> Result<u64, CatalogError> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let written = Self::insert_entries(&tx, entries)?;

        tx.commit()
            .map_err(|e| CatalogError::Database(e.to_string()))?;
        Ok(written)
    }

    fn replace_all(&self, entries: &[CatalogEntry]) -> Result<u64, CatalogError> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        tx.execute("DELETE FROM catalog_entries", [])
            .map_err(|e| CatalogError::Database(e.to_string()))?;
        let written = Self::insert_entries(&tx, entries)?;

        tx.commit()
            .map_err(|e| CatalogError::Database(e.to_string()))?;
        Ok(written)
    }

    fn find_by_slug(&self, slug: &str) -> Result<Option<CatalogEntry>, CatalogError> {
        let conn = self.lock()?;
        let slug = slug.trim().to_lowercase();

        let result = conn.query_row(
            &format!("{} WHERE slug = ?", SELECT_COLUMNS),
            params![&slug],
            Self::row_to_entry,
        );

        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(CatalogError::Database(e.to_string())),
        }
    }

    fn list(&self, limit: u32, offset: u32) -> Result<Vec<CatalogEntry>, CatalogError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "{} ORDER BY sequence_id ASC LIMIT ? OFFSET ?",
                SELECT_COLUMNS
            ))
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![limit as i64, offset as i64], Self::row_to_entry)
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(|e| CatalogError::Database(e.to_string()))?);
        }
        Ok(entries)
    }

    fn count(&self) -> Result<u64, CatalogError> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM catalog_entries", [], |row| row.get(0))
            .map_err(|e| CatalogError::Database(e.to_string()))?;
        Ok(count as u64)
    }

    fn count_by_difficulty(&self) -> Result<BTreeMap<Difficulty, u64>, CatalogError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT difficulty, COUNT(*) FROM catalog_entries GROUP BY difficulty")
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                let difficulty: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((difficulty, count))
            })
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let mut counts: BTreeMap<Difficulty, u64> =
            Difficulty::ALL.iter().map(|d| (*d, 0)).collect();
        for row in rows {
            let (difficulty, count) = row.map_err(|e| CatalogError::Database(e.to_string()))?;
            let difficulty = difficulty
                .parse::<Difficulty>()
                .map_err(CatalogError::Internal)?;
            counts.insert(difficulty, count as u64);
        }
        Ok(counts)
    }

    fn topic_index(&self) -> Result<HashMap<String, Vec<String>>, CatalogError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT slug, topic_tags FROM catalog_entries")
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                let slug: String = row.get(0)?;
                let tags_json: String = row.get(1)?;
                Ok((slug, tags_json))
            })
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let mut index = HashMap::new();
        for row in rows {
            let (slug, tags_json) = row.map_err(|e| CatalogError::Database(e.to_string()))?;
            let tags: Vec<String> = serde_json::from_str(&tags_json).map_err(|e| {
                CatalogError::Database(format!("corrupt topic_tags for '{}': {}", slug, e))
            })?;
            index.insert(slug, tags);
        }
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> SqliteCatalogStore {
        SqliteCatalogStore::in_memory().unwrap()
    }

    fn create_test_entry(slug: &str, difficulty: Difficulty, seq: u64) -> CatalogEntry {
        CatalogEntry {
            slug: slug.to_string(),
            title: slug.replace('-', " "),
            difficulty,
            topic_tags: vec!["Array".to_string(), "Hash Table".to_string()],
            sequence_id: seq,
            imported_at: Utc::now(),
            paid_only: false,
            acceptance_rate: Some(0.5),
            frontend_id: Some(seq.to_string()),
        }
    }

    #[test]
    fn test_append_and_find() {
        let store = create_test_store();
        let written = store
            .append_batch(&[
                create_test_entry("two-sum", Difficulty::Easy, 0),
                create_test_entry("add-two-numbers", Difficulty::Medium, 1),
            ])
            .unwrap();
        assert_eq!(written, 2);

        let entry = store.find_by_slug("two-sum").unwrap().unwrap();
        assert_eq!(entry.difficulty, Difficulty::Easy);
        assert_eq!(entry.topic_tags, vec!["Array", "Hash Table"]);
        assert_eq!(entry.acceptance_rate, Some(0.5));
        assert_eq!(entry.frontend_id.as_deref(), Some("0"));
    }

    #[test]
    fn test_find_missing_returns_none() {
        let store = create_test_store();
        assert!(store.find_by_slug("nope").unwrap().is_none());
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let store = create_test_store();
        store
            .append_batch(&[create_test_entry("two-sum", Difficulty::Easy, 0)])
            .unwrap();
        assert!(store.find_by_slug("Two-Sum").unwrap().is_some());
    }

    #[test]
    fn test_duplicate_within_batch_is_consistency_error() {
        let store = create_test_store();
        let result = store.append_batch(&[
            create_test_entry("two-sum", Difficulty::Easy, 0),
            create_test_entry("two-sum", Difficulty::Easy, 1),
        ]);
        assert!(matches!(
            result,
            Err(CatalogError::Consistency { ref slug }) if slug == "two-sum"
        ));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_duplicate_across_batches_is_consistency_error() {
        let store = create_test_store();
        store
            .append_batch(&[create_test_entry("two-sum", Difficulty::Easy, 0)])
            .unwrap();

        let result = store.append_batch(&[
            create_test_entry("add-two-numbers", Difficulty::Medium, 1),
            create_test_entry("two-sum", Difficulty::Easy, 2),
        ]);
        assert!(matches!(result, Err(CatalogError::Consistency { .. })));

        // The failing batch must not leave a partial write behind
        assert_eq!(store.count().unwrap(), 1);
        assert!(store.find_by_slug("add-two-numbers").unwrap().is_none());
    }

    #[test]
    fn test_clear_then_append() {
        let store = create_test_store();
        store
            .append_batch(&[create_test_entry("two-sum", Difficulty::Easy, 0)])
            .unwrap();
        store.clear().unwrap();
        assert_eq!(store.count().unwrap(), 0);

        store
            .append_batch(&[create_test_entry("two-sum", Difficulty::Easy, 0)])
            .unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_replace_all_is_idempotent() {
        let store = create_test_store();
        let entries = vec![
            create_test_entry("two-sum", Difficulty::Easy, 0),
            create_test_entry("lru-cache", Difficulty::Medium, 1),
        ];

        store.replace_all(&entries).unwrap();
        let first = store.list(100, 0).unwrap();
        store.replace_all(&entries).unwrap();
        let second = store.list(100, 0).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_replace_all_drops_old_entries() {
        let store = create_test_store();
        store
            .replace_all(&[create_test_entry("old-problem", Difficulty::Hard, 0)])
            .unwrap();
        store
            .replace_all(&[create_test_entry("new-problem", Difficulty::Easy, 0)])
            .unwrap();

        assert!(store.find_by_slug("old-problem").unwrap().is_none());
        assert!(store.find_by_slug("new-problem").unwrap().is_some());
    }

    #[test]
    fn test_list_orders_by_sequence() {
        let store = create_test_store();
        store
            .append_batch(&[
                create_test_entry("c", Difficulty::Easy, 20),
                create_test_entry("a", Difficulty::Easy, 0),
                create_test_entry("b", Difficulty::Easy, 10),
            ])
            .unwrap();

        let slugs: Vec<String> = store
            .list(100, 0)
            .unwrap()
            .into_iter()
            .map(|e| e.slug)
            .collect();
        assert_eq!(slugs, vec!["a", "b", "c"]);

        let page = store.list(1, 1).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].slug, "b");
    }

    #[test]
    fn test_count_by_difficulty_includes_zeroes() {
        let store = create_test_store();
        store
            .append_batch(&[
                create_test_entry("a", Difficulty::Easy, 0),
                create_test_entry("b", Difficulty::Easy, 1),
                create_test_entry("c", Difficulty::Hard, 2),
            ])
            .unwrap();

        let counts = store.count_by_difficulty().unwrap();
        assert_eq!(counts[&Difficulty::Easy], 2);
        assert_eq!(counts[&Difficulty::Medium], 0);
        assert_eq!(counts[&Difficulty::Hard], 1);
    }

    #[test]
    fn test_topic_index() {
        let store = create_test_store();
        let mut untagged = create_test_entry("b", Difficulty::Easy, 1);
        untagged.topic_tags.clear();
        store
            .append_batch(&[create_test_entry("a", Difficulty::Easy, 0), untagged])
            .unwrap();

        let index = store.topic_index().unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index["a"], vec!["Array", "Hash Table"]);
        assert!(index["b"].is_empty());
    }

    #[test]
    fn test_on_disk_store_persists() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("catalog.db");

        {
            let store = SqliteCatalogStore::new(&path).unwrap();
            store
                .append_batch(&[create_test_entry("two-sum", Difficulty::Easy, 0)])
                .unwrap();
        }

        let store = SqliteCatalogStore::new(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_corrupt_columns_are_reported() {
        let store = create_test_store();
        store
            .append_batch(&[create_test_entry("two-sum", Difficulty::Easy, 0)])
            .unwrap();

        store
            .lock()
            .unwrap()
            .execute("UPDATE catalog_entries SET topic_tags = '{broken'", [])
            .unwrap();
        assert!(matches!(
            store.find_by_slug("two-sum"),
            Err(CatalogError::Database(_))
        ));

        store
            .lock()
            .unwrap()
            .execute(
                "UPDATE catalog_entries SET topic_tags = '[]', imported_at = 'last week'",
                [],
            )
            .unwrap();
        assert!(matches!(store.list(10, 0), Err(CatalogError::Database(_))));

        store
            .lock()
            .unwrap()
            .execute("UPDATE catalog_entries SET topic_tags = 'nope'", [])
            .unwrap();
        assert!(matches!(store.topic_index(), Err(CatalogError::Database(_))));
    }
}
