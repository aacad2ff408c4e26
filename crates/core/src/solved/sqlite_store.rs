//! SQLite-backed solved store implementation.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{normalize_owner_id, SolvedError, SolvedRecord, SolvedStore};
use crate::problem::Difficulty;

/// SQLite-backed solved store.
pub struct SqliteSolvedStore {
    conn: Mutex<Connection>,
}

impl SqliteSolvedStore {
    /// Create a new SQLite solved store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, SolvedError> {
        let conn = Connection::open(path).map_err(|e| SolvedError::Database(e.to_string()))?;
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| SolvedError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite solved store (useful for testing).
    pub fn in_memory() -> Result<Self, SolvedError> {
        let conn =
            Connection::open_in_memory().map_err(|e| SolvedError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), SolvedError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS solved_records (
                slug TEXT NOT NULL,
                owner_id TEXT NOT NULL,
                title TEXT NOT NULL,
                difficulty TEXT NOT NULL,
                status TEXT NOT NULL,
                acceptance_rate REAL NOT NULL DEFAULT 0,
                is_paywalled INTEGER NOT NULL DEFAULT 0,
                solved_at TEXT NOT NULL,
                topic_tags TEXT,
                frontend_id TEXT,
                UNIQUE(slug, owner_id)
            );

            CREATE INDEX IF NOT EXISTS idx_solved_records_owner ON solved_records(owner_id);
            "#,
        )
        .map_err(|e| SolvedError::Database(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SolvedError> {
        self.conn
            .lock()
            .map_err(|e| SolvedError::Internal(format!("solved connection poisoned: {}", e)))
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<SolvedRecord> {
        let difficulty_str: String = row.get(3)?;
        let difficulty = difficulty_str.parse::<Difficulty>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
            )
        })?;

        let solved_at_str: String = row.get(7)?;
        let solved_at = DateTime::parse_from_rfc3339(&solved_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    7,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

        // NULL means "never enriched", which differs from an empty tag list
        let tags_json: Option<String> = row.get(8)?;
        let topic_tags = tags_json
            .map(|json| serde_json::from_str::<Vec<String>>(&json))
            .transpose()
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    8,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

        Ok(SolvedRecord {
            slug: row.get(0)?,
            owner_id: row.get(1)?,
            title: row.get(2)?,
            difficulty,
            status: row.get(4)?,
            acceptance_rate: row.get(5)?,
            is_paywalled: row.get(6)?,
            solved_at,
            topic_tags,
            frontend_id: row.get(9)?,
        })
    }

    fn query_records(
        &self,
        where_clause: &str,
        owner_id: &str,
    ) -> Result<Vec<SolvedRecord>, SolvedError> {
        let conn = self.lock()?;
        let sql = format!("{} {} ORDER BY slug", SELECT_COLUMNS, where_clause);

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| SolvedError::Database(e.to_string()))?;

        let records = stmt
            .query_map(params![owner_id], Self::row_to_record)
            .map_err(|e| SolvedError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SolvedError::Database(e.to_string()))?;

        Ok(records)
    }
}

/// Owner column value for `owner_id`. A blank id matches no rows.
fn owner_key(owner_id: &str) -> &str {
    normalize_owner_id(owner_id).unwrap_or("")
}

const SELECT_COLUMNS: &str = "SELECT slug, owner_id, title, difficulty, status, acceptance_rate, is_paywalled, solved_at, topic_tags, frontend_id FROM solved_records";

impl SolvedStore for SqliteSolvedStore {
    fn replace_for_owner(
        &self,
        owner_id: &str,
        records: &[SolvedRecord],
    ) -> Result<u64, SolvedError> {
        let owner_id = owner_key(owner_id);
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| SolvedError::Database(e.to_string()))?;

        tx.execute(
            "DELETE FROM solved_records WHERE owner_id = ?",
            params![owner_id],
        )
        .map_err(|e| SolvedError::Database(e.to_string()))?;

        let mut written = 0;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO solved_records (slug, owner_id, title, difficulty, status, acceptance_rate, is_paywalled, solved_at, topic_tags, frontend_id)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                     ON CONFLICT(slug, owner_id) DO UPDATE SET
                        title = excluded.title,
                        difficulty = excluded.difficulty,
                        status = excluded.status,
                        acceptance_rate = excluded.acceptance_rate,
                        is_paywalled = excluded.is_paywalled,
                        solved_at = excluded.solved_at,
                        topic_tags = excluded.topic_tags,
                        frontend_id = excluded.frontend_id",
                )
                .map_err(|e| SolvedError::Database(e.to_string()))?;

            for record in records {
                let tags_json = record
                    .topic_tags
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()
                    .map_err(|e| SolvedError::Internal(e.to_string()))?;

                stmt.execute(params![
                    &record.slug,
                    owner_id,
                    &record.title,
                    record.difficulty.as_str(),
                    &record.status,
                    record.acceptance_rate,
                    record.is_paywalled,
                    record.solved_at.to_rfc3339(),
                    tags_json,
                    &record.frontend_id,
                ])
                .map_err(|e| SolvedError::Database(e.to_string()))?;
                written += 1;
            }
        }

        tx.commit()
            .map_err(|e| SolvedError::Database(e.to_string()))?;
        Ok(written)
    }

    fn list_for_owner(&self, owner_id: &str) -> Result<Vec<SolvedRecord>, SolvedError> {
        let owner_id = owner_key(owner_id);
        self.query_records("WHERE owner_id = ?", owner_id)
    }

    fn list_unenriched(&self, owner_id: &str) -> Result<Vec<SolvedRecord>, SolvedError> {
        let owner_id = owner_key(owner_id);
        self.query_records("WHERE owner_id = ? AND topic_tags IS NULL", owner_id)
    }

    fn get(&self, owner_id: &str, slug: &str) -> Result<Option<SolvedRecord>, SolvedError> {
        let owner_id = owner_key(owner_id);
        let conn = self.lock()?;

        let result = conn.query_row(
            &format!("{} WHERE owner_id = ? AND slug = ?", SELECT_COLUMNS),
            params![owner_id, slug],
            Self::row_to_record,
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(SolvedError::Database(e.to_string())),
        }
    }

    fn set_topic_tags(
        &self,
        owner_id: &str,
        slug: &str,
        tags: &[String],
    ) -> Result<(), SolvedError> {
        let owner_id = owner_key(owner_id);
        let conn = self.lock()?;
        let tags_json =
            serde_json::to_string(tags).map_err(|e| SolvedError::Internal(e.to_string()))?;

        let updated = conn
            .execute(
                "UPDATE solved_records SET topic_tags = ? WHERE owner_id = ? AND slug = ?",
                params![tags_json, owner_id, slug],
            )
            .map_err(|e| SolvedError::Database(e.to_string()))?;

        if updated == 0 {
            return Err(SolvedError::NotFound {
                owner_id: owner_id.to_string(),
                slug: slug.to_string(),
            });
        }
        Ok(())
    }

    fn count_by_difficulty(
        &self,
        owner_id: &str,
    ) -> Result<BTreeMap<Difficulty, u64>, SolvedError> {
        let owner_id = owner_key(owner_id);
        let conn = self.lock()?;
        let mut counts: BTreeMap<Difficulty, u64> =
            Difficulty::ALL.iter().map(|d| (*d, 0)).collect();

        let mut stmt = conn
            .prepare(
                "SELECT difficulty, COUNT(*) FROM solved_records WHERE owner_id = ? GROUP BY difficulty",
            )
            .map_err(|e| SolvedError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![owner_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })
            .map_err(|e| SolvedError::Database(e.to_string()))?;

        for row in rows {
            let (difficulty, count) = row.map_err(|e| SolvedError::Database(e.to_string()))?;
            if let Ok(d) = difficulty.parse::<Difficulty>() {
                counts.insert(d, count as u64);
            }
        }

        Ok(counts)
    }
}
