//! Database operations for WordQuiz vocabulary storage

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{VocabError, VocabResult};
use crate::model::{BulkUpsertSummary, EntryDraft, EntryPatch, Level, LevelCount, VocabularyEntry};

const ENTRY_COLUMNS: &str = "id, english, thai, level, category, created_at, updated_at";

/// Storage contract used by the quiz controller and the management surface.
pub trait WordRepository {
    /// All entries, or only those of `level`, sorted by `english` ascending.
    fn list(&self, level: Option<Level>) -> VocabResult<Vec<VocabularyEntry>>;

    fn get(&self, id: i64) -> VocabResult<VocabularyEntry>;

    /// Rejects a duplicate `english` with [`VocabError::Conflict`].
    fn create(&self, draft: &EntryDraft) -> VocabResult<VocabularyEntry>;

    fn update(&self, id: i64, patch: &EntryPatch) -> VocabResult<VocabularyEntry>;

    /// Returns the entry that was removed.
    fn delete(&self, id: i64) -> VocabResult<VocabularyEntry>;

    fn delete_all(&self) -> VocabResult<usize>;

    /// Insert-or-replace matched on `english`. Drafts with blank required
    /// fields are dropped before writing.
    fn bulk_upsert(&self, drafts: &[EntryDraft]) -> VocabResult<BulkUpsertSummary>;
}

/// SQLite-backed repository. Opened and closed explicitly by its owner.
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    pub fn open<P: AsRef<Path>>(db_path: P) -> VocabResult<Self> {
        let conn = Connection::open(db_path.as_ref())?;
        init_database(&conn)?;
        info!(path = %db_path.as_ref().display(), "opened vocabulary database");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> VocabResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_database(&conn)?;
        Ok(Self { conn })
    }

    pub fn close(self) -> VocabResult<()> {
        self.conn.close().map_err(|(_, e)| VocabError::Transport(e))
    }

    /// Word counts for every level, including empty ones
    pub fn count_by_level(&self) -> VocabResult<Vec<LevelCount>> {
        let mut stmt = self
            .conn
            .prepare("SELECT level, COUNT(*) FROM vocabulary GROUP BY level")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Level::ALL
            .iter()
            .map(|level| LevelCount {
                level: *level,
                word_count: rows
                    .iter()
                    .find(|(name, _)| name == level.as_str())
                    .map(|(_, count)| *count as usize)
                    .unwrap_or(0),
            })
            .collect())
    }

    fn find_by_english(&self, english: &str) -> VocabResult<Option<VocabularyEntry>> {
        let query = format!("SELECT {} FROM vocabulary WHERE english = ?1", ENTRY_COLUMNS);
        Ok(self
            .conn
            .query_row(&query, params![english], entry_from_row)
            .optional()?)
    }
}

/// Create the schema if it does not exist yet
fn init_database(conn: &Connection) -> VocabResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS vocabulary (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            english TEXT NOT NULL UNIQUE,
            thai TEXT NOT NULL,
            level TEXT NOT NULL CHECK (level IN ('A1', 'A2', 'B1', 'B2', 'C1', 'C2')),
            category TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_vocabulary_level ON vocabulary(level)",
        [],
    )?;
    Ok(())
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<VocabularyEntry> {
    let level: String = row.get(3)?;
    let level = level
        .parse::<Level>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    Ok(VocabularyEntry {
        id: Some(row.get(0)?),
        english: row.get(1)?,
        thai: row.get(2)?,
        level,
        category: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        created_at: row.get::<_, Option<DateTime<Utc>>>(5)?,
        updated_at: row.get::<_, Option<DateTime<Utc>>>(6)?,
    })
}

/// UNIQUE(english) violations surface as conflicts, everything else as transport
fn write_error(err: rusqlite::Error, english: &str) -> VocabError {
    match err {
        rusqlite::Error::SqliteFailure(ref failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            VocabError::Conflict(format!("word '{}' already exists", english))
        }
        other => VocabError::Transport(other),
    }
}

impl WordRepository for SqliteRepository {
    fn list(&self, level: Option<Level>) -> VocabResult<Vec<VocabularyEntry>> {
        let entries = match level {
            Some(level) => {
                let query = format!(
                    "SELECT {} FROM vocabulary WHERE level = ?1 ORDER BY english ASC",
                    ENTRY_COLUMNS
                );
                let mut stmt = self.conn.prepare(&query)?;
                let rows = stmt.query_map(params![level.as_str()], entry_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let query = format!("SELECT {} FROM vocabulary ORDER BY english ASC", ENTRY_COLUMNS);
                let mut stmt = self.conn.prepare(&query)?;
                let rows = stmt.query_map([], entry_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        debug!(level = ?level, count = entries.len(), "listed vocabulary");
        Ok(entries)
    }

    fn get(&self, id: i64) -> VocabResult<VocabularyEntry> {
        let query = format!("SELECT {} FROM vocabulary WHERE id = ?1", ENTRY_COLUMNS);
        self.conn
            .query_row(&query, params![id], entry_from_row)
            .optional()?
            .ok_or_else(|| VocabError::NotFound(format!("vocabulary {}", id)))
    }

    fn create(&self, draft: &EntryDraft) -> VocabResult<VocabularyEntry> {
        let draft = draft.validated()?;
        if self.find_by_english(&draft.english)?.is_some() {
            return Err(VocabError::Conflict(format!("word '{}' already exists", draft.english)));
        }

        let now = Utc::now();
        self.conn
            .execute(
                "INSERT INTO vocabulary (english, thai, level, category, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![draft.english, draft.thai, draft.level.as_str(), draft.category, now],
            )
            .map_err(|e| write_error(e, &draft.english))?;

        let id = self.conn.last_insert_rowid();
        info!(id, english = %draft.english, level = %draft.level, "created vocabulary");
        self.get(id)
    }

    fn update(&self, id: i64, patch: &EntryPatch) -> VocabResult<VocabularyEntry> {
        let existing = self.get(id)?;
        let updated = patch.apply_to(&existing)?;

        if updated.english != existing.english {
            if let Some(other) = self.find_by_english(&updated.english)? {
                if other.id != Some(id) {
                    return Err(VocabError::Conflict(format!(
                        "word '{}' already exists",
                        updated.english
                    )));
                }
            }
        }

        self.conn
            .execute(
                "UPDATE vocabulary SET english = ?1, thai = ?2, level = ?3, category = ?4, updated_at = ?5
                 WHERE id = ?6",
                params![
                    updated.english,
                    updated.thai,
                    updated.level.as_str(),
                    updated.category,
                    Utc::now(),
                    id
                ],
            )
            .map_err(|e| write_error(e, &updated.english))?;

        info!(id, english = %updated.english, "updated vocabulary");
        self.get(id)
    }

    fn delete(&self, id: i64) -> VocabResult<VocabularyEntry> {
        let existing = self.get(id)?;
        self.conn
            .execute("DELETE FROM vocabulary WHERE id = ?1", params![id])?;
        info!(id, english = %existing.english, "deleted vocabulary");
        Ok(existing)
    }

    fn delete_all(&self) -> VocabResult<usize> {
        let deleted = self.conn.execute("DELETE FROM vocabulary", [])?;
        info!(deleted, "deleted all vocabulary");
        Ok(deleted)
    }

    fn bulk_upsert(&self, drafts: &[EntryDraft]) -> VocabResult<BulkUpsertSummary> {
        let valid: Vec<EntryDraft> = drafts.iter().filter_map(|d| d.validated().ok()).collect();
        if valid.is_empty() {
            return Err(VocabError::Validation(
                "no valid vocabulary items provided".to_string(),
            ));
        }

        let tx = self.conn.unchecked_transaction()?;
        let mut summary = BulkUpsertSummary::default();
        let now = Utc::now();

        for draft in &valid {
            match self.find_by_english(&draft.english)? {
                None => {
                    tx.execute(
                        "INSERT INTO vocabulary (english, thai, level, category, created_at, updated_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                        params![draft.english, draft.thai, draft.level.as_str(), draft.category, now],
                    )?;
                    summary.inserted += 1;
                }
                Some(existing) => {
                    summary.matched += 1;
                    // a blank category in the draft keeps the stored one
                    let category = if draft.category.is_empty() {
                        existing.category.as_str()
                    } else {
                        draft.category.as_str()
                    };
                    let unchanged = existing.thai == draft.thai
                        && existing.level == draft.level
                        && existing.category == category;
                    if !unchanged {
                        tx.execute(
                            "UPDATE vocabulary SET thai = ?1, level = ?2, category = ?3, updated_at = ?4
                             WHERE english = ?5",
                            params![draft.thai, draft.level.as_str(), category, now, draft.english],
                        )?;
                        summary.modified += 1;
                    }
                }
            }
        }
        tx.commit()?;

        info!(
            submitted = drafts.len(),
            inserted = summary.inserted,
            matched = summary.matched,
            modified = summary.modified,
            "bulk upserted vocabulary"
        );
        Ok(summary)
    }
}
