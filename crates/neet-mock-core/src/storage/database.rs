//! SQLite-based attempt history and application state.
//!
//! Provides persistent storage for:
//! - Submitted exam and practice attempts
//! - Attempt statistics
//! - Key-value store for application state (the CLI keeps its session here)

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::DatabaseError;
use crate::session::{AttemptKind, ExamSession};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub id: i64,
    pub session_id: String,
    pub kind: String,
    /// Comma-separated subjects of the scored paper.
    pub subjects: String,
    pub correct_count: u64,
    pub wrong_count: u64,
    pub unattempted_count: u64,
    pub total_score: i64,
    pub max_score: i64,
    pub passed: bool,
    pub auto_submitted: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub submitted_at: DateTime<Utc>,
}

impl AttemptRecord {
    pub fn percentage(&self) -> f64 {
        if self.max_score == 0 {
            return 0.0;
        }
        self.total_score as f64 / self.max_score as f64 * 100.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Stats {
    pub total_attempts: u64,
    pub exam_attempts: u64,
    pub practice_attempts: u64,
    pub passed_attempts: u64,
    /// Highest full-exam score, if any exam was submitted.
    pub best_exam_score: Option<i64>,
    pub average_percentage: f64,
}

/// SQLite database for attempt storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/neet-mock/neet-mock.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, DatabaseError> {
        Self::open_at(&data_dir()?.join("neet-mock.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS attempts (
                id                INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id        TEXT NOT NULL,
                kind              TEXT NOT NULL,
                subjects          TEXT NOT NULL DEFAULT '',
                correct_count     INTEGER NOT NULL,
                wrong_count       INTEGER NOT NULL,
                unattempted_count INTEGER NOT NULL,
                total_score       INTEGER NOT NULL,
                max_score         INTEGER NOT NULL,
                passed            INTEGER NOT NULL,
                auto_submitted    INTEGER NOT NULL DEFAULT 0,
                started_at        TEXT,
                submitted_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_attempts_submitted_at ON attempts(submitted_at);
            CREATE INDEX IF NOT EXISTS idx_attempts_kind ON attempts(kind);",
        )?;
        Ok(())
    }

    /// Record the submitted attempt of `kind` from `session`.
    ///
    /// Returns the new row id, or `None` if that attempt has no result yet.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_attempt(&self, session: &ExamSession, kind: AttemptKind) -> Result<Option<i64>, DatabaseError> {
        let attempt = match kind {
            AttemptKind::Exam => session.exam(),
            AttemptKind::Practice => match session.practice() {
                Some(practice) => &practice.attempt,
                None => return Ok(None),
            },
        };
        let (Some(report), Some(submitted_at)) = (attempt.result(), attempt.submitted_at()) else {
            return Ok(None);
        };
        let subjects = attempt
            .paper()
            .map(|p| p.subjects().collect::<Vec<_>>().join(","))
            .unwrap_or_default();

        self.conn.execute(
            "INSERT INTO attempts (session_id, kind, subjects, correct_count, wrong_count,
                                   unattempted_count, total_score, max_score, passed,
                                   auto_submitted, started_at, submitted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                session.id().to_string(),
                kind.as_str(),
                subjects,
                report.correct_count as i64,
                report.wrong_count as i64,
                report.unattempted_count as i64,
                report.total_score,
                report.max_score,
                session.passed(report),
                attempt.was_auto_submitted(),
                attempt.started_at().map(|t| t.to_rfc3339()),
                submitted_at.to_rfc3339(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, kind = kind.as_str(), "attempt recorded");
        Ok(Some(id))
    }

    /// Most recent attempts first.
    pub fn attempt_history(&self, limit: usize) -> Result<Vec<AttemptRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, kind, subjects, correct_count, wrong_count, unattempted_count,
                    total_score, max_score, passed, auto_submitted, started_at, submitted_at
             FROM attempts
             ORDER BY submitted_at DESC, id DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                AttemptRecord {
                    id: row.get(0)?,
                    session_id: row.get(1)?,
                    kind: row.get(2)?,
                    subjects: row.get(3)?,
                    correct_count: row.get(4)?,
                    wrong_count: row.get(5)?,
                    unattempted_count: row.get(6)?,
                    total_score: row.get(7)?,
                    max_score: row.get(8)?,
                    passed: row.get(9)?,
                    auto_submitted: row.get(10)?,
                    started_at: None,
                    submitted_at: Utc::now(),
                },
                row.get::<_, Option<String>>(11)?,
                row.get::<_, String>(12)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (mut record, started_at, submitted_at) = row?;
            record.started_at = started_at.as_deref().map(parse_timestamp).transpose()?;
            record.submitted_at = parse_timestamp(&submitted_at)?;
            records.push(record);
        }
        Ok(records)
    }

    pub fn stats(&self) -> Result<Stats, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT kind, COUNT(*), COALESCE(SUM(passed), 0), MAX(total_score),
                    COALESCE(SUM(CASE WHEN max_score > 0 THEN total_score * 100.0 / max_score ELSE 0 END), 0)
             FROM attempts
             GROUP BY kind",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, Option<i64>>(3)?,
                row.get::<_, f64>(4)?,
            ))
        })?;

        let mut stats = Stats::default();
        let mut percentage_sum = 0.0;
        for row in rows {
            let (kind, count, passed, best, percentages) = row?;
            stats.total_attempts += count;
            stats.passed_attempts += passed;
            percentage_sum += percentages;
            match kind.as_str() {
                "exam" => {
                    stats.exam_attempts += count;
                    stats.best_exam_score = best;
                }
                "practice" => stats.practice_attempts += count,
                _ => {}
            }
        }
        if stats.total_attempts > 0 {
            stats.average_percentage = percentage_sum / stats.total_attempts as f64;
        }
        Ok(stats)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<bool, DatabaseError> {
        let removed = self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DatabaseError::QueryFailed(format!("bad timestamp '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper::SubjectPlan;
    use crate::session::{SessionSettings, View};
    use crate::source::testing::sample_questions;
    use crate::source::QuestionBank;

    async fn submitted_session(correct: usize) -> ExamSession {
        let bank = QuestionBank::from_sections([("Physics", sample_questions("Physics", 5))]);
        let mut session = ExamSession::new(SessionSettings::default());
        session
            .enter_exam(&bank, &[SubjectPlan::new("Physics", 5)])
            .await
            .unwrap();
        for i in 0..correct {
            session.record_answer("Physics", i, "B").unwrap();
        }
        session.submit_exam().unwrap();
        session
    }

    #[tokio::test]
    async fn record_and_query() {
        let db = Database::open_memory().unwrap();
        let session = submitted_session(5).await;
        let id = db.record_attempt(&session, AttemptKind::Exam).unwrap();
        assert!(id.is_some());

        let history = db.attempt_history(10).unwrap();
        assert_eq!(history.len(), 1);
        let record = &history[0];
        assert_eq!(record.kind, "exam");
        assert_eq!(record.subjects, "Physics");
        assert_eq!((record.total_score, record.max_score), (20, 20));
        assert!(record.passed);
        assert!(record.started_at.is_some());
        assert_eq!(record.percentage(), 100.0);
    }

    #[tokio::test]
    async fn unsubmitted_attempts_are_not_recorded() {
        let db = Database::open_memory().unwrap();
        let mut session = ExamSession::new(SessionSettings::default());
        assert_eq!(db.record_attempt(&session, AttemptKind::Exam).unwrap(), None);
        session.navigate(View::Practice).unwrap();
        assert_eq!(db.record_attempt(&session, AttemptKind::Practice).unwrap(), None);
        assert!(db.attempt_history(10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn stats_aggregate_attempts() {
        let db = Database::open_memory().unwrap();
        db.record_attempt(&submitted_session(5).await, AttemptKind::Exam).unwrap();
        db.record_attempt(&submitted_session(1).await, AttemptKind::Exam).unwrap();

        let stats = db.stats().unwrap();
        assert_eq!(stats.total_attempts, 2);
        assert_eq!(stats.exam_attempts, 2);
        assert_eq!(stats.passed_attempts, 1);
        assert_eq!(stats.best_exam_score, Some(20));
        // 100% and (4 - 0) / 20 = 20%
        assert!((stats.average_percentage - 60.0).abs() < 1e-9);
    }

    #[test]
    fn empty_stats() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.stats().unwrap(), Stats::default());
    }

    #[tokio::test]
    async fn history_respects_limit() {
        let db = Database::open_memory().unwrap();
        for _ in 0..3 {
            db.record_attempt(&submitted_session(2).await, AttemptKind::Exam).unwrap();
        }
        assert_eq!(db.attempt_history(2).unwrap().len(), 2);
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        assert!(db.kv_delete("test").unwrap());
        assert!(!db.kv_delete("test").unwrap());
    }

    #[test]
    fn on_disk_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("neet-mock.db");
        Database::open_at(&path).unwrap().kv_set("k", "v").unwrap();
        assert_eq!(Database::open_at(&path).unwrap().kv_get("k").unwrap().as_deref(), Some("v"));
    }
}
