pub mod books;
pub mod config;
pub mod exam;
pub mod nav;
pub mod practice;
pub mod result;
pub mod session;
pub mod stats;

use std::path::PathBuf;

use neet_mock_core::storage::data_dir;
use neet_mock_core::{Config, Database, Event, ExamSession, QuestionSource};
use serde::Serialize;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

const SESSION_KEY: &str = "exam_session";

/// Everything a command needs: config, database and the persisted session.
pub struct Workspace {
    pub dir: PathBuf,
    pub config: Config,
    pub db: Database,
}

impl Workspace {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let dir = data_dir()?;
        let config = Config::load()?;
        config.validate()?;
        let db = Database::open()?;
        Ok(Self { dir, config, db })
    }

    pub fn source(&self) -> Result<Box<dyn QuestionSource>, Box<dyn std::error::Error>> {
        Ok(self.config.build_source(&self.dir)?)
    }

    /// The stored session, or a fresh one built from the current config.
    pub fn load_session(&self) -> ExamSession {
        if let Ok(Some(json)) = self.db.kv_get(SESSION_KEY) {
            match serde_json::from_str::<ExamSession>(&json) {
                Ok(session) => return session,
                Err(e) => tracing::warn!(error = %e, "stored session unreadable, starting a new one"),
            }
        }
        ExamSession::new(self.config.session_settings())
    }

    pub fn save_session(&self, session: &ExamSession) -> CliResult {
        let json = serde_json::to_string(session)?;
        self.db.kv_set(SESSION_KEY, &json)?;
        Ok(())
    }

    /// Persist the session whatever the command's outcome, then report it.
    /// An auto-submission from the initial poll must never be replayed.
    pub fn finish(&self, session: &ExamSession, outcome: CliResult) -> CliResult {
        self.save_session(session)?;
        outcome
    }

    /// Load the session and let the clock auto-submit an expired exam
    /// before anything else happens. The submission is stored before it
    /// is reported.
    pub fn load_polled(&self) -> Result<ExamSession, Box<dyn std::error::Error>> {
        let mut session = self.load_session();
        if let Some(event) = session.poll() {
            self.save_session(&session)?;
            self.emit(&session, &event)?;
        }
        Ok(session)
    }

    /// Print an event and record it in the history when it ends an attempt.
    pub fn emit(&self, session: &ExamSession, event: &Event) -> CliResult {
        print_json(event)?;
        if let Event::AttemptSubmitted { attempt, .. } = event {
            self.db.record_attempt(session, *attempt)?;
        }
        Ok(())
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use neet_mock_core::QuestionBank;

    fn workspace() -> Workspace {
        Workspace {
            dir: PathBuf::from("."),
            config: Config::default(),
            db: Database::open_memory().unwrap(),
        }
    }

    #[tokio::test]
    async fn expired_session_is_stored_submitted_before_it_is_reported() {
        let ws = workspace();
        let mut session = ExamSession::new(ws.config.session_settings());
        let start = Utc::now() - Duration::minutes(300);
        session
            .enter_exam_at(&QuestionBank::sample().unwrap(), &ws.config.exam_plan(), start)
            .await
            .unwrap();
        ws.save_session(&session).unwrap();

        let polled = ws.load_polled().unwrap();
        assert!(polled.is_submitted());

        let stored = ws.load_session();
        assert!(stored.is_submitted());
        assert!(stored.exam().was_auto_submitted());
        assert_eq!(ws.db.stats().unwrap().exam_attempts, 1);
    }
}
