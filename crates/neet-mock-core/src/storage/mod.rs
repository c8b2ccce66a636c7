mod config;
pub mod database;

pub use config::{Config, ExamConfig, LlmConfig, PracticeConfig, SourceConfig, SourceKind, SubjectConfig};
pub use database::{AttemptRecord, Database, Stats};

use std::path::PathBuf;

use crate::error::DatabaseError;

/// Returns `~/.config/neet-mock[-dev]/` based on NEET_MOCK_ENV.
///
/// Set NEET_MOCK_ENV=dev to use the development data directory, or
/// NEET_MOCK_DATA_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, DatabaseError> {
    let dir = match std::env::var_os("NEET_MOCK_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("NEET_MOCK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("neet-mock-dev")
            } else {
                base_dir.join("neet-mock")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| DatabaseError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
