use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rand::seq::SliceRandom;

use super::parse;
use super::QuestionSource;
use crate::error::SourceError;
use crate::paper::Question;

/// A few NCERT questions per subject, written next to a fresh config so the
/// app works before a real bank is installed.
pub const SAMPLE_BANK: &str = include_str!("sample_bank.json");

/// File-backed question bank keyed by subject name.
///
/// The file is a JSON object mapping each subject to an array of question
/// records in any shape [`parse::questions_from_json`] accepts:
///
/// ```json
/// { "Physics": [ { "question": "...", "options": {"A": "..", "B": ".."}, "answer": "B" } ] }
/// ```
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    sections: HashMap<String, Vec<Question>>,
    shuffle: bool,
    origin: Option<PathBuf>,
}

impl QuestionBank {
    /// Build a bank from in-memory sections.
    pub fn from_sections<S, I>(sections: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, Vec<Question>)>,
    {
        Self {
            sections: sections.into_iter().map(|(s, q)| (s.into(), q)).collect(),
            shuffle: false,
            origin: None,
        }
    }

    /// Load a bank from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Io`] if the file cannot be read and
    /// [`SourceError::Json`] if it is not a JSON object.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut bank = Self::from_json_str(&content)?;
        bank.origin = Some(path.to_path_buf());
        tracing::info!(path = %path.display(), subjects = bank.sections.len(), "question bank loaded");
        Ok(bank)
    }

    /// Parse a bank from JSON text.
    pub fn from_json_str(content: &str) -> Result<Self, SourceError> {
        let raw: HashMap<String, serde_json::Value> = serde_json::from_str(content)?;
        let sections = raw
            .into_iter()
            .map(|(subject, value)| {
                let questions = parse::questions_from_json(&value);
                (subject, questions)
            })
            .collect();
        Ok(Self {
            sections,
            shuffle: false,
            origin: None,
        })
    }

    /// The bundled [`SAMPLE_BANK`].
    pub fn sample() -> Result<Self, SourceError> {
        Self::from_json_str(SAMPLE_BANK)
    }

    /// Write [`SAMPLE_BANK`] to `path` unless a file is already there.
    /// Returns whether anything was written.
    pub fn install_sample(path: impl AsRef<Path>) -> Result<bool, SourceError> {
        let path = path.as_ref();
        if path.exists() {
            return Ok(false);
        }
        let io = |source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io)?;
        }
        std::fs::write(path, SAMPLE_BANK).map_err(io)?;
        tracing::info!(path = %path.display(), "sample question bank installed");
        Ok(true)
    }

    /// Serve a random sample instead of the first `count` questions.
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn len(&self, subject: &str) -> usize {
        self.sections.get(subject).map_or(0, Vec::len)
    }

    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }
}

#[async_trait]
impl QuestionSource for QuestionBank {
    fn name(&self) -> &str {
        "bank"
    }

    async fn fetch_questions(&self, subject: &str, count: usize) -> Result<Vec<Question>, SourceError> {
        let questions = self
            .sections
            .get(subject)
            .filter(|qs| !qs.is_empty())
            .ok_or_else(|| SourceError::UnknownSubject(subject.to_string()))?;

        if self.shuffle {
            let mut rng = rand::thread_rng();
            Ok(questions.choose_multiple(&mut rng, count).cloned().collect())
        } else {
            Ok(questions.iter().take(count).cloned().collect())
        }
    }
}
