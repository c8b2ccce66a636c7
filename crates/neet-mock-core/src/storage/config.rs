//! TOML-based application configuration.
//!
//! Stores:
//! - The exam blueprint (subjects, question counts, duration, pass ratio)
//! - The marking scheme
//! - Which question source to use and how to reach it
//! - The study books shown on the Books view
//!
//! Configuration is stored at `~/.config/neet-mock/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data_dir;
use crate::error::{ConfigError, CoreError};
use crate::library::{Book, Library};
use crate::paper::SubjectPlan;
use crate::scoring::{MarkingScheme, DEFAULT_PASS_RATIO};
use crate::session::SessionSettings;
use crate::source::{LlmSettings, LlmSource, QuestionBank, QuestionSource};

/// One exam section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectConfig {
    pub name: String,
    pub questions: usize,
}

/// Exam blueprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamConfig {
    #[serde(default = "default_subjects")]
    pub subjects: Vec<SubjectConfig>,
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: u64,
    #[serde(default = "default_pass_ratio")]
    pub pass_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeConfig {
    #[serde(default = "default_practice_questions")]
    pub default_questions: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Local JSON question bank.
    #[default]
    Bank,
    /// OpenAI-compatible generation service.
    Llm,
}

/// Generation service settings. The key itself never lives in the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,
    /// Relative paths resolve against the data directory.
    #[serde(default = "default_bank_path")]
    pub bank_path: String,
    #[serde(default = "default_true")]
    pub shuffle: bool,
    #[serde(default)]
    pub llm: LlmConfig,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/neet-mock/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub exam: ExamConfig,
    #[serde(default)]
    pub marking: MarkingScheme,
    #[serde(default)]
    pub practice: PracticeConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default = "default_books")]
    pub books: Vec<Book>,
}

// Default functions
fn default_subjects() -> Vec<SubjectConfig> {
    [("Physics", 45), ("Chemistry", 45), ("Biology", 90)]
        .into_iter()
        .map(|(name, questions)| SubjectConfig {
            name: name.into(),
            questions,
        })
        .collect()
}
fn default_duration_minutes() -> u64 {
    200
}
fn default_pass_ratio() -> f64 {
    DEFAULT_PASS_RATIO
}
fn default_practice_questions() -> usize {
    10
}
fn default_endpoint() -> String {
    crate::source::DEFAULT_ENDPOINT.into()
}
fn default_model() -> String {
    crate::source::DEFAULT_MODEL.into()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_max_tokens() -> u32 {
    crate::source::DEFAULT_MAX_TOKENS
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_bank_path() -> String {
    "questions.json".into()
}
fn default_true() -> bool {
    true
}
fn default_books() -> Vec<Book> {
    const NCERT: &str = "https://ncert.nic.in/textbook.php";
    [
        ("Physics", "NCERT Physics Class XI (Parts I and II)"),
        ("Physics", "NCERT Physics Class XII (Parts I and II)"),
        ("Chemistry", "NCERT Chemistry Class XI (Parts I and II)"),
        ("Chemistry", "NCERT Chemistry Class XII (Parts I and II)"),
        ("Biology", "NCERT Biology Class XI"),
        ("Biology", "NCERT Biology Class XII"),
    ]
    .into_iter()
    .map(|(subject, title)| Book::new(subject, title, NCERT))
    .collect()
}

impl Default for ExamConfig {
    fn default() -> Self {
        Self {
            subjects: default_subjects(),
            duration_minutes: default_duration_minutes(),
            pass_ratio: default_pass_ratio(),
        }
    }
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            default_questions: default_practice_questions(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            bank_path: default_bank_path(),
            shuffle: true,
            llm: LlmConfig::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exam: ExamConfig::default(),
            marking: MarkingScheme::default(),
            practice: PracticeConfig::default(),
            source: SourceConfig::default(),
            books: default_books(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(root: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(root: &mut serde_json::Value, key: &str, value: &str) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => {
                        serde_json::Value::Bool(value.parse::<bool>().map_err(|e| invalid(e.to_string()))?)
                    }
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<i64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn flatten(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
        match value {
            serde_json::Value::Object(map) => {
                for (k, v) in map {
                    let key = if prefix.is_empty() {
                        k.clone()
                    } else {
                        format!("{prefix}.{k}")
                    };
                    Self::flatten(&key, v, out);
                }
            }
            serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
            other => out.push((prefix.to_string(), other.to_string())),
        }
    }

    /// `~/.config/neet-mock/config.toml`.
    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                tracing::info!(path = %path.display(), "default configuration written");
                if let Some(dir) = path.parent() {
                    let bank = cfg.bank_path(dir);
                    QuestionBank::install_sample(&bank).map_err(|e| ConfigError::SaveFailed {
                        path: bank.clone(),
                        message: e.to_string(),
                    })?;
                }
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Every leaf key with its value, in dot-path form.
    pub fn list(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            Self::flatten("", &json, &mut out);
        }
        out
    }

    /// Update a value in memory; the result must still validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting config is invalid.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a value by key and save. Returns error if key is unknown.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Reject configurations no exam can be run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| {
            Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: message.to_string(),
            })
        };

        if self.exam.subjects.is_empty() {
            return invalid("exam.subjects", "at least one subject is required");
        }
        if self.exam.subjects.iter().any(|s| s.name.trim().is_empty()) {
            return invalid("exam.subjects", "subject names must not be blank");
        }
        if self.exam.duration_minutes == 0 {
            return invalid("exam.duration_minutes", "must be greater than zero");
        }
        if !(self.exam.pass_ratio > 0.0 && self.exam.pass_ratio <= 1.0) {
            return invalid("exam.pass_ratio", "must be in (0, 1]");
        }
        if self.marking.correct_delta <= 0 {
            return invalid("marking.correct_delta", "must be positive");
        }
        if let Err(e) = url::Url::parse(&self.source.llm.endpoint) {
            return Err(ConfigError::InvalidValue {
                key: "source.llm.endpoint".into(),
                message: e.to_string(),
            });
        }
        Ok(())
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            marking: self.marking,
            duration_secs: self.exam.duration_minutes * 60,
            pass_ratio: self.exam.pass_ratio,
        }
    }

    /// Subjects and counts of the full exam, in configured order.
    pub fn exam_plan(&self) -> Vec<SubjectPlan> {
        self.exam
            .subjects
            .iter()
            .map(|s| SubjectPlan::new(s.name.clone(), s.questions))
            .collect()
    }

    pub fn library(&self) -> Library {
        Library::new(self.books.clone())
    }

    pub fn bank_path(&self, base_dir: &Path) -> PathBuf {
        let path = PathBuf::from(&self.source.bank_path);
        if path.is_absolute() {
            path
        } else {
            base_dir.join(path)
        }
    }

    pub fn llm_settings(&self) -> LlmSettings {
        let llm = &self.source.llm;
        LlmSettings {
            endpoint: llm.endpoint.clone(),
            model: llm.model.clone(),
            api_key: std::env::var(&llm.api_key_env).ok(),
            api_key_env: llm.api_key_env.clone(),
            max_tokens: llm.max_tokens,
            timeout: Duration::from_secs(llm.timeout_secs),
        }
    }

    /// Build the configured question source. Relative bank paths resolve
    /// against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the question bank cannot be read.
    pub fn build_source(&self, base_dir: &Path) -> Result<Box<dyn QuestionSource>, CoreError> {
        match self.source.kind {
            SourceKind::Bank => {
                let bank = QuestionBank::load(self.bank_path(base_dir))?.with_shuffle(self.source.shuffle);
                Ok(Box::new(bank))
            }
            SourceKind::Llm => Ok(Box::new(LlmSource::new(self.llm_settings()))),
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.exam.subjects, cfg.exam.subjects);
        assert_eq!(parsed.books.len(), 6);
        assert_eq!(parsed.source.kind, SourceKind::Bank);
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        let counts: Vec<_> = cfg.exam.subjects.iter().map(|s| (s.name.as_str(), s.questions)).collect();
        assert_eq!(counts, vec![("Physics", 45), ("Chemistry", 45), ("Biology", 90)]);
        assert_eq!(cfg.exam.duration_minutes, 200);
        assert_eq!(cfg.session_settings().duration_secs, 12_000);
        assert_eq!(cfg.marking, MarkingScheme::default());
        assert_eq!(cfg.practice.default_questions, 10);
        assert_eq!(cfg.source.llm.model, "gpt-4o-mini");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [exam]
            duration_minutes = 30

            [source]
            kind = "llm"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.exam.duration_minutes, 30);
        assert_eq!(cfg.exam.subjects.len(), 3);
        assert_eq!(cfg.source.kind, SourceKind::Llm);
        assert_eq!(cfg.source.llm.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("exam.duration_minutes").as_deref(), Some("200"));
        assert_eq!(cfg.get("marking.wrong_delta").as_deref(), Some("-1"));
        assert_eq!(cfg.get("source.kind").as_deref(), Some("bank"));
        assert!(cfg.get("exam.missing_key").is_none());
    }

    #[test]
    fn apply_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.apply("marking.wrong_delta", "0").unwrap();
        cfg.apply("source.kind", "llm").unwrap();
        cfg.apply("exam.pass_ratio", "0.5").unwrap();
        cfg.apply("source.shuffle", "false").unwrap();
        assert_eq!(cfg.marking.wrong_delta, 0);
        assert_eq!(cfg.source.kind, SourceKind::Llm);
        assert_eq!(cfg.exam.pass_ratio, 0.5);
        assert!(!cfg.source.shuffle);
    }

    #[test]
    fn apply_accepts_json_for_lists() {
        let mut cfg = Config::default();
        cfg.apply("exam.subjects", r#"[{"name": "Biology", "questions": 5}]"#).unwrap();
        assert_eq!(cfg.exam_plan(), vec![SubjectPlan::new("Biology", 5)]);
    }

    #[test]
    fn apply_rejects_unknown_key_and_bad_types() {
        let mut cfg = Config::default();
        assert!(matches!(cfg.apply("exam.nonexistent", "1"), Err(ConfigError::UnknownKey(_))));
        assert!(matches!(cfg.apply("", "1"), Err(ConfigError::UnknownKey(_))));
        assert!(matches!(
            cfg.apply("source.shuffle", "maybe"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            cfg.apply("source.kind", "carrier-pigeon"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(cfg.source.kind, SourceKind::Bank);
    }

    #[test]
    fn validate_rejects_unusable_values() {
        let mut cfg = Config::default();
        for (key, value) in [
            ("exam.duration_minutes", "0"),
            ("exam.pass_ratio", "1.5"),
            ("exam.pass_ratio", "0"),
            ("marking.correct_delta", "0"),
            ("exam.subjects", "[]"),
            ("source.llm.endpoint", "not a url"),
        ] {
            let err = cfg.apply(key, value).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { .. }), "{key}={value}");
        }
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn list_flattens_leaves() {
        let list = Config::default().list();
        assert!(list.contains(&("exam.duration_minutes".to_string(), "200".to_string())));
        assert!(list.contains(&("source.llm.max_tokens".to_string(), "16384".to_string())));
    }

    #[test]
    fn load_from_writes_default_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.exam.duration_minutes, 200);

        // A fresh install gets a usable bank next to the config.
        let bank = QuestionBank::load(cfg.bank_path(dir.path())).unwrap();
        assert_eq!(bank.len("Physics"), 5);
        assert!(cfg.build_source(dir.path()).is_ok());

        let mut cfg = cfg;
        cfg.apply("exam.duration_minutes", "90").unwrap();
        cfg.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().exam.duration_minutes, 90);
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "exam = 3").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::LoadFailed { .. })));
    }

    #[test]
    fn bank_path_resolves_relative_to_base() {
        let mut cfg = Config::default();
        let base = Path::new("/data");
        assert_eq!(cfg.bank_path(base), PathBuf::from("/data/questions.json"));
        cfg.source.bank_path = "/srv/bank.json".into();
        assert_eq!(cfg.bank_path(base), PathBuf::from("/srv/bank.json"));
    }

    #[test]
    fn build_source_fails_for_missing_bank() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::default().build_source(dir.path()).err().unwrap();
        assert!(matches!(err, CoreError::Source(_)));
    }
}
