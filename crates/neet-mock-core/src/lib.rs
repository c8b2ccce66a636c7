//! # NEET Mock Core Library
//!
//! Core logic for a timed NEET mock-exam simulator. The CLI is a thin layer
//! over this crate; any other front end would be as well.
//!
//! ## Architecture
//!
//! - **Session**: per-candidate state machine (navigation, answers, the
//!   wall-clock exam timer, submission). The caller polls the timer; nothing
//!   runs in the background.
//! - **Paper**: questions grouped by subject and their one-time provisioning
//! - **Source**: where questions come from (a JSON question bank or a hosted
//!   language model), behind the [`QuestionSource`] trait
//! - **Scoring**: negative marking with a configurable scheme
//! - **Storage**: TOML configuration and SQLite attempt history
//!
//! ## Key Components
//!
//! - [`ExamSession`]: one candidate's exam and practice attempts
//! - [`SessionRegistry`]: isolated sessions side by side
//! - [`score`]: pure scoring of an answer sheet against a paper
//! - [`Config`]: application configuration management
//! - [`Database`]: attempt history and statistics

pub mod error;
pub mod events;
pub mod library;
pub mod paper;
pub mod scoring;
pub mod session;
pub mod source;
pub mod storage;

pub use error::{ConfigError, CoreError, DatabaseError, SessionError, SourceError, ValidationError};
pub use events::Event;
pub use library::{Book, Library};
pub use paper::{provision_paper, Question, QuestionPaper, Section, SectionStatus, SubjectPlan};
pub use scoring::{score, MarkingScheme, ScoreReport, SubjectScore};
pub use session::{
    format_clock, AnswerSheet, AttemptKind, ExamSession, SessionId, SessionRegistry, SessionSettings, View,
};
pub use source::{LlmSettings, LlmSource, QuestionBank, QuestionSource};
pub use storage::{data_dir, AttemptRecord, Config, Database, SourceKind, Stats};
