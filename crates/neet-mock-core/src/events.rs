use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{AttemptKind, SessionId, View};

/// Every state change of a session produces an Event.
/// The UI renders from them; the CLI prints them as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    ViewChanged {
        from: View,
        to: View,
        at: DateTime<Utc>,
    },
    PaperProvisioned {
        subjects: Vec<String>,
        questions: usize,
        /// Subjects whose source failed; shown as warnings.
        failed_subjects: Vec<String>,
        at: DateTime<Utc>,
    },
    ExamStarted {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    AnswerRecorded {
        attempt: AttemptKind,
        subject: String,
        index: usize,
        label: String,
        /// Label this answer replaced, if the question was already answered.
        previous: Option<String>,
        at: DateTime<Utc>,
    },
    AnswerCleared {
        attempt: AttemptKind,
        subject: String,
        index: usize,
        at: DateTime<Utc>,
    },
    PracticeStarted {
        subject: String,
        questions: usize,
        warning: Option<String>,
        at: DateTime<Utc>,
    },
    AttemptSubmitted {
        attempt: AttemptKind,
        /// True when the countdown forced the submission.
        auto_submitted: bool,
        correct_count: usize,
        wrong_count: usize,
        unattempted_count: usize,
        total_score: i64,
        max_score: i64,
        passed: bool,
        at: DateTime<Utc>,
    },
    SessionReset {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        session_id: SessionId,
        view: View,
        exam_started: bool,
        submitted: bool,
        remaining_secs: u64,
        answered: usize,
        total_questions: usize,
        at: DateTime<Utc>,
    },
}
