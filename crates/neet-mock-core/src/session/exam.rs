//! The per-candidate exam session.
//!
//! An [`ExamSession`] is an explicit context object: every operation takes
//! `&mut self`, so one session's mutations are serialised while separate
//! sessions share nothing.
//!
//! ## Lifecycle
//!
//! ```text
//! Home -> enter_exam (provision paper once, start clock once) -> Exam
//! Exam -> record_answer* -> submit_exam | poll at expiry -> Result
//! Result -> Home; the exam stays closed until reset()
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::answers::AnswerSheet;
use super::slot::Slot;
use super::timer::remaining_time;
use super::view::View;
use crate::error::SessionError;
use crate::events::Event;
use crate::paper::{normalize_label, provision_paper, QuestionPaper, SectionStatus, SubjectPlan};
use crate::scoring::{score, MarkingScheme, ScoreReport, DEFAULT_PASS_RATIO};
use crate::source::QuestionSource;

/// Full NEET paper length.
pub const DEFAULT_DURATION_SECS: u64 = 200 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptKind {
    Exam,
    Practice,
}

impl AttemptKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AttemptKind::Exam => "exam",
            AttemptKind::Practice => "practice",
        }
    }
}

/// Values fixed when the session is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub marking: MarkingScheme,
    pub duration_secs: u64,
    pub pass_ratio: f64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            marking: MarkingScheme::default(),
            duration_secs: DEFAULT_DURATION_SECS,
            pass_ratio: DEFAULT_PASS_RATIO,
        }
    }
}

/// One answerable paper: the timed exam or a practice set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    paper: Slot<QuestionPaper>,
    answers: AnswerSheet,
    started_at: Slot<DateTime<Utc>>,
    result: Option<ScoreReport>,
    submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    auto_submitted: bool,
}

impl Attempt {
    pub fn paper(&self) -> Option<&QuestionPaper> {
        self.paper.get()
    }

    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at.get().copied()
    }

    pub fn result(&self) -> Option<&ScoreReport> {
        self.result.as_ref()
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    pub fn is_submitted(&self) -> bool {
        self.result.is_some()
    }

    pub fn was_auto_submitted(&self) -> bool {
        self.auto_submitted
    }

    /// Validate `subject[index]` (and `label` when given) against the paper.
    fn check_target(&self, subject: &str, index: usize, label: Option<&str>) -> Result<(), SessionError> {
        if self.is_submitted() {
            return Err(SessionError::AttemptClosed);
        }
        let invalid = |reason: String| SessionError::InvalidAnswerTarget {
            subject: subject.to_string(),
            index,
            label: label.unwrap_or_default().to_string(),
            reason,
        };

        let paper = self.paper.get().ok_or_else(|| invalid("no paper provisioned".into()))?;
        let questions = paper
            .questions(subject)
            .ok_or_else(|| invalid(format!("unknown subject, paper has {:?}", paper.subjects().collect::<Vec<_>>())))?;
        let question = questions
            .get(index)
            .ok_or_else(|| invalid(format!("index out of range ({} questions)", questions.len())))?;
        if let Some(label) = label {
            if !question.has_label(label) {
                return Err(invalid(format!(
                    "not an option, expected one of {:?}",
                    question.labels().collect::<Vec<_>>()
                )));
            }
        }
        Ok(())
    }

    fn record(&mut self, subject: &str, index: usize, label: &str) -> Result<Option<String>, SessionError> {
        self.check_target(subject, index, Some(label))?;
        Ok(self.answers.set(subject, index, label))
    }

    fn clear(&mut self, subject: &str, index: usize) -> Result<Option<String>, SessionError> {
        self.check_target(subject, index, None)?;
        Ok(self.answers.clear(subject, index))
    }

    fn submit(&mut self, scheme: &MarkingScheme, now: DateTime<Utc>, auto: bool) -> ScoreReport {
        let empty = QuestionPaper::default();
        let report = score(self.paper.get().unwrap_or(&empty), &self.answers, scheme);
        self.result = Some(report.clone());
        self.submitted_at = Some(now);
        self.auto_submitted = auto;
        report
    }
}

/// A single-subject, untimed practice attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeSet {
    pub subject: String,
    pub attempt: Attempt,
}

/// Per-candidate session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamSession {
    id: SessionId,
    settings: SessionSettings,
    view: View,
    exam: Attempt,
    practice: Option<PracticeSet>,
    /// Which attempt the Result view shows.
    last_submitted: Option<AttemptKind>,
    created_at: DateTime<Utc>,
}

impl ExamSession {
    pub fn new(settings: SessionSettings) -> Self {
        Self::with_id(SessionId::new(), settings)
    }

    pub fn with_id(id: SessionId, settings: SessionSettings) -> Self {
        Self {
            id,
            settings,
            view: View::Home,
            exam: Attempt::default(),
            practice: None,
            last_submitted: None,
            created_at: Utc::now(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn exam(&self) -> &Attempt {
        &self.exam
    }

    pub fn practice(&self) -> Option<&PracticeSet> {
        self.practice.as_ref()
    }

    pub fn paper(&self) -> Option<&QuestionPaper> {
        self.exam.paper()
    }

    pub fn answers(&self) -> &AnswerSheet {
        self.exam.answers()
    }

    /// Label the candidate picked for an exam question, if any.
    pub fn answer_state(&self, subject: &str, index: usize) -> Option<&str> {
        self.exam.answers.get(subject, index)
    }

    pub fn is_submitted(&self) -> bool {
        self.exam.is_submitted()
    }

    /// Exam result, set once on submission.
    pub fn result(&self) -> Option<&ScoreReport> {
        self.exam.result()
    }

    /// The most recently submitted attempt's result.
    pub fn latest_result(&self) -> Option<(AttemptKind, &ScoreReport)> {
        let kind = self.last_submitted?;
        let report = match kind {
            AttemptKind::Exam => self.exam.result(),
            AttemptKind::Practice => self.practice.as_ref()?.attempt.result(),
        }?;
        Some((kind, report))
    }

    pub fn passed(&self, report: &ScoreReport) -> bool {
        report.passed(self.settings.pass_ratio)
    }

    pub fn remaining_time(&self) -> u64 {
        self.remaining_time_at(Utc::now())
    }

    /// Seconds left on the exam clock; recomputed on every call.
    pub fn remaining_time_at(&self, now: DateTime<Utc>) -> u64 {
        remaining_time(self.settings.duration_secs, self.exam.started_at(), now)
    }

    pub fn snapshot_at(&self, now: DateTime<Utc>) -> Event {
        Event::StateSnapshot {
            session_id: self.id,
            view: self.view,
            exam_started: self.exam.started_at.is_ready(),
            submitted: self.exam.is_submitted(),
            remaining_secs: self.remaining_time_at(now),
            answered: self.exam.answers.answered_count(),
            total_questions: self.exam.paper().map_or(0, QuestionPaper::total_questions),
            at: now,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn navigate(&mut self, target: View) -> Result<Option<Event>, SessionError> {
        self.navigate_at(target, Utc::now())
    }

    /// Explicit user navigation. Navigating to the current view is a no-op.
    ///
    /// The first entry into `Exam` starts the clock; later entries never
    /// restart it.
    pub fn navigate_at(&mut self, target: View, now: DateTime<Utc>) -> Result<Option<Event>, SessionError> {
        if target == self.view {
            return Ok(None);
        }
        if !self.view.can_navigate_to(target) {
            return Err(SessionError::InvalidTransition {
                from: self.view,
                to: target,
            });
        }
        if target == View::Exam {
            if self.exam.is_submitted() {
                return Err(SessionError::AttemptClosed);
            }
            if !self.exam.paper.is_ready() {
                return Err(SessionError::PaperNotProvisioned);
            }
            self.close_if_expired(now)?;
            if !self.exam.started_at.is_ready() {
                self.exam.started_at.get_or_insert_with(|| now);
                tracing::info!(session = %self.id, duration_secs = self.settings.duration_secs, "exam clock started");
            }
        }

        let from = std::mem::replace(&mut self.view, target);
        tracing::debug!(session = %self.id, %from, to = %target, "view changed");
        Ok(Some(Event::ViewChanged { from, to: target, at: now }))
    }

    /// Return the exam paper, provisioning it from `source` only if the
    /// session has none yet.
    pub async fn ensure_paper(&mut self, source: &dyn QuestionSource, plan: &[SubjectPlan]) -> &QuestionPaper {
        let fresh = if self.exam.paper.is_ready() {
            None
        } else {
            Some(provision_paper(source, plan).await)
        };
        self.exam.paper.get_or_insert_with(|| fresh.unwrap_or_default())
    }

    pub async fn enter_exam(
        &mut self,
        source: &dyn QuestionSource,
        plan: &[SubjectPlan],
    ) -> Result<Vec<Event>, SessionError> {
        self.enter_exam_at(source, plan, Utc::now()).await
    }

    /// Provision the paper if needed, then navigate to `Exam`.
    ///
    /// Returns `PaperProvisioned` (first call only), `ExamStarted` (first
    /// entry only) and `ViewChanged` as they happen.
    pub async fn enter_exam_at(
        &mut self,
        source: &dyn QuestionSource,
        plan: &[SubjectPlan],
        now: DateTime<Utc>,
    ) -> Result<Vec<Event>, SessionError> {
        if self.exam.is_submitted() {
            return Err(SessionError::AttemptClosed);
        }
        if self.view != View::Exam && !self.view.can_navigate_to(View::Exam) {
            return Err(SessionError::InvalidTransition {
                from: self.view,
                to: View::Exam,
            });
        }

        let mut events = Vec::new();
        if !self.exam.paper.is_ready() {
            let paper = self.ensure_paper(source, plan).await;
            events.push(Event::PaperProvisioned {
                subjects: paper.subjects().map(str::to_string).collect(),
                questions: paper.total_questions(),
                failed_subjects: paper.failed_sections().map(|s| s.subject.clone()).collect(),
                at: now,
            });
        }

        let was_started = self.exam.started_at.is_ready();
        events.extend(self.navigate_at(View::Exam, now)?);
        if !was_started {
            events.push(Event::ExamStarted {
                duration_secs: self.settings.duration_secs,
                at: now,
            });
        }
        Ok(events)
    }

    pub fn record_answer(&mut self, subject: &str, index: usize, label: &str) -> Result<Event, SessionError> {
        self.record_answer_at(subject, index, label, Utc::now())
    }

    /// Record (or change) the candidate's answer to an exam question.
    /// Once the clock has run out the exam is auto-submitted instead and
    /// the change is refused.
    pub fn record_answer_at(
        &mut self,
        subject: &str,
        index: usize,
        label: &str,
        now: DateTime<Utc>,
    ) -> Result<Event, SessionError> {
        self.close_if_expired(now)?;
        let label = normalize_label(label);
        let previous = self.exam.record(subject, index, &label)?;
        tracing::debug!(session = %self.id, %subject, index, %label, "answer recorded");
        Ok(Event::AnswerRecorded {
            attempt: AttemptKind::Exam,
            subject: subject.to_string(),
            index,
            label,
            previous,
            at: now,
        })
    }

    pub fn clear_answer(&mut self, subject: &str, index: usize) -> Result<Option<Event>, SessionError> {
        self.clear_answer_at(subject, index, Utc::now())
    }

    /// Un-answer an exam question. `None` if it had no answer.
    pub fn clear_answer_at(
        &mut self,
        subject: &str,
        index: usize,
        now: DateTime<Utc>,
    ) -> Result<Option<Event>, SessionError> {
        self.close_if_expired(now)?;
        let removed = self.exam.clear(subject, index)?;
        Ok(removed.map(|_| Event::AnswerCleared {
            attempt: AttemptKind::Exam,
            subject: subject.to_string(),
            index,
            at: now,
        }))
    }

    pub fn poll(&mut self) -> Option<Event> {
        self.poll_at(Utc::now())
    }

    /// Observe the clock. Auto-submits exactly once when time runs out;
    /// every other observation is side-effect free.
    pub fn poll_at(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if !self.exam.started_at.is_ready() || self.exam.is_submitted() {
            return None;
        }
        if self.remaining_time_at(now) > 0 {
            return None;
        }
        Some(self.finish(AttemptKind::Exam, now, true))
    }

    pub fn submit_exam(&mut self) -> Result<Event, SessionError> {
        self.submit_exam_at(Utc::now())
    }

    /// Explicit submission from the `Exam` view. If the clock already ran
    /// out the submission is reported as automatic.
    pub fn submit_exam_at(&mut self, now: DateTime<Utc>) -> Result<Event, SessionError> {
        if self.exam.is_submitted() {
            return Err(SessionError::AttemptClosed);
        }
        if self.view != View::Exam {
            return Err(SessionError::InvalidTransition {
                from: self.view,
                to: View::Result,
            });
        }
        if let Some(event) = self.poll_at(now) {
            return Ok(event);
        }
        Ok(self.finish(AttemptKind::Exam, now, false))
    }

    /// Open a new practice set of `count` questions for one subject,
    /// replacing any previous practice set. Must be on the `Practice` view.
    pub async fn start_practice(
        &mut self,
        source: &dyn QuestionSource,
        subject: &str,
        count: usize,
    ) -> Result<Event, SessionError> {
        if self.view != View::Practice {
            return Err(SessionError::InvalidTransition {
                from: self.view,
                to: View::Practice,
            });
        }

        let now = Utc::now();
        let paper = provision_paper(source, &[SubjectPlan::new(subject, count)]).await;
        let warning = paper.failed_sections().find_map(|s| match &s.status {
            SectionStatus::Failed { reason } => Some(reason.clone()),
            SectionStatus::Loaded => None,
        });
        let questions = paper.total_questions();

        let mut attempt = Attempt::default();
        attempt.paper.get_or_insert_with(|| paper);
        attempt.started_at.get_or_insert_with(|| now);
        self.practice = Some(PracticeSet {
            subject: subject.to_string(),
            attempt,
        });
        if self.last_submitted == Some(AttemptKind::Practice) {
            self.last_submitted = None;
        }

        tracing::info!(session = %self.id, %subject, questions, "practice set started");
        Ok(Event::PracticeStarted {
            subject: subject.to_string(),
            questions,
            warning,
            at: now,
        })
    }

    pub fn record_practice_answer(&mut self, index: usize, label: &str) -> Result<Event, SessionError> {
        let practice = self.practice.as_mut().ok_or(SessionError::NoPracticeSet)?;
        let label = normalize_label(label);
        let previous = practice.attempt.record(&practice.subject, index, &label)?;
        Ok(Event::AnswerRecorded {
            attempt: AttemptKind::Practice,
            subject: practice.subject.clone(),
            index,
            label,
            previous,
            at: Utc::now(),
        })
    }

    pub fn submit_practice(&mut self) -> Result<Event, SessionError> {
        self.submit_practice_at(Utc::now())
    }

    /// Score the practice set with the session's marking scheme and show
    /// the `Result` view.
    pub fn submit_practice_at(&mut self, now: DateTime<Utc>) -> Result<Event, SessionError> {
        let practice = self.practice.as_ref().ok_or(SessionError::NoPracticeSet)?;
        if practice.attempt.is_submitted() {
            return Err(SessionError::AttemptClosed);
        }
        if self.view != View::Practice {
            return Err(SessionError::InvalidTransition {
                from: self.view,
                to: View::Result,
            });
        }
        Ok(self.finish(AttemptKind::Practice, now, false))
    }

    /// Discard both attempts and return to `Home`. Id and settings are kept.
    pub fn reset_at(&mut self, now: DateTime<Utc>) -> Event {
        self.view = View::Home;
        self.exam = Attempt::default();
        self.practice = None;
        self.last_submitted = None;
        tracing::info!(session = %self.id, "session reset");
        Event::SessionReset { at: now }
    }

    pub fn reset(&mut self) -> Event {
        self.reset_at(Utc::now())
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Expiry is terminal: an exam whose clock ran out is auto-submitted
    /// here and every further change is refused. The submission is visible
    /// through [`ExamSession::result`].
    fn close_if_expired(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        match self.poll_at(now) {
            Some(_) => Err(SessionError::AttemptClosed),
            None => Ok(()),
        }
    }

    fn finish(&mut self, kind: AttemptKind, now: DateTime<Utc>, auto: bool) -> Event {
        let scheme = self.settings.marking;
        let report = match kind {
            AttemptKind::Exam => self.exam.submit(&scheme, now, auto),
            AttemptKind::Practice => match self.practice.as_mut() {
                Some(practice) => practice.attempt.submit(&scheme, now, auto),
                None => ScoreReport::default(),
            },
        };
        self.view = View::Result;
        self.last_submitted = Some(kind);

        let passed = self.passed(&report);
        tracing::info!(
            session = %self.id,
            attempt = kind.as_str(),
            auto_submitted = auto,
            total_score = report.total_score,
            max_score = report.max_score,
            passed,
            "attempt submitted"
        );
        Event::AttemptSubmitted {
            attempt: kind,
            auto_submitted: auto,
            correct_count: report.correct_count,
            wrong_count: report.wrong_count,
            unattempted_count: report.unattempted_count,
            total_score: report.total_score,
            max_score: report.max_score,
            passed,
            at: now,
        }
    }
}
