//! Negative-marking scorer.
//!
//! Scoring walks the paper, not the answer sheet, so every question that
//! exists lands in exactly one of correct / wrong / unattempted.
//!
//! ```text
//! total = correct * correct_delta + wrong * wrong_delta + unattempted * unattempted_delta
//! max   = questions * correct_delta
//! ```

use serde::{Deserialize, Serialize};

use crate::paper::QuestionPaper;
use crate::session::AnswerSheet;

/// Default share of `max_score` needed to pass.
pub const DEFAULT_PASS_RATIO: f64 = 0.6;

/// Marks awarded per question outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkingScheme {
    #[serde(default = "default_correct_delta")]
    pub correct_delta: i32,
    #[serde(default = "default_wrong_delta")]
    pub wrong_delta: i32,
    /// Zero unless configured otherwise; unattempted is not a hidden penalty.
    #[serde(default)]
    pub unattempted_delta: i32,
}

fn default_correct_delta() -> i32 {
    4
}
fn default_wrong_delta() -> i32 {
    -1
}

impl Default for MarkingScheme {
    fn default() -> Self {
        Self {
            correct_delta: default_correct_delta(),
            wrong_delta: default_wrong_delta(),
            unattempted_delta: 0,
        }
    }
}

/// Per-subject slice of a [`ScoreReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectScore {
    pub subject: String,
    pub correct: usize,
    pub wrong: usize,
    pub unattempted: usize,
    pub score: i64,
}

/// Outcome of scoring one attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub correct_count: usize,
    pub wrong_count: usize,
    pub unattempted_count: usize,
    pub total_score: i64,
    pub max_score: i64,
    #[serde(default)]
    pub subjects: Vec<SubjectScore>,
}

impl ScoreReport {
    pub fn total_questions(&self) -> usize {
        self.correct_count + self.wrong_count + self.unattempted_count
    }

    /// `total_score >= pass_ratio * max_score`.
    pub fn passed(&self, pass_ratio: f64) -> bool {
        self.total_score as f64 >= pass_ratio * self.max_score as f64
    }

    /// Score as a percentage of the maximum; 0 for an empty paper.
    pub fn percentage(&self) -> f64 {
        if self.max_score == 0 {
            return 0.0;
        }
        self.total_score as f64 / self.max_score as f64 * 100.0
    }
}

/// Score `answers` against `paper`.
///
/// An empty paper yields an all-zero report. Answers recorded for subjects
/// or indices the paper does not contain are ignored.
pub fn score(paper: &QuestionPaper, answers: &AnswerSheet, scheme: &MarkingScheme) -> ScoreReport {
    let mut report = ScoreReport::default();

    for section in paper.sections() {
        let mut subject = SubjectScore {
            subject: section.subject.clone(),
            correct: 0,
            wrong: 0,
            unattempted: 0,
            score: 0,
        };

        for (index, question) in section.questions.iter().enumerate() {
            match answers.get(&section.subject, index) {
                Some(label) if question.is_correct(label) => {
                    subject.correct += 1;
                    subject.score += i64::from(scheme.correct_delta);
                }
                Some(_) => {
                    subject.wrong += 1;
                    subject.score += i64::from(scheme.wrong_delta);
                }
                None => {
                    subject.unattempted += 1;
                    subject.score += i64::from(scheme.unattempted_delta);
                }
            }
        }

        report.correct_count += subject.correct;
        report.wrong_count += subject.wrong;
        report.unattempted_count += subject.unattempted;
        report.total_score += subject.score;
        report.subjects.push(subject);
    }

    report.max_score = paper.total_questions() as i64 * i64::from(scheme.correct_delta);
    report
}
