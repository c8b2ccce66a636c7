//! Question papers and their provisioning from a [`QuestionSource`].
//!
//! [`QuestionSource`]: crate::source::QuestionSource

mod provision;
mod question;

pub use provision::{provision_paper, SubjectPlan};
pub use question::{normalize_label, Question, MAX_OPTIONS, MIN_OPTIONS};

use serde::{Deserialize, Serialize};

/// Outcome of loading one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SectionStatus {
    Loaded,
    /// The source failed; the section is empty and the UI shows `reason`.
    Failed { reason: String },
}

/// All questions of one subject, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub subject: String,
    pub questions: Vec<Question>,
    pub status: SectionStatus,
}

impl Section {
    pub fn loaded(subject: impl Into<String>, questions: Vec<Question>) -> Self {
        Self {
            subject: subject.into(),
            questions,
            status: SectionStatus::Loaded,
        }
    }

    pub fn failed(subject: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            questions: Vec::new(),
            status: SectionStatus::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, SectionStatus::Failed { .. })
    }
}

/// Subject-keyed question paper. Section order is the configured subject
/// order; question order defines question numbering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionPaper {
    sections: Vec<Section>,
}

impl QuestionPaper {
    /// Build a paper from sections. A later section for an already present
    /// subject replaces the earlier one.
    pub fn new(sections: impl IntoIterator<Item = Section>) -> Self {
        let mut paper = Self::default();
        for section in sections {
            paper.insert(section);
        }
        paper
    }

    /// Shorthand for a paper whose sections all loaded.
    pub fn from_subjects<S: Into<String>>(subjects: impl IntoIterator<Item = (S, Vec<Question>)>) -> Self {
        Self::new(
            subjects
                .into_iter()
                .map(|(subject, questions)| Section::loaded(subject, questions)),
        )
    }

    fn insert(&mut self, section: Section) {
        match self.sections.iter_mut().find(|s| s.subject == section.subject) {
            Some(existing) => *existing = section,
            None => self.sections.push(section),
        }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, subject: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.subject == subject)
    }

    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.subject.as_str())
    }

    pub fn questions(&self, subject: &str) -> Option<&[Question]> {
        self.section(subject).map(|s| s.questions.as_slice())
    }

    pub fn question(&self, subject: &str, index: usize) -> Option<&Question> {
        self.questions(subject)?.get(index)
    }

    pub fn total_questions(&self) -> usize {
        self.sections.iter().map(|s| s.questions.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_questions() == 0
    }

    /// Sections whose source failed, for warning display.
    pub fn failed_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|s| s.is_failed())
    }

    /// Every subject has at least one question.
    pub fn is_ready(&self) -> bool {
        !self.sections.is_empty() && self.sections.iter().all(|s| !s.questions.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(text: &str) -> Question {
        Question::new(text, [("A", "yes"), ("B", "no")], "A", None).unwrap()
    }

    #[test]
    fn keeps_subject_and_question_order() {
        let paper = QuestionPaper::from_subjects([
            ("Physics", vec![question("p0"), question("p1")]),
            ("Chemistry", vec![question("c0")]),
        ]);
        assert_eq!(paper.subjects().collect::<Vec<_>>(), vec!["Physics", "Chemistry"]);
        assert_eq!(paper.question("Physics", 1).unwrap().text, "p1");
        assert_eq!(paper.total_questions(), 3);
        assert!(paper.is_ready());
    }

    #[test]
    fn failed_section_is_empty_and_reported() {
        let paper = QuestionPaper::new([
            Section::loaded("Physics", vec![question("p0")]),
            Section::failed("Chemistry", "timeout"),
        ]);
        assert_eq!(paper.questions("Chemistry"), Some(&[][..]));
        let failed: Vec<_> = paper.failed_sections().map(|s| s.subject.as_str()).collect();
        assert_eq!(failed, vec!["Chemistry"]);
        assert!(!paper.is_ready());
    }

    #[test]
    fn duplicate_subject_replaces_section() {
        let paper = QuestionPaper::new([
            Section::failed("Physics", "down"),
            Section::loaded("Physics", vec![question("p0")]),
        ]);
        assert_eq!(paper.sections().len(), 1);
        assert!(!paper.sections()[0].is_failed());
    }

    #[test]
    fn unknown_lookups_are_none() {
        let paper = QuestionPaper::default();
        assert!(paper.question("Biology", 0).is_none());
        assert!(paper.is_empty());
        assert!(!paper.is_ready());
    }
}
