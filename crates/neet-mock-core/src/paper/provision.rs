use serde::{Deserialize, Serialize};

use super::{QuestionPaper, Section};
use crate::source::QuestionSource;

/// How many questions to request for one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectPlan {
    pub subject: String,
    pub count: usize,
}

impl SubjectPlan {
    pub fn new(subject: impl Into<String>, count: usize) -> Self {
        Self {
            subject: subject.into(),
            count,
        }
    }
}

/// Fetch every planned subject once, in plan order.
///
/// A failing subject becomes an empty [`Section::failed`]; the others are
/// unaffected. Records that fail validation are dropped, and at most
/// `count` questions are kept per subject.
pub async fn provision_paper(source: &dyn QuestionSource, plan: &[SubjectPlan]) -> QuestionPaper {
    let mut sections = Vec::with_capacity(plan.len());

    for SubjectPlan { subject, count } in plan {
        let section = match source.fetch_questions(subject, *count).await {
            Ok(fetched) => {
                let fetched_len = fetched.len();
                let mut questions: Vec<_> = fetched
                    .into_iter()
                    .filter(|q| match q.validate() {
                        Ok(()) => true,
                        Err(e) => {
                            tracing::warn!(source = source.name(), %subject, "dropping question: {e}");
                            false
                        }
                    })
                    .collect();
                questions.truncate(*count);

                if questions.is_empty() && *count > 0 {
                    tracing::warn!(source = source.name(), %subject, fetched_len, "no usable questions");
                    Section::failed(subject.as_str(), "source returned no valid questions")
                } else {
                    if questions.len() < *count {
                        tracing::warn!(
                            source = source.name(),
                            %subject,
                            requested = *count,
                            received = questions.len(),
                            "short section"
                        );
                    }
                    Section::loaded(subject.as_str(), questions)
                }
            }
            Err(e) => {
                tracing::warn!(source = source.name(), %subject, "subject failed to load: {e}");
                Section::failed(subject.as_str(), e.to_string())
            }
        };
        sections.push(section);
    }

    let paper = QuestionPaper::new(sections);
    tracing::info!(
        source = source.name(),
        subjects = paper.sections().len(),
        questions = paper.total_questions(),
        failed = paper.failed_sections().count(),
        "paper provisioned"
    );
    paper
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::paper::Question;
    use crate::source::testing::sample_questions;
    use crate::source::QuestionBank;

    #[tokio::test]
    async fn failing_subject_is_isolated() {
        let source = QuestionBank::from_sections([("Physics", sample_questions("Physics", 5))]);
        let plan = [SubjectPlan::new("Physics", 5), SubjectPlan::new("Chemistry", 5)];

        let paper = provision_paper(&source, &plan).await;

        assert_eq!(paper.questions("Physics").unwrap().len(), 5);
        assert!(paper.section("Chemistry").unwrap().is_failed());
        assert_eq!(paper.questions("Chemistry").unwrap().len(), 0);
    }

    #[tokio::test]
    async fn truncates_to_requested_count_in_source_order() {
        let source = QuestionBank::from_sections([("Biology", sample_questions("Biology", 8))]);
        let paper = provision_paper(&source, &[SubjectPlan::new("Biology", 3)]).await;

        let texts: Vec<_> = paper
            .questions("Biology")
            .unwrap()
            .iter()
            .map(|q| q.text.as_str())
            .collect();
        assert_eq!(texts, vec!["Biology question 1", "Biology question 2", "Biology question 3"]);
    }

    #[tokio::test]
    async fn invalid_records_are_dropped() {
        let mut broken = sample_questions("Physics", 2);
        broken[0].correct_label = "Z".into();
        let source = QuestionBank::from_sections([("Physics", broken)]);

        let paper = provision_paper(&source, &[SubjectPlan::new("Physics", 2)]).await;
        assert_eq!(paper.questions("Physics").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn all_invalid_marks_section_failed() {
        let broken = vec![Question {
            text: String::new(),
            ..sample_questions("Physics", 1).remove(0)
        }];
        let source = QuestionBank::from_sections([("Physics", broken)]);

        let paper = provision_paper(&source, &[SubjectPlan::new("Physics", 1)]).await;
        assert!(paper.section("Physics").unwrap().is_failed());
    }

    #[tokio::test]
    async fn error_message_is_kept_as_reason() {
        let source = QuestionBank::from_sections(Vec::<(String, Vec<Question>)>::new());
        let paper = provision_paper(&source, &[SubjectPlan::new("Botany", 2)]).await;
        let section = paper.section("Botany").unwrap();
        assert_eq!(
            section.status,
            crate::paper::SectionStatus::Failed {
                reason: SourceError::UnknownSubject("Botany".into()).to_string()
            }
        );
    }
}
