use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 4;

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    /// Option label ("A".."D") to option text. Labels are kept sorted.
    pub options: BTreeMap<String, String>,
    pub correct_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Normalise an option label as typed by a candidate or emitted by a source:
/// `" b) "` becomes `"B"`.
pub fn normalize_label(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('(')
        .trim_end_matches([')', '.', ':'])
        .trim()
        .to_uppercase()
}

impl Question {
    /// Build a question from `(label, text)` pairs and validate it.
    pub fn new<I, L, T>(
        text: impl Into<String>,
        options: I,
        correct_label: &str,
        explanation: Option<String>,
    ) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (L, T)>,
        L: AsRef<str>,
        T: Into<String>,
    {
        let mut map = BTreeMap::new();
        let mut given = 0;
        for (label, option) in options {
            given += 1;
            map.insert(normalize_label(label.as_ref()), option.into());
        }
        if map.len() != given {
            return Err(ValidationError::InvalidValue {
                field: "options".into(),
                message: "option labels must be unique".into(),
            });
        }

        let question = Self {
            text: text.into(),
            options: map,
            correct_label: normalize_label(correct_label),
            explanation: explanation.filter(|e| !e.trim().is_empty()),
        };
        question.validate()?;
        Ok(question)
    }

    /// Check the question invariants.
    ///
    /// # Errors
    ///
    /// Fails on empty text, an option count outside 2..=4, a blank label or
    /// option, or a correct label that is not an option key.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.text.trim().is_empty() {
            return Err(ValidationError::Empty("question text".into()));
        }
        let len = self.options.len();
        if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&len) {
            return Err(ValidationError::OptionCount {
                min: MIN_OPTIONS,
                max: MAX_OPTIONS,
                len,
            });
        }
        for (label, option) in &self.options {
            if label.is_empty() {
                return Err(ValidationError::Empty("option label".into()));
            }
            if option.trim().is_empty() {
                return Err(ValidationError::Empty(format!("option {label}")));
            }
        }
        if !self.options.contains_key(&self.correct_label) {
            return Err(ValidationError::UnknownCorrectLabel {
                label: self.correct_label.clone(),
                options: self.labels().map(str::to_string).collect(),
            });
        }
        Ok(())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.options.keys().map(String::as_str)
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.options.contains_key(label)
    }

    pub fn is_correct(&self, label: &str) -> bool {
        self.correct_label == label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abcd() -> Vec<(&'static str, &'static str)> {
        vec![("A", "1 m/s"), ("B", "2 m/s"), ("C", "3 m/s"), ("D", "4 m/s")]
    }

    #[test]
    fn builds_valid_question() {
        let q = Question::new("Speed?", abcd(), "b", None).unwrap();
        assert_eq!(q.correct_label, "B");
        assert_eq!(q.labels().collect::<Vec<_>>(), vec!["A", "B", "C", "D"]);
        assert!(q.is_correct("B"));
        assert!(!q.is_correct("A"));
    }

    #[test]
    fn rejects_correct_label_outside_options() {
        let err = Question::new("Speed?", abcd(), "E", None).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownCorrectLabel { .. }));
    }

    #[test]
    fn rejects_too_few_and_too_many_options() {
        let one = Question::new("Q", vec![("A", "x")], "A", None).unwrap_err();
        assert!(matches!(one, ValidationError::OptionCount { len: 1, .. }));

        let five = vec![("A", "1"), ("B", "2"), ("C", "3"), ("D", "4"), ("E", "5")];
        let err = Question::new("Q", five, "A", None).unwrap_err();
        assert!(matches!(err, ValidationError::OptionCount { len: 5, .. }));
    }

    #[test]
    fn rejects_duplicate_labels() {
        let dup = vec![("A", "1"), ("a", "2"), ("B", "3")];
        assert!(Question::new("Q", dup, "A", None).is_err());
    }

    #[test]
    fn rejects_blank_text() {
        let err = Question::new("   ", abcd(), "A", None).unwrap_err();
        assert_eq!(err, ValidationError::Empty("question text".into()));
    }

    #[test]
    fn normalizes_labels() {
        assert_eq!(normalize_label(" b) "), "B");
        assert_eq!(normalize_label("(c)"), "C");
        assert_eq!(normalize_label("d."), "D");
    }

    #[test]
    fn blank_explanation_is_dropped() {
        let q = Question::new("Q", abcd(), "A", Some("  ".into())).unwrap();
        assert!(q.explanation.is_none());
    }
}
