use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Selected option per (subject, question index).
///
/// Only questions the candidate touched have an entry; writing the same
/// index again replaces the previous label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSheet(BTreeMap<String, BTreeMap<usize, String>>);

impl AnswerSheet {
    /// Record `label`, returning the label it replaced.
    pub fn set(&mut self, subject: &str, index: usize, label: &str) -> Option<String> {
        self.0
            .entry(subject.to_string())
            .or_default()
            .insert(index, label.to_string())
    }

    pub fn get(&self, subject: &str, index: usize) -> Option<&str> {
        self.0.get(subject)?.get(&index).map(String::as_str)
    }

    /// Remove an answer, returning it if one existed.
    pub fn clear(&mut self, subject: &str, index: usize) -> Option<String> {
        let answers = self.0.get_mut(subject)?;
        let removed = answers.remove(&index);
        if answers.is_empty() {
            self.0.remove(subject);
        }
        removed
    }

    pub fn subject(&self, subject: &str) -> Option<&BTreeMap<usize, String>> {
        self.0.get(subject)
    }

    pub fn answered_count(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.answered_count() == 0
    }
}
