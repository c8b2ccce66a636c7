use std::fmt;

use serde::{Deserialize, Serialize};

/// Screens of the application.
///
/// ```text
/// Home <-> Books | Practice | Exam
/// Exam --(submit | timer expiry)--> Result
/// Practice --(submit practice)--> Result
/// Result --> Home
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Home,
    Books,
    Practice,
    Exam,
    Result,
}

impl View {
    pub const ALL: [View; 5] = [View::Home, View::Books, View::Practice, View::Exam, View::Result];

    /// Whether an explicit navigation from `self` to `target` is allowed.
    ///
    /// `Result` is never a navigation target; it is only reached by
    /// submitting an attempt.
    pub fn can_navigate_to(self, target: View) -> bool {
        match (self, target) {
            (_, View::Result) => false,
            (View::Result, View::Home) => true,
            (View::Result, _) => false,
            _ => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            View::Home => "home",
            View::Books => "books",
            View::Practice => "practice",
            View::Exam => "exam",
            View::Result => "result",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
