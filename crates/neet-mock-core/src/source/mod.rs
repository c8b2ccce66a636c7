//! External question sources.
//!
//! The session only knows the [`QuestionSource`] contract; whether questions
//! come from a local bank or a generation service is a configuration choice.

mod bank;
mod llm;
pub mod parse;

pub use bank::{QuestionBank, SAMPLE_BANK};
pub use llm::{LlmSettings, LlmSource, DEFAULT_ENDPOINT, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};

use async_trait::async_trait;

use crate::error::SourceError;
use crate::paper::Question;

/// Every question provider implements this trait.
///
/// Implementations are invoked at most once per subject while a paper is
/// provisioned and are never retried automatically.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Short identifier used in logs (e.g. "bank", "llm").
    fn name(&self) -> &str;

    /// Produce up to `count` questions for `subject`, in presentation order.
    async fn fetch_questions(&self, subject: &str, count: usize) -> Result<Vec<Question>, SourceError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// `count` valid questions whose correct answer is always "B".
    pub fn sample_questions(subject: &str, count: usize) -> Vec<Question> {
        (1..=count)
            .map(|i| {
                Question::new(
                    format!("{subject} question {i}"),
                    [("A", "alpha"), ("B", "beta"), ("C", "gamma"), ("D", "delta")],
                    "B",
                    None,
                )
                .unwrap()
            })
            .collect()
    }

    /// Wraps a source and counts calls.
    pub struct CountingSource<S> {
        pub inner: S,
        pub calls: AtomicUsize,
    }

    impl<S> CountingSource<S> {
        pub fn new(inner: S) -> Self {
            Self {
                inner,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl<S: QuestionSource> QuestionSource for CountingSource<S> {
        fn name(&self) -> &str {
            "counting"
        }

        async fn fetch_questions(&self, subject: &str, count: usize) -> Result<Vec<Question>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_questions(subject, count).await
        }
    }
}
