//! Session state: navigation, answers, the exam clock and submission.
//!
//! All per-candidate state lives in an [`ExamSession`]. Nothing is global;
//! several sessions can be served side by side through a [`SessionRegistry`].

mod answers;
mod exam;
mod registry;
mod slot;
mod timer;
mod view;

pub use answers::AnswerSheet;
pub use exam::{
    Attempt, AttemptKind, ExamSession, PracticeSet, SessionId, SessionSettings, DEFAULT_DURATION_SECS,
};
pub use registry::{SessionHandle, SessionRegistry};
pub use slot::Slot;
pub use timer::{format_clock, remaining_time};
pub use view::View;
