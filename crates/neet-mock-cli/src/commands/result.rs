use neet_mock_core::{format_clock, AttemptKind};
use serde_json::json;

use super::{print_json, CliResult, Workspace};

/// Print the most recently submitted attempt's score.
pub fn run() -> CliResult {
    let ws = Workspace::open()?;
    let session = ws.load_polled()?;

    let outcome = match session.latest_result() {
        Some((kind, report)) => {
            let exam = session.exam();
            let is_exam = kind == AttemptKind::Exam;
            let time_taken = match (exam.started_at(), exam.submitted_at()) {
                (Some(start), Some(end)) if is_exam => Some(format_clock((end - start).num_seconds().max(0) as u64)),
                _ => None,
            };
            print_json(&json!({
                "attempt": kind,
                "passed": session.passed(report),
                "percentage": report.percentage(),
                "pass_ratio": session.settings().pass_ratio,
                "time_taken": time_taken,
                "auto_submitted": is_exam && exam.was_auto_submitted(),
                "report": report,
            }))
        }
        None => Err("no submitted attempt yet; finish an exam or practice set first".into()),
    };

    ws.finish(&session, outcome)
}
