use clap::Subcommand;
use neet_mock_core::{format_clock, ExamSession, SectionStatus};
use serde_json::{json, Value};

use super::{print_json, CliResult, Workspace};

#[derive(Subcommand)]
pub enum ExamAction {
    /// Provision the paper (once) and enter the exam
    Start,
    /// Print the paper with the selected answers
    Show {
        /// Only this subject
        #[arg(long)]
        subject: Option<String>,
    },
    /// Answer a question (index is 0-based)
    Answer {
        subject: String,
        index: usize,
        label: String,
    },
    /// Remove an answer
    Clear { subject: String, index: usize },
    /// Print the remaining time
    Time,
    /// Submit the exam for scoring
    Submit,
}

pub async fn run(action: ExamAction) -> CliResult {
    let ws = Workspace::open()?;
    let mut session = ws.load_polled()?;
    let outcome = apply(&ws, &mut session, action).await;
    ws.finish(&session, outcome)
}

async fn apply(ws: &Workspace, session: &mut ExamSession, action: ExamAction) -> CliResult {
    match action {
        ExamAction::Start => {
            let source = ws.source()?;
            let events = session.enter_exam(source.as_ref(), &ws.config.exam_plan()).await?;
            if let Some(paper) = session.paper() {
                for section in paper.failed_sections() {
                    if let SectionStatus::Failed { reason } = &section.status {
                        eprintln!("warning: {} unavailable: {reason}", section.subject);
                    }
                }
            }
            if events.is_empty() {
                print_json(&session.snapshot_at(chrono::Utc::now()))?;
            }
            for event in &events {
                print_json(event)?;
            }
        }
        ExamAction::Show { subject } => {
            print_json(&render_paper(session, subject.as_deref()))?;
        }
        ExamAction::Answer { subject, index, label } => {
            let event = session.record_answer(&subject, index, &label)?;
            print_json(&event)?;
        }
        ExamAction::Clear { subject, index } => match session.clear_answer(&subject, index)? {
            Some(event) => print_json(&event)?,
            None => print_json(&json!({ "type": "NothingToClear" }))?,
        },
        ExamAction::Time => {
            let remaining = session.remaining_time();
            print_json(&json!({
                "remaining_secs": remaining,
                "clock": format_clock(remaining),
                "started": session.exam().started_at().is_some(),
                "submitted": session.is_submitted(),
            }))?;
        }
        ExamAction::Submit => {
            let event = session.submit_exam()?;
            ws.emit(session, &event)?;
        }
    }
    Ok(())
}

/// Questions with the candidate's selections. Correct answers and
/// explanations are revealed only after submission.
fn render_paper(session: &ExamSession, only: Option<&str>) -> Value {
    let Some(paper) = session.paper() else {
        return json!({ "sections": [] });
    };
    let reveal = session.is_submitted();

    let sections: Vec<Value> = paper
        .sections()
        .iter()
        .filter(|s| only.map_or(true, |name| s.subject.eq_ignore_ascii_case(name)))
        .map(|section| {
            let questions: Vec<Value> = section
                .questions
                .iter()
                .enumerate()
                .map(|(index, q)| {
                    let mut entry = json!({
                        "index": index,
                        "text": q.text,
                        "options": q.options,
                        "selected": session.answer_state(&section.subject, index),
                    });
                    if reveal {
                        entry["correct_label"] = json!(q.correct_label);
                        entry["explanation"] = json!(q.explanation);
                    }
                    entry
                })
                .collect();
            json!({
                "subject": section.subject,
                "status": section.status,
                "questions": questions,
            })
        })
        .collect();

    json!({
        "remaining_secs": session.remaining_time(),
        "submitted": reveal,
        "sections": sections,
    })
}
