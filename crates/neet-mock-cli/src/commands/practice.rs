use clap::Subcommand;
use neet_mock_core::{ExamSession, View};
use serde_json::{json, Value};

use super::{print_json, CliResult, Workspace};

#[derive(Subcommand)]
pub enum PracticeAction {
    /// Start a practice set for one subject (replaces any open set)
    Start {
        subject: String,
        /// Number of questions; defaults to practice.default_questions
        #[arg(long)]
        count: Option<usize>,
    },
    /// Print the open practice set
    Show,
    /// Answer a practice question (index is 0-based)
    Answer { index: usize, label: String },
    /// Score the practice set
    Submit,
}

pub async fn run(action: PracticeAction) -> CliResult {
    let ws = Workspace::open()?;
    let mut session = ws.load_polled()?;
    let outcome = apply(&ws, &mut session, action).await;
    ws.finish(&session, outcome)
}

async fn apply(ws: &Workspace, session: &mut ExamSession, action: PracticeAction) -> CliResult {
    match action {
        PracticeAction::Start { subject, count } => {
            if session.view() != View::Practice {
                if let Some(event) = session.navigate(View::Practice)? {
                    print_json(&event)?;
                }
            }
            let count = count.unwrap_or(ws.config.practice.default_questions);
            let source = ws.source()?;
            let event = session.start_practice(source.as_ref(), &subject, count).await?;
            print_json(&event)?;
        }
        PracticeAction::Show => print_json(&render(session))?,
        PracticeAction::Answer { index, label } => {
            let event = session.record_practice_answer(index, &label)?;
            print_json(&event)?;
        }
        PracticeAction::Submit => {
            let event = session.submit_practice()?;
            ws.emit(session, &event)?;
        }
    }
    Ok(())
}

fn render(session: &ExamSession) -> Value {
    let Some(practice) = session.practice() else {
        return json!({ "practice": null });
    };
    let attempt = &practice.attempt;
    let reveal = attempt.is_submitted();
    let questions: Vec<Value> = attempt
        .paper()
        .and_then(|p| p.questions(&practice.subject))
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(index, q)| {
            let mut entry = json!({
                "index": index,
                "text": q.text,
                "options": q.options,
                "selected": attempt.answers().get(&practice.subject, index),
            });
            if reveal {
                entry["correct_label"] = json!(q.correct_label);
                entry["explanation"] = json!(q.explanation);
            }
            entry
        })
        .collect();

    json!({
        "subject": practice.subject,
        "submitted": reveal,
        "questions": questions,
    })
}
