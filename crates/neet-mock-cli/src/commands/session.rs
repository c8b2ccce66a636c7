use clap::Subcommand;
use neet_mock_core::ExamSession;

use super::{print_json, CliResult, Workspace};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Print the current session state as JSON
    Status,
    /// Discard the current attempts and return to Home
    Reset,
}

pub fn run(action: SessionAction) -> CliResult {
    let ws = Workspace::open()?;

    match action {
        SessionAction::Status => {
            let session = ws.load_polled()?;
            let outcome = print_json(&session.snapshot_at(chrono::Utc::now()));
            ws.finish(&session, outcome)
        }
        SessionAction::Reset => {
            // A reset session picks up the current exam settings.
            let mut session = ExamSession::with_id(ws.load_session().id(), ws.config.session_settings());
            let outcome = print_json(&session.reset());
            ws.finish(&session, outcome)
        }
    }
}
