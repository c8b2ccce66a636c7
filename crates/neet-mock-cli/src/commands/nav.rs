use clap::ValueEnum;
use neet_mock_core::View;

use super::{print_json, CliResult, Workspace};

/// Views reachable by explicit navigation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Target {
    Home,
    Books,
    Practice,
    Exam,
}

impl From<Target> for View {
    fn from(target: Target) -> Self {
        match target {
            Target::Home => View::Home,
            Target::Books => View::Books,
            Target::Practice => View::Practice,
            Target::Exam => View::Exam,
        }
    }
}

pub fn run(target: Target) -> CliResult {
    let ws = Workspace::open()?;
    let mut session = ws.load_polled()?;

    let outcome = match session.navigate(target.into()) {
        Ok(Some(event)) => print_json(&event),
        Ok(None) => print_json(&session.snapshot_at(chrono::Utc::now())),
        Err(e) => Err(e.into()),
    };

    ws.finish(&session, outcome)
}
