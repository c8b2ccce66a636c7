use clap::Subcommand;
use neet_mock_core::Database;

use super::{print_json, CliResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Attempt counts, best exam score and average percentage
    Summary,
    /// Most recent attempts
    History {
        /// Maximum number of attempts to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },
}

pub fn run(action: StatsAction) -> CliResult {
    let db = Database::open()?;
    match action {
        StatsAction::Summary => print_json(&db.stats()?),
        StatsAction::History { limit } => print_json(&db.attempt_history(limit)?),
    }
}
