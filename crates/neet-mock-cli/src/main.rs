use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "neet-mock", version, about = "Timed NEET mock exams from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Session state
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Switch view
    Nav {
        #[arg(value_enum)]
        target: commands::nav::Target,
    },
    /// Full timed exam
    Exam {
        #[command(subcommand)]
        action: commands::exam::ExamAction,
    },
    /// Single-subject practice sets
    Practice {
        #[command(subcommand)]
        action: commands::practice::PracticeAction,
    },
    /// Score of the last submitted attempt
    Result,
    /// Study books
    Books {
        /// Only books for this subject
        #[arg(long)]
        subject: Option<String>,
    },
    /// Attempt history and statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    // stdout carries JSON; logs go to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

#[tokio::main]
async fn main() {
    // Load .env file (if present), e.g. for OPENAI_API_KEY
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Session { action } => commands::session::run(action),
        Commands::Nav { target } => commands::nav::run(target),
        Commands::Exam { action } => commands::exam::run(action).await,
        Commands::Practice { action } => commands::practice::run(action).await,
        Commands::Result => commands::result::run(),
        Commands::Books { subject } => commands::books::run(subject),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
