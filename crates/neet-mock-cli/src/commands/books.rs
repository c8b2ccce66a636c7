use neet_mock_core::Config;

use super::{print_json, CliResult};

/// List the configured study books, optionally for one subject.
pub fn run(subject: Option<String>) -> CliResult {
    let library = Config::load()?.library();
    let books: Vec<_> = match subject.as_deref() {
        Some(subject) => library.for_subject(subject).collect(),
        None => library.books().iter().collect(),
    };
    print_json(&books)
}
