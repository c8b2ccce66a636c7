use serde::{Deserialize, Serialize};

/// A study book listed on the Books view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub subject: String,
    pub title: String,
    /// URL or local path.
    pub location: String,
}

impl Book {
    pub fn new(subject: impl Into<String>, title: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            title: title.into(),
            location: location.into(),
        }
    }
}

/// Configured books, in configured order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Library {
    books: Vec<Book>,
}

impl Library {
    pub fn new(books: Vec<Book>) -> Self {
        Self { books }
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    /// Books for one subject; matching ignores case.
    pub fn for_subject<'a>(&'a self, subject: &'a str) -> impl Iterator<Item = &'a Book> + 'a {
        self.books
            .iter()
            .filter(move |b| b.subject.eq_ignore_ascii_case(subject))
    }

    /// Distinct subjects in first-seen order.
    pub fn subjects(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for book in &self.books {
            if !seen.contains(&book.subject.as_str()) {
                seen.push(&book.subject);
            }
        }
        seen
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> Library {
        Library::new(vec![
            Book::new("Physics", "Physics XI", "p11.pdf"),
            Book::new("Biology", "Biology XI", "b11.pdf"),
            Book::new("Physics", "Physics XII", "p12.pdf"),
        ])
    }

    #[test]
    fn filters_by_subject_case_insensitively() {
        let titles: Vec<_> = library().for_subject("physics").map(|b| b.title.clone()).collect();
        assert_eq!(titles, vec!["Physics XI", "Physics XII"]);
        assert_eq!(library().for_subject("Chemistry").count(), 0);
    }

    #[test]
    fn subjects_keep_first_seen_order() {
        assert_eq!(library().subjects(), vec!["Physics", "Biology"]);
    }
}
