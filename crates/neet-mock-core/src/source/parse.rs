//! Turning loosely structured question data into [`Question`] records.
//!
//! Generation services and hand-written banks disagree on field names and
//! option layouts, so parsing is lenient: anything that yields a valid
//! question is kept, anything else is dropped.

use serde_json::{Deserializer, Value};

use crate::error::SourceError;
use crate::paper::{normalize_label, Question, MAX_OPTIONS};

const LABELS: [&str; MAX_OPTIONS] = ["A", "B", "C", "D"];

/// Parse a generated reply: JSON first, then the complete records of a
/// cut-off JSON array, then the plain-text block format.
///
/// # Errors
///
/// Returns [`SourceError::Malformed`] if no valid question can be extracted.
pub fn parse_reply(content: &str) -> Result<Vec<Question>, SourceError> {
    let body = strip_code_fence(content);

    let questions = match serde_json::from_str::<Value>(body) {
        Ok(value) => questions_from_json(&value),
        Err(_) => match complete_records(body) {
            Some(items) if !items.is_empty() => {
                let questions = questions_from_json(&Value::Array(items));
                tracing::warn!(recovered = questions.len(), "reply JSON incomplete, dropped the unfinished tail");
                questions
            }
            _ => questions_from_text(body),
        },
    };

    if questions.is_empty() {
        let preview: String = body.chars().take(80).collect();
        return Err(SourceError::Malformed(format!("no questions found in reply: {preview:?}")));
    }
    Ok(questions)
}

/// Accepts `{"questions": [...]}` or a bare array of records.
pub fn questions_from_json(value: &Value) -> Vec<Question> {
    let items = value
        .get("questions")
        .and_then(Value::as_array)
        .or_else(|| value.as_array());

    let Some(items) = items else {
        return Vec::new();
    };

    let mut questions = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        match coerce_question(item) {
            Some(q) => questions.push(q),
            None => tracing::debug!(index = idx, "skipping unusable question record"),
        }
    }
    questions
}

/// Every complete element of the question array in a reply that stops
/// part-way through it. `None` when there is no array to recover from.
fn complete_records(body: &str) -> Option<Vec<Value>> {
    let start = match body.find("\"questions\"") {
        Some(key) => key + body[key..].find('[')?,
        None if body.starts_with('[') => 0,
        None => return None,
    };

    let mut items = Vec::new();
    let mut rest = &body[start + 1..];
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() || rest.starts_with(']') {
            break;
        }
        let mut stream = Deserializer::from_str(rest).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) => {
                items.push(value);
                rest = &rest[stream.byte_offset()..];
            }
            _ => break,
        }
    }
    Some(items)
}

fn first_str<'a>(v: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|k| v.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// One JSON record to a question. Options may be an object keyed by label
/// or an array (labelled A, B, C, D in order); the answer may be a label,
/// a 0-based index or the text of the correct option.
fn coerce_question(v: &Value) -> Option<Question> {
    let text = first_str(v, &["question", "text", "stem"])?;

    let options: Vec<(String, String)> = match v.get("options")? {
        Value::Object(map) => map
            .iter()
            .filter_map(|(label, opt)| opt.as_str().map(|o| (normalize_label(label), o.trim().to_string())))
            .collect(),
        Value::Array(list) => list
            .iter()
            .zip(LABELS)
            .filter_map(|(opt, label)| opt.as_str().map(|o| (label.to_string(), strip_option_prefix(o, label))))
            .collect(),
        _ => return None,
    };

    let answer_value = ["answer", "correct_label", "correct_answer", "correct"]
        .iter()
        .find_map(|k| v.get(*k))?;

    let correct = match answer_value {
        Value::Number(n) => {
            let idx = usize::try_from(n.as_u64()?).ok()?;
            options.get(idx)?.0.clone()
        }
        Value::String(s) => {
            let label = normalize_label(s);
            if options.iter().any(|(l, _)| *l == label) {
                label
            } else {
                options
                    .iter()
                    .find(|(_, o)| o.eq_ignore_ascii_case(s.trim()))
                    .map(|(l, _)| l.clone())?
            }
        }
        _ => return None,
    };

    let explanation = first_str(v, &["explanation", "reason", "analysis"]).map(str::to_string);
    Question::new(text, options, &correct, explanation).ok()
}

/// "A) Newton" -> "Newton" when the prefix matches the expected label.
fn strip_option_prefix(option: &str, label: &str) -> String {
    let trimmed = option.trim();
    match split_option_line(trimmed) {
        Some((l, rest)) if l == label => rest.to_string(),
        _ => trimmed.to_string(),
    }
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[derive(Default)]
struct Draft {
    text: String,
    options: Vec<(String, String)>,
    answer: Option<String>,
    explanation: Option<String>,
}

impl Draft {
    fn finish(self) -> Option<Question> {
        let answer = self.answer?;
        Question::new(self.text.trim(), self.options, &answer, self.explanation).ok()
    }
}

/// Parse numbered plain-text blocks:
///
/// ```text
/// 1. Which quantity is a vector?
/// A) Speed
/// B) Velocity
/// Answer: B
/// Explanation: Velocity has direction.
/// ```
pub fn questions_from_text(content: &str) -> Vec<Question> {
    let mut questions = Vec::new();
    let mut current: Option<Draft> = None;

    for raw in content.lines() {
        let line = raw.trim().replace("**", "");
        let line = line.trim().trim_start_matches('#').trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = strip_question_number(line) {
            if let Some(q) = current.take().and_then(Draft::finish) {
                questions.push(q);
            }
            current = Some(Draft {
                text: rest.to_string(),
                ..Draft::default()
            });
            continue;
        }

        let Some(draft) = current.as_mut() else {
            continue;
        };

        if let Some(rest) = strip_keyword(line, &["correct answer", "answer", "ans"]) {
            draft.answer = rest.split_whitespace().next().map(normalize_label);
        } else if let Some(rest) = strip_keyword(line, &["explanation", "ncert explanation", "solution"]) {
            draft.explanation = Some(rest.to_string());
        } else if let Some((label, rest)) = split_option_line(line) {
            if draft.answer.is_none() {
                draft.options.push((label, rest.to_string()));
            }
        } else if let Some(explanation) = draft.explanation.as_mut() {
            explanation.push(' ');
            explanation.push_str(line);
        } else if draft.options.is_empty() {
            draft.text.push(' ');
            draft.text.push_str(line);
        }
    }

    if let Some(q) = current.and_then(Draft::finish) {
        questions.push(q);
    }
    questions
}

/// "12. text", "Q3) text", "Question 4: text" -> "text".
fn strip_question_number(line: &str) -> Option<&str> {
    let lower = line.to_ascii_lowercase();
    let skip = if lower.starts_with("question") {
        "question".len()
    } else if lower.starts_with('q') {
        1
    } else {
        0
    };
    let rest = line[skip..].trim_start();
    let digits = rest.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = &rest[digits..];
    let rest = rest.strip_prefix(['.', ')', ':'])?;
    let rest = rest.trim();
    (!rest.is_empty()).then_some(rest)
}

/// "A) text", "(b) text", "C. text", "D: text" -> ("A", "text").
fn split_option_line(line: &str) -> Option<(String, &str)> {
    let body = line.strip_prefix('(').unwrap_or(line);
    let mut chars = body.chars();
    let letter = chars.next()?;
    if !matches!(letter.to_ascii_uppercase(), 'A'..='D') {
        return None;
    }
    let rest = chars.as_str().strip_prefix([')', '.', ':'])?;
    let rest = rest.trim();
    if rest.is_empty() {
        return None;
    }
    Some((letter.to_ascii_uppercase().to_string(), rest))
}

/// Case-insensitive "Keyword:" prefix match; returns the remainder.
fn strip_keyword<'a>(line: &'a str, keywords: &[&str]) -> Option<&'a str> {
    let lower = line.to_ascii_lowercase();
    for keyword in keywords {
        if lower.starts_with(keyword) {
            let rest = line[keyword.len()..].trim_start();
            if let Some(rest) = rest.strip_prefix([':', '-']) {
                return Some(rest.trim());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_object_reply() {
        let reply = r#"{"questions": [
            {"question": "SI unit of charge?", "options": {"A": "Ampere", "B": "Coulomb", "C": "Volt", "D": "Ohm"},
             "answer": "B", "explanation": "NCERT Class 12, Ch 1."}
        ]}"#;
        let qs = parse_reply(reply).unwrap();
        assert_eq!(qs.len(), 1);
        assert_eq!(qs[0].correct_label, "B");
        assert_eq!(qs[0].explanation.as_deref(), Some("NCERT Class 12, Ch 1."));
    }

    #[test]
    fn parses_fenced_array_with_index_answer() {
        let reply = "```json\n[{\"text\": \"Powerhouse of the cell?\", \"options\": [\"A) Nucleus\", \"B) Mitochondria\"], \"correct_answer\": 1}]\n```";
        let qs = parse_reply(reply).unwrap();
        assert_eq!(qs[0].correct_label, "B");
        assert_eq!(qs[0].options["B"], "Mitochondria");
    }

    #[test]
    fn answer_may_be_option_text() {
        let value: Value = serde_json::json!([
            {"question": "Noble gas?", "options": ["Neon", "Sodium"], "answer": "neon"}
        ]);
        let qs = questions_from_json(&value);
        assert_eq!(qs[0].correct_label, "A");
    }

    #[test]
    fn invalid_records_are_skipped() {
        let value: Value = serde_json::json!({"questions": [
            {"question": "No options", "answer": "A"},
            {"question": "Bad answer", "options": {"A": "x", "B": "y"}, "answer": "Q"},
            {"question": "Good", "options": {"A": "x", "B": "y"}, "answer": "A"}
        ]});
        let qs = questions_from_json(&value);
        assert_eq!(qs.len(), 1);
        assert_eq!(qs[0].text, "Good");
    }

    #[test]
    fn parses_markdown_text_blocks() {
        let reply = "\
**1. Which of the following is a vector quantity?**
A) Speed
B) Velocity
C) Distance
D) Mass
**Answer:** B
Explanation: Velocity has both magnitude
and direction.

Q2) Which gas is used in photosynthesis?
(a) Oxygen
(b) Carbon dioxide
(c) Nitrogen
(d) Hydrogen
Correct answer: (b)
";
        let qs = parse_reply(reply).unwrap();
        assert_eq!(qs.len(), 2);
        assert_eq!(qs[0].text, "Which of the following is a vector quantity?");
        assert_eq!(qs[0].correct_label, "B");
        assert_eq!(
            qs[0].explanation.as_deref(),
            Some("Velocity has both magnitude and direction.")
        );
        assert_eq!(qs[1].options["B"], "Carbon dioxide");
        assert_eq!(qs[1].correct_label, "B");
    }

    #[test]
    fn block_without_answer_is_dropped() {
        let reply = "1. Orphan question\nA) x\nB) y\n\n2. Kept\nA) x\nB) y\nAnswer: A";
        let qs = questions_from_text(reply);
        assert_eq!(qs.len(), 1);
        assert_eq!(qs[0].text, "Kept");
    }

    #[test]
    fn cut_off_reply_keeps_complete_questions() {
        let records: Vec<String> = (0..30)
            .map(|i| {
                format!(
                    r#"{{"question": "Q{i}", "options": {{"A": "w", "B": "x", "C": "y", "D": "z"}}, "answer": "C", "explanation": "e{i}"}}"#
                )
            })
            .collect();
        let reply = format!(
            r#"{{"questions": [{}, {{"question": "Q30", "options": {{"A": "w", "B": "#,
            records.join(", ")
        );

        let qs = parse_reply(&reply).unwrap();
        assert_eq!(qs.len(), 30);
        assert_eq!(qs[29].text, "Q29");
        assert_eq!(qs[29].explanation.as_deref(), Some("e29"));
    }

    #[test]
    fn cut_off_bare_array_inside_fence() {
        let reply = "```json\n[{\"question\": \"Kept\", \"options\": [\"x\", \"y\"], \"answer\": 0}, {\"question\": \"Lo";
        let qs = parse_reply(reply).unwrap();
        assert_eq!(qs.len(), 1);
        assert_eq!(qs[0].text, "Kept");
    }

    #[test]
    fn cut_off_before_first_record_is_malformed() {
        let err = parse_reply(r#"{"questions": [{"question": "Half"#).unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
    }

    #[test]
    fn unparseable_reply_is_malformed() {
        let err = parse_reply("I cannot help with that.").unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
    }

    #[test]
    fn question_number_prefixes() {
        assert_eq!(strip_question_number("12. Text"), Some("Text"));
        assert_eq!(strip_question_number("Question 3: Text"), Some("Text"));
        assert_eq!(strip_question_number("Quantum numbers"), None);
        assert_eq!(strip_question_number("A) option"), None);
    }
}
