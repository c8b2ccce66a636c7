//! Generation-service tests against a mocked chat-completions endpoint.

use std::time::Duration;

use mockito::Matcher;
use neet_mock_core::paper::SubjectPlan;
use neet_mock_core::{provision_paper, LlmSettings, LlmSource, QuestionSource, SectionStatus, SourceError};
use serde_json::json;

fn settings(endpoint: String) -> LlmSettings {
    LlmSettings {
        endpoint,
        api_key: Some("test-key".into()),
        timeout: Duration::from_secs(5),
        ..LlmSettings::default()
    }
}

fn completion(content: &str) -> String {
    json!({
        "id": "chatcmpl-1",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
    })
    .to_string()
}

fn two_questions() -> String {
    json!({
        "questions": [
            {
                "question": "SI unit of force?",
                "options": { "A": "Joule", "B": "Newton", "C": "Watt", "D": "Pascal" },
                "answer": "B",
                "explanation": "NCERT XI ch. 5"
            },
            {
                "question": "Speed of light is closest to",
                "options": ["3e8 m/s", "3e6 m/s", "3e5 m/s", "3e10 m/s"],
                "answer": 0
            }
        ]
    })
    .to_string()
}

#[tokio::test]
async fn parses_generated_questions() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(json!({ "model": "gpt-4o-mini" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion(&two_questions()))
        .create_async()
        .await;

    let source = LlmSource::new(settings(format!("{}/v1/chat/completions", server.url())));
    let questions = source.fetch_questions("Physics", 2).await.unwrap();

    mock.assert_async().await;
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0].correct_label, "B");
    assert_eq!(questions[0].explanation.as_deref(), Some("NCERT XI ch. 5"));
    assert_eq!(questions[1].correct_label, "A");
}

#[tokio::test]
async fn server_error_is_reported_with_status() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(503)
        .with_body("overloaded")
        .create_async()
        .await;

    let source = LlmSource::new(settings(format!("{}/v1/chat/completions", server.url())));
    match source.fetch_questions("Chemistry", 5).await {
        Err(SourceError::Api { status, body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "overloaded");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn reply_without_questions_is_malformed() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion("Sorry, I cannot help with that."))
        .create_async()
        .await;

    let source = LlmSource::new(settings(format!("{}/v1/chat/completions", server.url())));
    let err = source.fetch_questions("Biology", 5).await.unwrap_err();
    assert!(matches!(err, SourceError::Malformed(_)), "{err}");
}

#[tokio::test]
async fn failing_subject_does_not_sink_the_paper() {
    let mut server = mockito::Server::new_async().await;
    let _ok = server
        .mock("POST", "/v1/chat/completions")
        .match_body(Matcher::Regex("Physics".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion(&two_questions()))
        .create_async()
        .await;
    let _down = server
        .mock("POST", "/v1/chat/completions")
        .match_body(Matcher::Regex("Chemistry".into()))
        .with_status(500)
        .create_async()
        .await;

    let source = LlmSource::new(settings(format!("{}/v1/chat/completions", server.url())));
    let paper = provision_paper(
        &source,
        &[SubjectPlan::new("Physics", 2), SubjectPlan::new("Chemistry", 2)],
    )
    .await;

    assert_eq!(paper.questions("Physics").map(<[_]>::len), Some(2));
    let chemistry = paper.section("Chemistry").unwrap();
    assert!(chemistry.questions.is_empty());
    assert!(matches!(chemistry.status, SectionStatus::Failed { .. }));
}

#[tokio::test]
async fn reply_cut_off_at_token_limit_keeps_complete_questions() {
    let full = two_questions();
    // Stop inside a third record, the way a length-limited reply ends.
    let cut = format!(
        "{}, {{\"question\": \"Unit of power?\", \"options\": {{\"A\": \"Wa",
        full.trim_end_matches("]}")
    );
    let body = json!({
        "id": "chatcmpl-2",
        "choices": [{
            "index": 0,
            "finish_reason": "length",
            "message": { "role": "assistant", "content": cut }
        }]
    })
    .to_string();

    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .match_body(Matcher::PartialJson(json!({ "max_tokens": 16384 })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await;

    let source = LlmSource::new(settings(format!("{}/v1/chat/completions", server.url())));
    let questions = source.fetch_questions("Physics", 3).await.unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[1].text, "Speed of light is closest to");
}
