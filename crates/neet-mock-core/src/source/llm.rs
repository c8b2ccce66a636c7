use std::time::Duration;

use async_trait::async_trait;
use indoc::{formatdoc, indoc};
use reqwest::Client;
use serde_json::{json, Value};

use super::parse;
use super::QuestionSource;
use crate::error::SourceError;
use crate::paper::Question;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Output limit of the default model; a full 90-question section needs most of it.
pub const DEFAULT_MAX_TOKENS: u32 = 16_384;

const SYSTEM_PROMPT: &str = indoc! {"
    You write NEET practice questions strictly from the NCERT syllabus.
    Reply with a JSON object of the form
    {\"questions\": [{\"question\": \"...\", \"options\": {\"A\": \"...\", \"B\": \"...\", \"C\": \"...\", \"D\": \"...\"},
    \"answer\": \"A\", \"explanation\": \"...\"}]}
    Every question has exactly four options and one correct answer.
    Vary the position of the correct answer.
"};

/// Connection settings for an OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub endpoint: String,
    pub model: String,
    /// Key read from `api_key_env`; `None` when the variable is unset.
    pub api_key: Option<String>,
    pub api_key_env: String,
    /// Token budget for one reply.
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            model: DEFAULT_MODEL.into(),
            api_key: None,
            api_key_env: "OPENAI_API_KEY".into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Generates questions on demand through a hosted language model.
#[derive(Debug, Clone)]
pub struct LlmSource {
    client: Client,
    settings: LlmSettings,
}

impl LlmSource {
    pub fn new(settings: LlmSettings) -> Self {
        Self::with_client(settings, Client::new())
    }

    pub fn with_client(settings: LlmSettings, client: Client) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &LlmSettings {
        &self.settings
    }

    fn request_body(&self, subject: &str, count: usize) -> Value {
        let prompt = formatdoc! {"
            Generate {count} NEET MCQs from NCERT {subject}
            with answers and NCERT explanations.
        ", count = count, subject = subject};
        json!({
            "model": self.settings.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt}
            ],
            "max_tokens": self.settings.max_tokens,
            "response_format": { "type": "json_object" }
        })
    }

    async fn complete(&self, api_key: &str, body: &Value) -> Result<String, SourceError> {
        let res = self
            .client
            .post(&self.settings.endpoint)
            .bearer_auth(api_key)
            .json(body)
            .timeout(self.settings.timeout)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(SourceError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let reply: Value = res.json().await?;
        if reply.pointer("/choices/0/finish_reason").and_then(Value::as_str) == Some("length") {
            tracing::warn!(
                model = %self.settings.model,
                max_tokens = self.settings.max_tokens,
                "reply cut off at the token limit, keeping the complete questions"
            );
        }
        reply
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| SourceError::Malformed("reply has no choices[0].message.content".into()))
    }
}

#[async_trait]
impl QuestionSource for LlmSource {
    fn name(&self) -> &str {
        "llm"
    }

    async fn fetch_questions(&self, subject: &str, count: usize) -> Result<Vec<Question>, SourceError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| SourceError::MissingApiKey(self.settings.api_key_env.clone()))?;

        tracing::info!(model = %self.settings.model, %subject, count, "requesting generated questions");
        let content = self.complete(api_key, &self.request_body(subject, count)).await?;
        let questions = parse::parse_reply(&content)?;
        tracing::debug!(%subject, parsed = questions.len(), "generated questions parsed");
        Ok(questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_carries_subject_count_and_budget() {
        let source = LlmSource::new(LlmSettings {
            max_tokens: 1500,
            ..LlmSettings::default()
        });
        let body = source.request_body("Chemistry", 45);

        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["max_tokens"], 1500);
        let prompt = body["messages"][1]["content"].as_str().unwrap();
        assert!(prompt.contains("45 NEET MCQs"));
        assert!(prompt.contains("NCERT Chemistry"));
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let source = LlmSource::new(LlmSettings {
            endpoint: "http://127.0.0.1:9/unreachable".into(),
            ..LlmSettings::default()
        });
        let err = source.fetch_questions("Physics", 5).await.unwrap_err();
        match err {
            SourceError::MissingApiKey(var) => assert_eq!(var, "OPENAI_API_KEY"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
