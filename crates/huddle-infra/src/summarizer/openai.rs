//! OpenAI-compatible chat-completions summarizer.
//!
//! Works against any endpoint speaking the `/chat/completions` protocol.
//! The API key is a [`SecretString`] and only exposed when building the
//! `Authorization` header.

use std::time::Duration;

use huddle_core::summarize::{SYSTEM_PROMPT, Summarizer, build_summary_prompt};
use huddle_types::config::SummarizerConfig;
use huddle_types::error::SummarizeError;
use huddle_types::intent::Language;
use huddle_types::session::SessionAggregate;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// Summarizer backed by an OpenAI-compatible API.
pub struct OpenAiSummarizer {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiSummarizer {
    pub fn from_config(config: &SummarizerConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_key: config
                .api_key
                .as_ref()
                .map(|k| SecretString::from(k.expose_secret().to_string())),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_request<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        }
    }
}

impl Summarizer for OpenAiSummarizer {
    async fn summarize(
        &self,
        aggregate: &SessionAggregate,
        language: Language,
    ) -> Result<String, SummarizeError> {
        let api_key = self.api_key.as_ref().ok_or(SummarizeError::NotConfigured)?;
        let prompt = build_summary_prompt(aggregate, language);

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key.expose_secret())
            .json(&self.build_request(&prompt))
            .send()
            .await
            .map_err(|e| SummarizeError::Provider(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(SummarizeError::Provider(format!("HTTP {status}: {error_body}")));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| SummarizeError::Provider(format!("failed to parse response: {e}")))?;

        if let Some(usage) = &completion.usage {
            tracing::info!(
                model = %self.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "summary generated"
            );
        }

        extract_text(completion)
    }
}

fn extract_text(completion: ChatResponse) -> Result<String, SummarizeError> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(SummarizeError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use huddle_types::session::{Session, SessionStatus};
    use uuid::Uuid;

    fn aggregate() -> SessionAggregate {
        let now = Utc::now();
        SessionAggregate::new(
            Session {
                id: Uuid::now_v7(),
                session_code: "HUD-ABC234".to_string(),
                group_id: "group-1".to_string(),
                creator_id: None,
                language: Language::En,
                status: SessionStatus::Active,
                created_at: now,
                expires_at: now,
                closed_at: None,
                summary: None,
            },
            Vec::new(),
        )
    }

    #[test]
    fn test_request_shape() {
        let summarizer = OpenAiSummarizer::from_config(&SummarizerConfig::default()).unwrap();
        let body = serde_json::to_value(summarizer.build_request("Summarize this")).unwrap();

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], SYSTEM_PROMPT);
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Summarize this");
    }

    #[test]
    fn test_completions_url_trims_trailing_slash() {
        let config = SummarizerConfig {
            base_url: "http://localhost:11434/v1/".to_string(),
            ..SummarizerConfig::default()
        };
        let summarizer = OpenAiSummarizer::from_config(&config).unwrap();
        assert_eq!(
            summarizer.completions_url(),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[test]
    fn test_extract_text() {
        let completion: ChatResponse = serde_json::from_value(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "  Amina pledged 5000 TZS. " } }],
            "usage": { "prompt_tokens": 80, "completion_tokens": 12, "total_tokens": 92 }
        }))
        .unwrap();
        assert_eq!(extract_text(completion).unwrap(), "Amina pledged 5000 TZS.");

        let empty: ChatResponse = serde_json::from_value(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "   " } }]
        }))
        .unwrap();
        assert!(matches!(extract_text(empty), Err(SummarizeError::EmptyResponse)));

        let none: ChatResponse = serde_json::from_value(serde_json::json!({ "choices": [] })).unwrap();
        assert!(matches!(extract_text(none), Err(SummarizeError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let summarizer = OpenAiSummarizer::from_config(&SummarizerConfig::default()).unwrap();
        let result = summarizer.summarize(&aggregate(), Language::En).await;
        assert!(matches!(result, Err(SummarizeError::NotConfigured)));
    }
}
