//! Chat completion client
//!
//! Sends one question per call to an OpenAI-compatible `chat/completions`
//! endpoint. A failed call is reported once; there is no retry.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::{Config, Error, Result};

/// System instruction sent ahead of every question
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Please respond to user queries.";

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Build the two-turn prompt for a question
#[must_use]
pub fn build_messages(system_prompt: &str, question: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user(format!("Question: {question}")),
    ]
}

/// Produces an answer for a question
#[async_trait]
pub trait Completion: Send + Sync {
    /// Answer a single question
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyQuery` for blank input and `Error::RemoteCall`
    /// when the endpoint cannot produce an answer
    async fn complete(&self, question: &str) -> Result<String>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completion API
pub struct CompletionClient {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
    system_prompt: String,
}

impl CompletionClient {
    /// Create a new completion client
    #[must_use]
    pub fn new(
        api_key: SecretString,
        base_url: impl Into<String>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
            model: model.into(),
            system_prompt: system_prompt.into(),
        }
    }

    /// Create a client from loaded configuration
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.api_key.clone(),
            config.api_base_url.clone(),
            config.llm_model.clone(),
            config.system_prompt.clone(),
        )
    }

    /// Model identifier used for requests
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Completion for CompletionClient {
    async fn complete(&self, question: &str) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::EmptyQuery);
        }

        let messages = build_messages(&self.system_prompt, question);
        let request = ChatRequest {
            model: &self.model,
            messages: &messages,
        };

        tracing::debug!(model = %self.model, question_len = question.len(), "requesting completion");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "completion request failed");
                Error::RemoteCall(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "completion API error");
            return Err(Error::RemoteCall(format!("{status}: {body}")));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::RemoteCall(format!("invalid response body: {e}")))?;

        let answer = extract_answer(body)?;
        tracing::info!(answer_len = answer.len(), "completion received");
        Ok(answer)
    }
}

/// Take the first choice's text out of a response
fn extract_answer(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or_else(|| Error::RemoteCall("response contained no choices".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_has_system_then_user_turn() {
        let messages = build_messages(DEFAULT_SYSTEM_PROMPT, "What is Rust?");

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, "Question: What is Rust?");
    }

    #[test]
    fn request_serializes_in_order() {
        let messages = build_messages("sys", "q");
        let request = ChatRequest {
            model: "llama-3.1-8b-instant",
            messages: &messages,
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "llama-3.1-8b-instant");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Question: q");
    }

    #[test]
    fn extracts_first_choice() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Hello"}},{"index":1,"message":{"role":"assistant","content":"Other"}}]}"#,
        )
        .unwrap();

        assert_eq!(extract_answer(response).unwrap(), "Hello");
    }

    #[test]
    fn null_content_is_empty_answer() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert_eq!(extract_answer(response).unwrap(), "");
    }

    #[test]
    fn no_choices_is_remote_error() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(extract_answer(response), Err(Error::RemoteCall(_))));
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let client = CompletionClient::new(
            SecretString::from("k".to_string()),
            "https://api.groq.com/openai/v1/",
            "m",
            "s",
        );
        assert_eq!(
            client.endpoint(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }

    #[tokio::test]
    async fn blank_question_is_rejected_before_sending() {
        let client = CompletionClient::new(
            SecretString::from("k".to_string()),
            "http://127.0.0.1:9",
            "m",
            "s",
        );
        assert!(matches!(client.complete("   ").await, Err(Error::EmptyQuery)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_remote_error() {
        let client = CompletionClient::new(
            SecretString::from("k".to_string()),
            "http://127.0.0.1:9",
            "m",
            "s",
        );
        assert!(matches!(
            client.complete("hello").await,
            Err(Error::RemoteCall(_))
        ));
    }
}
