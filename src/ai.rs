//! Client for the Mistral chat-completions API, used for code review,
//! interview-answer evaluation and hints. Every public method degrades to a
//! user-safe fallback string on failure: the submission flow classifies
//! those as non-success rather than blowing up mid-conversation.

use anyhow::{Context, Result};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::env;
use std::time::Duration;

use crate::config::{
    AI_REQUEST_TIMEOUT_SECS, MISTRAL_API_URL, MISTRAL_MAX_TOKENS, MISTRAL_MODEL,
    MISTRAL_TEMPERATURE,
};

pub mod prompts;

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct RequestBody {
    model: &'static str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

pub struct MistralClient {
    http: Client,
    api_key: String,
}

impl MistralClient {
    pub fn new() -> Result<Self> {
        let api_key = env::var("MISTRAL_API_KEY")
            .context("Expected 'MISTRAL_API_KEY=<key>' in .env in project root.")?;

        let http = Client::builder()
            .timeout(Duration::from_secs(AI_REQUEST_TIMEOUT_SECS))
            .build()
            .context("Could not build HTTP client.")?;

        Ok(Self { http, api_key })
    }

    /// One chat-completion round trip, bounded by the client timeout.
    async fn chat(&self, prompt: String, max_tokens: u32, temperature: f32) -> Result<String> {
        let body = RequestBody {
            model: MISTRAL_MODEL,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            max_tokens,
            temperature,
        };
        let headers = HeaderMap::from_iter([
            (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (
                header::AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
            ),
        ]);

        let response = self
            .http
            .post(MISTRAL_API_URL)
            .headers(headers)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        extract_message_content(&response)
    }

    /// Reviews submitted code against the challenge description.
    ///
    /// Never fails: a reviewer outage turns into an error string the
    /// classifier reads as "not completed".
    pub async fn review_code(&self, code: &str, language: &str, challenge: &str) -> String {
        self.chat(
            prompts::code_review(language, challenge, code),
            MISTRAL_MAX_TOKENS,
            MISTRAL_TEMPERATURE,
        )
        .await
        .unwrap_or_else(|err| {
            log::error!("[review_code] Reviewer call failed: {err}");
            format!("❌ Error during code review: {err}")
        })
    }

    /// Evaluates an interview answer. Same degradation contract as
    /// [`Self::review_code`].
    pub async fn evaluate_answer(&self, question: &str, answer: &str) -> String {
        self.chat(
            prompts::interview_evaluation(question, answer),
            MISTRAL_MAX_TOKENS,
            MISTRAL_TEMPERATURE,
        )
        .await
        .unwrap_or_else(|err| {
            log::error!("[evaluate_answer] Reviewer call failed: {err}");
            format!("❌ Error during evaluation: {err}")
        })
    }

    /// A hint that stops short of the full solution.
    pub async fn generate_hint(&self, challenge: &str, language: &str) -> String {
        self.chat(prompts::hint(challenge, language), 300, 0.8)
            .await
            .unwrap_or_else(|err| {
                log::error!("[generate_hint] Reviewer call failed: {err}");
                format!("❌ Error generating hint: {err}")
            })
    }
}

fn extract_message_content(response: &Value) -> Result<String> {
    response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::to_owned)
        .context("Malformed completion response; check JSON schema.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_the_first_choice() {
        let response = serde_json::json!({
            "choices": [
                { "message": { "role": "assistant", "content": "Looks correct!" } }
            ]
        });
        assert_eq!(extract_message_content(&response).unwrap(), "Looks correct!");
    }

    #[test]
    fn malformed_response_is_an_error() {
        let response = serde_json::json!({ "choices": [] });
        assert!(extract_message_content(&response).is_err());
    }
}
