//! Thin trait boundary over the LLM adjudication endpoint, mirroring the
//! teacher's provider-abstraction-over-a-trait shape without carrying over
//! any of its provider-specific scenarios.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{json, Value as Json};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum LlmClientError {
    #[error("llm request {request_id} failed: {source}")]
    Request { request_id: Uuid, #[source] source: reqwest::Error },
    #[error("llm request {request_id} returned invalid JSON twice")]
    InvalidJson { request_id: Uuid },
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn request_json(&self, system_prompt: &str, user_prompt: &str) -> Result<LlmResponse, LlmClientError>;
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub body: Json,
    pub latency_ms: u64,
    pub request_id: Uuid,
    pub invalid_json_retry: bool,
}

pub struct HttpLlmClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl HttpLlmClient {
    pub fn new(api_url: String, api_key: String, model: String, timeout_s: f64) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs_f64(timeout_s))
            .build()
            .expect("reqwest client builds with a finite timeout");
        Self { http, api_url, api_key, model }
    }

    fn payload(&self, system_prompt: &str, user_prompt: &str) -> Json {
        json!({
            "model": self.model,
            "temperature": 0,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
        })
    }

    async fn send(&self, system_prompt: &str, user_prompt: &str, request_id: Uuid) -> Result<(Json, u64), LlmClientError> {
        let started = Instant::now();
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&self.payload(system_prompt, user_prompt))
            .send()
            .await
            .map_err(|source| LlmClientError::Request { request_id, source })?;
        let body: Json = response
            .json()
            .await
            .map_err(|source| LlmClientError::Request { request_id, source })?;
        Ok((body, started.elapsed().as_millis() as u64))
    }
}

/// Extracts the adjudicator's JSON payload from a chat-completion-shaped
/// response, trying in order: a top-level `content` field, a chat message
/// body, then a completion's plain `text`.
fn extract_content(body: &Json) -> Option<&str> {
    body.get("content")
        .and_then(Json::as_str)
        .or_else(|| body.pointer("/choices/0/message/content").and_then(Json::as_str))
        .or_else(|| body.pointer("/choices/0/text").and_then(Json::as_str))
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn request_json(&self, system_prompt: &str, user_prompt: &str) -> Result<LlmResponse, LlmClientError> {
        let request_id = Uuid::new_v4();
        let (body, latency_ms) = self.send(system_prompt, user_prompt, request_id).await?;
        let content = extract_content(&body);
        if let Some(parsed) = content.and_then(|c| serde_json::from_str::<Json>(c).ok()) {
            return Ok(LlmResponse { body: parsed, latency_ms, request_id, invalid_json_retry: false });
        }

        let retry_prompt = format!("Return valid JSON only.\n\n{user_prompt}");
        let (retry_body, retry_latency_ms) = self.send(system_prompt, &retry_prompt, request_id).await?;
        let retry_content = extract_content(&retry_body);
        match retry_content.and_then(|c| serde_json::from_str::<Json>(c).ok()) {
            Some(parsed) => Ok(LlmResponse {
                body: parsed,
                latency_ms: latency_ms + retry_latency_ms,
                request_id,
                invalid_json_retry: true,
            }),
            None => Err(LlmClientError::InvalidJson { request_id }),
        }
    }
}

/// Scripted double for tests: returns queued responses in order, or an
/// invalid-JSON error once the queue is exhausted.
pub struct MockLlmClient {
    responses: std::sync::Mutex<Vec<Result<Json, ()>>>,
}

impl MockLlmClient {
    pub fn new(responses: Vec<Result<Json, ()>>) -> Self {
        Self { responses: std::sync::Mutex::new(responses) }
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn request_json(&self, _system_prompt: &str, _user_prompt: &str) -> Result<LlmResponse, LlmClientError> {
        let request_id = Uuid::new_v4();
        let mut responses = self.responses.lock().expect("mock llm client mutex poisoned");
        if responses.is_empty() {
            return Err(LlmClientError::InvalidJson { request_id });
        }
        match responses.remove(0) {
            Ok(body) => Ok(LlmResponse { body, latency_ms: 1, request_id, invalid_json_retry: false }),
            Err(()) => Err(LlmClientError::InvalidJson { request_id }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_top_level_content() {
        let body = json!({ "content": "{\"ok\":true}" });
        assert_eq!(extract_content(&body), Some("{\"ok\":true}"));
    }

    #[test]
    fn extracts_chat_message_content() {
        let body = json!({ "choices": [{ "message": { "content": "{\"ok\":true}" } }] });
        assert_eq!(extract_content(&body), Some("{\"ok\":true}"));
    }

    #[test]
    fn extracts_completion_text() {
        let body = json!({ "choices": [{ "text": "{\"ok\":true}" }] });
        assert_eq!(extract_content(&body), Some("{\"ok\":true}"));
    }
}
