//! Blocking client for the Ollama `/api/chat` endpoint.
//!
//! One synchronous request per call with an explicit timeout and no
//! implicit retry; retry policy, if any, belongs to the caller.

use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::config::ModelConfig;
use crate::error::{Result, SleuthError};

/// One turn of a conversation, in the role/content shape Ollama expects.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Ollama chat client.
pub struct OllamaClient {
    base_url: String,
    model: String,
    http: reqwest::blocking::Client,
}

impl OllamaClient {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SleuthError::ModelBackend(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            http,
        })
    }

    /// Send the conversation and return the assistant's reply text.
    ///
    /// The reply is opaque analysis output; this crate makes no
    /// guarantees about its correctness.
    pub fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
        });

        debug!(
            model = %self.model,
            turns = messages.len(),
            "Sending chat request to model backend"
        );

        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .map_err(|e| SleuthError::ModelBackend(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SleuthError::ModelBackend(format!(
                "backend returned HTTP {}",
                response.status()
            )));
        }

        let reply: serde_json::Value = response
            .json()
            .map_err(|e| SleuthError::ModelBackend(e.to_string()))?;

        Ok(reply["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string())
    }
}
