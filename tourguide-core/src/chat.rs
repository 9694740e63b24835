//! Thin client for the travel chat backend
//!
//! The backend decides what a question means; replies are passed through
//! as-is with their `type` tag and payload.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// One entry of the backend's conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Answer to a free-text question
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct AskRequest<'a> {
    prompt: &'a str,
}

pub struct ChatClient {
    backend_url: String,
    client: reqwest::blocking::Client,
}

impl ChatClient {
    pub fn new(backend_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(crate::user_agent())
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            backend_url: backend_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.backend_url, path.trim_start_matches('/'))
    }

    /// True when the backend reports `{"status": "ok"}`
    pub fn health(&self) -> Result<bool> {
        let response = self
            .client
            .get(self.endpoint("/health"))
            .send()
            .context("Cannot connect to chat backend")?;

        if !response.status().is_success() {
            return Ok(false);
        }

        let health: HealthResponse = response.json().context("Failed to parse health response")?;
        Ok(health.status.as_deref() == Some("ok"))
    }

    pub fn history(&self) -> Result<Vec<ChatMessage>> {
        let response = self
            .client
            .get(self.endpoint("/chat/history"))
            .send()
            .context("Failed to load chat history")?;

        if !response.status().is_success() {
            anyhow::bail!("Chat backend returned status {}", response.status());
        }

        let history: HistoryResponse = response.json().context("Failed to parse chat history")?;
        Ok(history.messages)
    }

    /// Forward a question; blank prompts are rejected without a request
    pub fn ask(&self, prompt: &str) -> Result<ChatReply> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            anyhow::bail!("Prompt is empty");
        }

        log::debug!("Asking chat backend: {}", prompt);

        let response = self
            .client
            .post(self.endpoint("/ask"))
            .json(&AskRequest { prompt })
            .send()
            .context("Failed to send message")?;

        if !response.status().is_success() {
            anyhow::bail!("Chat backend returned status {}", response.status());
        }

        response.json().context("Failed to parse chat reply")
    }
}
