//! HTTP client for the Ollama chat API.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use triage_core::{
  conversation::ConversationTurn,
  responder::{Responder, ResponderError},
  taxonomy::Taxonomy,
};

use crate::{
  Error, Result,
  prompt::{ChatMessage, chat_messages, system_prompt},
};

/// Connection and prompting settings.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
  pub base_url:       String,
  pub model:          String,
  /// Per-request HTTP timeout.
  pub timeout:        Duration,
  /// Number of most recent turns sent with each request.
  pub history_window: usize,
}

impl Default for OllamaConfig {
  fn default() -> Self {
    Self {
      base_url:       "http://localhost:11434".to_string(),
      model:          "gemma3n".to_string(),
      timeout:        Duration::from_secs(30),
      history_window: 6,
    }
  }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
  model:    &'a str,
  messages: Vec<ChatMessage>,
  stream:   bool,
  options:  ChatOptions,
}

#[derive(Serialize)]
struct ChatOptions {
  temperature: f32,
  top_p:       f32,
}

#[derive(Deserialize)]
struct ChatResponse {
  message: ChatMessage,
}

#[derive(Deserialize)]
struct TagsResponse {
  models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
  name: String,
}

// ─── Responder ───────────────────────────────────────────────────────────────

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct OllamaResponder {
  client: Client,
  config: OllamaConfig,
  system: String,
}

impl OllamaResponder {
  /// Build a responder whose system prompt reflects `taxonomy`.
  pub fn new(config: OllamaConfig, taxonomy: &Taxonomy) -> Result<Self> {
    let client = Client::builder().timeout(config.timeout).build()?;
    Ok(Self {
      client,
      config: OllamaConfig {
        base_url: config.base_url.trim_end_matches('/').to_string(),
        ..config
      },
      system: system_prompt(taxonomy),
    })
  }

  pub fn config(&self) -> &OllamaConfig { &self.config }

  fn url(&self, path: &str) -> String { format!("{}{path}", self.config.base_url) }

  fn map_send_error(&self, e: reqwest::Error) -> Error {
    if e.is_timeout() {
      Error::Timeout(self.config.timeout)
    } else if e.is_connect() {
      Error::Connection(self.config.base_url.clone())
    } else {
      Error::Http(e)
    }
  }

  async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
      return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::Status { status: status.as_u16(), body })
  }

  /// `GET /api/tags`: whether the configured model is installed.
  pub async fn is_available(&self) -> Result<bool> {
    let response = self
      .client
      .get(self.url("/api/tags"))
      .send()
      .await
      .map_err(|e| self.map_send_error(e))?;
    let tags: TagsResponse = Self::check_status(response).await?.json().await?;
    Ok(tags.models.iter().any(|m| m.name.starts_with(&self.config.model)))
  }

  /// `POST /api/chat`: one non-streaming completion.
  pub async fn chat(
    &self,
    utterance: &str,
    history: &[ConversationTurn],
  ) -> Result<String> {
    let body = ChatRequest {
      model:    &self.config.model,
      messages: chat_messages(
        &self.system,
        utterance,
        history,
        self.config.history_window,
      ),
      stream:   false,
      options:  ChatOptions { temperature: 0.3, top_p: 0.9 },
    };

    let started = std::time::Instant::now();
    let response = self
      .client
      .post(self.url("/api/chat"))
      .json(&body)
      .send()
      .await
      .map_err(|e| self.map_send_error(e))?;
    let parsed: ChatResponse = Self::check_status(response)
      .await?
      .json()
      .await
      .map_err(|e| self.map_send_error(e))?;

    tracing::debug!(
      model = %self.config.model,
      elapsed_ms = started.elapsed().as_millis() as u64,
      "ollama reply received"
    );
    Ok(parsed.message.content)
  }
}

impl Responder for OllamaResponder {
  async fn generate(
    &self,
    utterance: &str,
    history: &[ConversationTurn],
  ) -> Result<String, ResponderError> {
    self.chat(utterance, history).await.map_err(|e| {
      tracing::warn!(error = %e, "ollama request failed");
      ResponderError::from(e)
    })
  }
}
