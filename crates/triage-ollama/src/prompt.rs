//! Prompt construction for the chat endpoint.

use serde::{Deserialize, Serialize};
use triage_core::{
  conversation::{ConversationTurn, Role},
  taxonomy::{Taxonomy, Tier},
};

/// One message in an Ollama `/api/chat` request or response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ChatMessage {
  pub role:    String,
  pub content: String,
}

impl ChatMessage {
  fn new(role: &str, content: impl Into<String>) -> Self {
    Self { role: role.to_string(), content: content.into() }
  }
}

/// The system prompt, listing the taxonomy's emergency phrases.
pub fn system_prompt(taxonomy: &Taxonomy) -> String {
  let critical: Vec<&str> = taxonomy
    .tier(Tier::Emergency)
    .iter()
    .map(|e| e.phrase.as_str())
    .collect();

  format!(
    "You are a medical information assistant. Strict rules:\n\
     1. If the patient mentions a critical symptom ({}), tell them to call \
     emergency services immediately and not to wait for further chat \
     instructions.\n\
     2. For anything else, suggest two or three possible causes and one or two \
     sensible actions.\n\
     3. Never give a diagnosis and never recommend a specific medication.\n\
     4. Always end with: \"Please consult a healthcare professional for proper \
     diagnosis.\"",
    critical.join(", ")
  )
}

/// Build the message list: the system prompt, then the last `window` turns.
///
/// The engine passes history ending with the current user turn; if it does
/// not, `utterance` is appended as a final user message.
pub(crate) fn chat_messages(
  system: &str,
  utterance: &str,
  history: &[ConversationTurn],
  window: usize,
) -> Vec<ChatMessage> {
  let recent = &history[history.len().saturating_sub(window)..];

  let mut messages = Vec::with_capacity(recent.len() + 2);
  messages.push(ChatMessage::new("system", system));
  messages.extend(
    recent
      .iter()
      .map(|turn| ChatMessage::new(&turn.role.to_string(), turn.content.as_str())),
  );

  let ends_with_utterance = recent
    .last()
    .is_some_and(|t| t.role == Role::User && t.content == utterance);
  if !ends_with_utterance {
    messages.push(ChatMessage::new("user", utterance));
  }
  messages
}
