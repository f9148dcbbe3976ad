//! Conversation state: the turn log and the patient record it produced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::PatientRecord;

// ─── Turns ───────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  User,
  Assistant,
}

/// One message in a conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
  /// Position in the log, starting at 0.
  pub index:   u64,
  pub role:    Role,
  pub content: String,
  pub at:      DateTime<Utc>,
}

/// Append-only log of turns.
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
  turns: Vec<ConversationTurn>,
}

impl ConversationLog {
  pub fn new() -> Self { Self::default() }

  pub fn turns(&self) -> &[ConversationTurn] { &self.turns }

  pub fn len(&self) -> usize { self.turns.len() }

  pub fn is_empty(&self) -> bool { self.turns.is_empty() }

  /// Build the turn that would be appended next, without appending it.
  pub(crate) fn next_turn(
    &self,
    role: Role,
    content: impl Into<String>,
  ) -> ConversationTurn {
    ConversationTurn {
      index: self.turns.len() as u64,
      role,
      content: content.into(),
      at: Utc::now(),
    }
  }

  /// Append a turn built by [`Self::next_turn`] on this log.
  pub(crate) fn append(&mut self, turn: ConversationTurn) {
    debug_assert_eq!(turn.index, self.turns.len() as u64);
    self.turns.push(turn);
  }

  pub(crate) fn push(&mut self, role: Role, content: impl Into<String>) {
    let turn = self.next_turn(role, content);
    self.append(turn);
  }
}

// ─── Conversation ────────────────────────────────────────────────────────────

/// Everything owned by one chat session. Each conversation has its own
/// record and log; nothing is shared between conversations.
#[derive(Debug, Clone)]
pub struct Conversation {
  pub(crate) id:     Uuid,
  pub(crate) record: PatientRecord,
  pub(crate) log:    ConversationLog,
}

impl Conversation {
  pub fn new() -> Self { Self::with_id(Uuid::new_v4()) }

  pub fn with_id(id: Uuid) -> Self {
    Self {
      id,
      record: PatientRecord::new(),
      log: ConversationLog::new(),
    }
  }

  pub fn id(&self) -> Uuid { self.id }

  pub fn record(&self) -> &PatientRecord { &self.record }

  pub fn log(&self) -> &ConversationLog { &self.log }

  /// Start over: an empty record and an empty log under the same id.
  pub fn reset(&mut self) {
    self.record.reset();
    self.log = ConversationLog::new();
    tracing::info!(conversation_id = %self.id, "conversation reset");
  }
}

impl Default for Conversation {
  fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn log_indices_are_sequential() {
    let mut log = ConversationLog::new();
    log.push(Role::User, "hello");
    log.push(Role::Assistant, "hi");
    log.push(Role::User, "cough");

    let indices: Vec<u64> = log.turns().iter().map(|t| t.index).collect();
    assert_eq!(indices, [0, 1, 2]);
    assert_eq!(log.turns()[1].role, Role::Assistant);
  }

  #[test]
  fn next_turn_does_not_append() {
    let log = ConversationLog::new();
    let turn = log.next_turn(Role::User, "hello");
    assert_eq!(turn.index, 0);
    assert!(log.is_empty());
  }

  #[test]
  fn reset_keeps_id_and_clears_state() {
    let mut conversation = Conversation::new();
    let id = conversation.id();
    conversation.log.push(Role::User, "cough");
    conversation.record.append_symptom("cough", "Respiratory");

    conversation.reset();
    assert_eq!(conversation.id(), id);
    assert!(conversation.log().is_empty());
    assert!(conversation.record().symptoms().is_empty());
  }

  #[test]
  fn role_displays_lowercase() {
    assert_eq!(Role::Assistant.to_string(), "assistant");
  }
}
