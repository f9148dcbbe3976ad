//! The triage engine: one call per user turn.
//!
//! For each utterance the engine classifies, decides a [`TurnAction`], picks
//! the reply, and updates the conversation. Work that can suspend (the
//! responder call) happens before anything is written, so a turn is either
//! fully applied or not applied at all.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
  classify::{Classification, FORM_NOTICE, FormTriggers, classify},
  conversation::{Conversation, ConversationTurn, Role},
  record::{RecordSnapshot, Urgency},
  responder::{NoResponder, Responder, ResponderError},
  safety::{self, DISCLAIMER},
  taxonomy::{Taxonomy, Tier},
};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Upper bound on a single responder call unless configured otherwise.
pub const DEFAULT_RESPONDER_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct EngineConfig {
  /// Calls taking longer are abandoned and treated as a timeout.
  pub responder_timeout: Duration,
  pub form_triggers:     FormTriggers,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      responder_timeout: DEFAULT_RESPONDER_TIMEOUT,
      form_triggers:     FormTriggers::default(),
    }
  }
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// Which branch a turn took.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TurnAction {
  Emergency,
  Symptom,
  FormRequest,
  Unclassified,
}

/// What the transport receives after a turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
  pub reply:          String,
  pub action:         TurnAction,
  pub classification: Classification,
  /// The record after this turn was applied.
  pub snapshot:       RecordSnapshot,
}

/// The reply used when nothing matched and no responder reply is available.
pub fn fallback_reply(utterance: &str) -> String {
  format!(
    "Thank you for sharing: \"{}\".\nI could not match this to a symptom I \
     know about, so I cannot give specific guidance.\n{DISCLAIMER}",
    utterance.trim()
  )
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Stateless with respect to conversations: one engine serves any number of
/// them, each passed in by the caller.
#[derive(Debug)]
pub struct TriageEngine<R = NoResponder> {
  taxonomy:  Arc<Taxonomy>,
  responder: Option<R>,
  config:    EngineConfig,
}

impl TriageEngine {
  /// An engine that always uses the fallback reply for unclassified input.
  pub fn new(taxonomy: Taxonomy) -> Self {
    Self::from_parts(Arc::new(taxonomy), None, EngineConfig::default())
  }
}

impl<R: Responder> TriageEngine<R> {
  pub fn with_responder(taxonomy: Taxonomy, responder: R) -> Self {
    Self::from_parts(Arc::new(taxonomy), Some(responder), EngineConfig::default())
  }

  pub fn from_parts(
    taxonomy: Arc<Taxonomy>,
    responder: Option<R>,
    config: EngineConfig,
  ) -> Self {
    Self { taxonomy, responder, config }
  }

  pub fn with_config(mut self, config: EngineConfig) -> Self {
    self.config = config;
    self
  }

  pub fn taxonomy(&self) -> &Taxonomy { &self.taxonomy }

  pub fn config(&self) -> &EngineConfig { &self.config }

  pub fn responder(&self) -> Option<&R> { self.responder.as_ref() }

  /// Handle one user utterance and return the reply plus updated record.
  ///
  /// Never fails: responder problems are logged and replaced by
  /// [`fallback_reply`].
  pub async fn handle_turn(
    &self,
    conversation: &mut Conversation,
    utterance: &str,
  ) -> TurnOutcome {
    let conversation_id = conversation.id;
    let user_turn = conversation.log.next_turn(Role::User, utterance);
    let classification = classify(utterance, &self.taxonomy);

    let action = match classification.tier() {
      Some(Tier::Emergency) => TurnAction::Emergency,
      Some(Tier::Routine) => TurnAction::Symptom,
      None if self.config.form_triggers.find(utterance).is_some() => {
        TurnAction::FormRequest
      }
      None => TurnAction::Unclassified,
    };

    let reply = match (&classification, action) {
      (Classification::Matched(m), _) => m.response_text.clone(),
      (Classification::NoMatch, TurnAction::FormRequest) => FORM_NOTICE.to_string(),
      (Classification::NoMatch, _) => {
        let mut history = conversation.log.turns().to_vec();
        history.push(user_turn.clone());
        self.unclassified_reply(utterance, &history).await
      }
    };

    // Commit. Nothing below awaits.
    let now = Utc::now();
    conversation.log.append(user_turn);
    let record = &mut conversation.record;
    match &classification {
      Classification::Matched(m) if m.tier == Tier::Emergency => {
        tracing::warn!(
          %conversation_id,
          phrase = %m.phrase,
          category = %m.category,
          "emergency symptom reported"
        );
        record.raise_urgency(Urgency::Emergency);
        record.append_symptom(&m.phrase, &m.category);
        record.append_note(format!("EMERGENCY: {}", m.phrase), now);
      }
      Classification::Matched(m) => {
        tracing::info!(
          %conversation_id,
          phrase = %m.phrase,
          category = %m.category,
          escalates = m.escalates,
          "routine symptom reported"
        );
        if m.escalates {
          record.raise_urgency(Urgency::Urgent);
        }
        record.append_symptom(&m.phrase, &m.category);
        record.append_note(format!("[{}] {}", m.phrase, utterance.trim()), now);
      }
      Classification::NoMatch if action == TurnAction::FormRequest => {
        tracing::info!(%conversation_id, "form requested");
        record.append_note(format!("[form request] {}", utterance.trim()), now);
      }
      Classification::NoMatch => {
        tracing::debug!(%conversation_id, "utterance not classified");
        record.append_note(format!("[unclassified] {}", utterance.trim()), now);
      }
    }
    conversation.log.push(Role::Assistant, reply.clone());

    TurnOutcome {
      reply,
      action,
      classification,
      snapshot: conversation.record.snapshot(),
    }
  }

  async fn unclassified_reply(
    &self,
    utterance: &str,
    history: &[ConversationTurn],
  ) -> String {
    let Some(responder) = &self.responder else {
      return fallback_reply(utterance);
    };

    let timeout = self.config.responder_timeout;
    let generated =
      match tokio::time::timeout(timeout, responder.generate(utterance, history)).await {
        Ok(result) => result,
        Err(_) => Err(ResponderError::Timeout(timeout)),
      };

    match generated.and_then(|text| safety::sanitize_reply(&text)) {
      Ok(reply) => reply,
      Err(error) => {
        tracing::warn!(%error, "responder failed; using fallback reply");
        fallback_reply(utterance)
      }
    }
  }
}
