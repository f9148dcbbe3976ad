//! The responder capability: free-form replies for unclassified input.
//!
//! A responder is an external text generator (typically a local language
//! model). The engine only calls it when no taxonomy phrase and no form
//! trigger matched, and it treats every failure the same way: the
//! deterministic fallback reply is used instead.

use std::{future::Future, time::Duration};

use thiserror::Error;

use crate::conversation::ConversationTurn;

/// Why a responder could not produce a reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponderError {
  /// Unreachable, refused the request, or returned something unusable.
  #[error("responder unavailable: {0}")]
  Unavailable(String),

  #[error("responder timed out after {0:?}")]
  Timeout(Duration),
}

/// Abstraction over a free-form reply generator.
///
/// `history` is the conversation so far, oldest first, ending with the user
/// turn that carries `utterance`. Implementations own any retry policy; the
/// engine never retries.
pub trait Responder: Send + Sync {
  fn generate<'a>(
    &'a self,
    utterance: &'a str,
    history: &'a [ConversationTurn],
  ) -> impl Future<Output = Result<String, ResponderError>> + Send + 'a;
}

/// Stand-in type for an engine built without a responder. Never called.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResponder;

impl Responder for NoResponder {
  async fn generate(
    &self,
    _utterance: &str,
    _history: &[ConversationTurn],
  ) -> Result<String, ResponderError> {
    Err(ResponderError::Unavailable("no responder configured".into()))
  }
}
