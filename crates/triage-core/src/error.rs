//! Error types for `triage-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// A taxonomy table failed validation while being loaded.
  #[error("invalid taxonomy: {0}")]
  InvalidTaxonomy(String),

  /// Attempted to use, reset, or remove a conversation that does not exist.
  #[error("conversation not found: {0}")]
  UnknownConversation(Uuid),

  #[error("invalid record snapshot: {0}")]
  InvalidSnapshot(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
