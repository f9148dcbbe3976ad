//! Error type for `triage-ollama`.

use std::time::Duration;

use thiserror::Error;
use triage_core::responder::ResponderError;

#[derive(Debug, Error)]
pub enum Error {
  #[error("cannot reach ollama at {0}")]
  Connection(String),

  #[error("ollama request timed out after {0:?}")]
  Timeout(Duration),

  #[error("ollama returned {status}: {body}")]
  Status { status: u16, body: String },

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for ResponderError {
  fn from(error: Error) -> Self {
    match error {
      Error::Timeout(after) => ResponderError::Timeout(after),
      other => ResponderError::Unavailable(other.to_string()),
    }
  }
}
