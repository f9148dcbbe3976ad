//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The request was well-formed but its content breaks an invariant.
  #[error("unprocessable: {0}")]
  Unprocessable(String),

  #[error("form sink error: {0}")]
  FormSink(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("internal error: {0}")]
  Internal(String),
}

impl From<triage_core::Error> for ApiError {
  fn from(error: triage_core::Error) -> Self {
    use triage_core::Error as Core;
    match error {
      Core::UnknownConversation(id) => {
        ApiError::NotFound(format!("conversation {id} not found"))
      }
      Core::InvalidSnapshot(msg) => ApiError::Unprocessable(msg),
      Core::InvalidTaxonomy(msg) => ApiError::Internal(msg),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unprocessable(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
      ApiError::FormSink(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
      ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m.clone()),
    };
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    (status, Json(json!({ "error": message }))).into_response()
  }
}
