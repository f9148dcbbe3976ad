//! Handlers for `/conversations` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/conversations` | Starts an empty conversation; returns 201 |
//! | `GET`    | `/conversations/:id` | Current record snapshot |
//! | `DELETE` | `/conversations/:id` | Ends the conversation; returns 204 |
//! | `POST`   | `/conversations/:id/reset` | Empties record and log |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Serialize;
use triage_core::{form::FormSink, record::RecordSnapshot, responder::Responder};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// Response body shared by the conversation endpoints.
#[derive(Debug, Serialize)]
pub struct ConversationBody {
  pub id:     Uuid,
  pub record: RecordSnapshot,
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /conversations`
pub async fn create<R, F>(State(state): State<AppState<R, F>>) -> impl IntoResponse
where
  R: Responder,
  F: FormSink,
{
  let (id, record) = state.conversations.create().await;
  (StatusCode::CREATED, Json(ConversationBody { id, record }))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /conversations/:id`
pub async fn get_one<R, F>(
  State(state): State<AppState<R, F>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ConversationBody>, ApiError>
where
  R: Responder,
  F: FormSink,
{
  let conversation = state.conversations.get(id).await?;
  let record = conversation.lock().await.record().snapshot();
  Ok(Json(ConversationBody { id, record }))
}

// ─── Remove ───────────────────────────────────────────────────────────────────

/// `DELETE /conversations/:id`
pub async fn remove<R, F>(
  State(state): State<AppState<R, F>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  R: Responder,
  F: FormSink,
{
  state.conversations.remove(id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Reset ────────────────────────────────────────────────────────────────────

/// `POST /conversations/:id/reset`
pub async fn reset<R, F>(
  State(state): State<AppState<R, F>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ConversationBody>, ApiError>
where
  R: Responder,
  F: FormSink,
{
  let record = state.conversations.reset(id).await?;
  Ok(Json(ConversationBody { id, record }))
}
