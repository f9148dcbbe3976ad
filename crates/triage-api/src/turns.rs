//! Handlers for `/conversations/:id/turns`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/conversations/:id/turns` | Body: `{"utterance":"..."}`; returns reply + record |
//! | `GET`  | `/conversations/:id/turns` | The conversation log, oldest first |

use axum::{
  Json,
  extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use triage_core::{
  classify::Classification,
  conversation::ConversationTurn,
  engine::TurnAction,
  form::FormSink,
  record::RecordSnapshot,
  responder::Responder,
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TurnBody {
  pub utterance: String,
}

#[derive(Debug, Serialize)]
pub struct TurnResponse {
  pub reply:          String,
  pub action:         TurnAction,
  pub classification: Classification,
  pub record:         RecordSnapshot,
}

/// `POST /conversations/:id/turns`; body: `{"utterance":"..."}`
///
/// Turns for the same conversation are handled one at a time, in the order
/// their requests acquire the conversation.
pub async fn create<R, F>(
  State(state): State<AppState<R, F>>,
  Path(id): Path<Uuid>,
  Json(body): Json<TurnBody>,
) -> Result<Json<TurnResponse>, ApiError>
where
  R: Responder,
  F: FormSink,
{
  if body.utterance.trim().is_empty() {
    return Err(ApiError::BadRequest("utterance must not be empty".into()));
  }

  let conversation = state.conversations.get(id).await?;
  let mut conversation = conversation.lock().await;
  let outcome = state.engine.handle_turn(&mut conversation, &body.utterance).await;

  Ok(Json(TurnResponse {
    reply:          outcome.reply,
    action:         outcome.action,
    classification: outcome.classification,
    record:         outcome.snapshot,
  }))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /conversations/:id/turns`
pub async fn list<R, F>(
  State(state): State<AppState<R, F>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<ConversationTurn>>, ApiError>
where
  R: Responder,
  F: FormSink,
{
  let conversation = state.conversations.get(id).await?;
  let turns = conversation.lock().await.log().turns().to_vec();
  Ok(Json(turns))
}
