//! JSON REST API for the triage assistant.
//!
//! Exposes an axum [`Router`] over a shared [`TriageEngine`], a
//! [`ConversationRegistry`], and any [`FormSink`]. TLS, auth, and request
//! tracing are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", triage_api::api_router(state))
//! ```

pub mod conversations;
pub mod error;
pub mod form;
pub mod turns;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use triage_core::{
  engine::TriageEngine,
  form::FormSink,
  registry::ConversationRegistry,
  responder::Responder,
};

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<R, F> {
  pub engine:        Arc<TriageEngine<R>>,
  pub conversations: Arc<ConversationRegistry>,
  pub forms:         Arc<F>,
}

impl<R, F> AppState<R, F> {
  pub fn new(engine: TriageEngine<R>, forms: F) -> Self {
    Self {
      engine:        Arc::new(engine),
      conversations: Arc::new(ConversationRegistry::new()),
      forms:         Arc::new(forms),
    }
  }
}

impl<R, F> Clone for AppState<R, F> {
  fn clone(&self) -> Self {
    Self {
      engine:        self.engine.clone(),
      conversations: self.conversations.clone(),
      forms:         self.forms.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<R, F>(state: AppState<R, F>) -> Router<()>
where
  R: Responder + 'static,
  F: FormSink + 'static,
{
  Router::new()
    // Conversations
    .route("/conversations", post(conversations::create::<R, F>))
    .route(
      "/conversations/{id}",
      get(conversations::get_one::<R, F>).delete(conversations::remove::<R, F>),
    )
    .route("/conversations/{id}/reset", post(conversations::reset::<R, F>))
    // Turns
    .route(
      "/conversations/{id}/turns",
      get(turns::list::<R, F>).post(turns::create::<R, F>),
    )
    // Forms
    .route("/conversations/{id}/form", post(form::submit::<R, F>))
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use triage_core::{
    form::MemoryFormSink,
    responder::NoResponder,
    taxonomy::Taxonomy,
  };

  use super::*;

  type TestState = AppState<NoResponder, MemoryFormSink>;

  fn make_state() -> TestState {
    AppState::new(TriageEngine::new(Taxonomy::default()), MemoryFormSink::new())
  }

  async fn call(
    state: &TestState,
    method: &str,
    uri: &str,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(json) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(json.to_string())
      }
      None => Body::empty(),
    };
    let resp = api_router(state.clone())
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  async fn new_conversation(state: &TestState) -> String {
    let (status, body) = call(state, "POST", "/conversations", None).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
  }

  // ── Conversations ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_returns_empty_record() {
    let state = make_state();
    let (status, body) = call(&state, "POST", "/conversations", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["record"]["urgency"], "non_urgent");
    assert_eq!(body["record"]["symptoms"], json!([]));
  }

  #[tokio::test]
  async fn unknown_conversation_is_404() {
    let state = make_state();
    let uri = format!("/conversations/{}", uuid::Uuid::new_v4());
    let (status, body) = call(&state, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));

    let (status, _) = call(&state, "POST", &format!("{uri}/reset"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn delete_ends_conversation() {
    let state = make_state();
    let id = new_conversation(&state).await;
    let uri = format!("/conversations/{id}");

    let (status, _) = call(&state, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&state, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  // ── Turns ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn emergency_turn_updates_record() {
    let state = make_state();
    let id = new_conversation(&state).await;

    let (status, body) = call(
      &state,
      "POST",
      &format!("/conversations/{id}/turns"),
      Some(json!({ "utterance": "I have chest pain and a headache" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "emergency");
    assert_eq!(body["classification"]["category"], "Cardiac");
    assert_eq!(body["record"]["urgency"], "emergency");
    assert!(body["reply"].as_str().unwrap().contains("emergency services"));
  }

  #[tokio::test]
  async fn turns_are_logged_and_reset_clears_them() {
    let state = make_state();
    let id = new_conversation(&state).await;
    let turns_uri = format!("/conversations/{id}/turns");

    call(&state, "POST", &turns_uri, Some(json!({ "utterance": "headache" }))).await;
    let (_, log) = call(&state, "GET", &turns_uri, None).await;
    assert_eq!(log.as_array().unwrap().len(), 2);
    assert_eq!(log[0]["role"], "user");
    assert_eq!(log[1]["role"], "assistant");

    let (status, body) =
      call(&state, "POST", &format!("/conversations/{id}/reset"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["record"]["symptoms"], json!([]));

    let (_, log) = call(&state, "GET", &turns_uri, None).await;
    assert_eq!(log, json!([]));
  }

  #[tokio::test]
  async fn blank_utterance_is_rejected() {
    let state = make_state();
    let id = new_conversation(&state).await;
    let (status, _) = call(
      &state,
      "POST",
      &format!("/conversations/{id}/turns"),
      Some(json!({ "utterance": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  // ── Forms ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn form_submission_attaches_record() {
    let state = make_state();
    let id = new_conversation(&state).await;
    call(
      &state,
      "POST",
      &format!("/conversations/{id}/turns"),
      Some(json!({ "utterance": "I have a cough" })),
    )
    .await;

    let (status, body) = call(
      &state,
      "POST",
      &format!("/conversations/{id}/form"),
      Some(json!({ "name": " Grace Hopper ", "age": "85" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["patient"]["name"], "Grace Hopper");
    assert_eq!(body["patient"]["age"], 85);
    assert_eq!(body["record"]["symptoms"], json!(["cough"]));

    let stored = state.forms.submissions().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].record.categories, ["Respiratory"]);
  }

  #[tokio::test]
  async fn form_accepts_numeric_age() {
    let state = make_state();
    let id = new_conversation(&state).await;
    let (status, _) = call(
      &state,
      "POST",
      &format!("/conversations/{id}/form"),
      Some(json!({ "name": "Grace", "age": 42 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
  }

  #[tokio::test]
  async fn form_rejects_bad_identity() {
    let state = make_state();
    let id = new_conversation(&state).await;
    let uri = format!("/conversations/{id}/form");

    for body in [
      json!({ "name": "", "age": "30" }),
      json!({ "name": "Grace", "age": "thirty" }),
      json!({ "name": "Grace", "age": "151" }),
      json!({ "name": "Grace", "age": 42.5 }),
      json!({ "name": "Grace", "age": -3 }),
    ] {
      let (status, _) = call(&state, "POST", &uri, Some(body.clone())).await;
      assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    }
    assert!(state.forms.submissions().await.is_empty());
  }
}
