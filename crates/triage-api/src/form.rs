//! Handler for `/conversations/:id/form` and identity validation.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/conversations/:id/form` | Body: `{"name":"...","age":"42"}`; returns 201 + submission |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use triage_core::{
  form::{FormSink, FormSubmission, PatientIdentity},
  responder::Responder,
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// Oldest accepted age, in years.
pub const MAX_AGE: u8 = 150;

/// Validate raw identity fields as typed into a form.
///
/// Both fields must be non-blank; `age` must be a whole number between 0 and
/// [`MAX_AGE`].
pub fn parse_identity(name: &str, age: &str) -> Result<PatientIdentity, ApiError> {
  let name = name.trim();
  let age = age.trim();
  if name.is_empty() || age.is_empty() {
    return Err(ApiError::BadRequest("please fill in all fields".into()));
  }

  let invalid_age =
    || ApiError::BadRequest(format!("please enter a valid age (0-{MAX_AGE})"));
  let age: i64 = match age.parse() {
    Ok(age) => age,
    // Numeric, but fractional or too large for a whole number of years.
    Err(_) if age.parse::<f64>().is_ok_and(f64::is_finite) => return Err(invalid_age()),
    Err(_) => return Err(ApiError::BadRequest("age must be a number".into())),
  };
  let age = u8::try_from(age)
    .ok()
    .filter(|a| *a <= MAX_AGE)
    .ok_or_else(invalid_age)?;

  Ok(PatientIdentity { name: name.to_string(), age })
}

/// `age` arrives either as typed text or as a JSON number. Every form is
/// checked by [`parse_identity`].
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AgeField {
  Whole(i64),
  /// Fractional numbers and integers outside the `i64` range.
  Fractional(f64),
  Text(String),
}

impl AgeField {
  fn as_text(&self) -> String {
    match self {
      AgeField::Whole(n) => n.to_string(),
      AgeField::Fractional(n) => n.to_string(),
      AgeField::Text(s) => s.clone(),
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct FormBody {
  pub name: String,
  pub age:  AgeField,
}

/// `POST /conversations/:id/form`
pub async fn submit<R, F>(
  State(state): State<AppState<R, F>>,
  Path(id): Path<Uuid>,
  Json(body): Json<FormBody>,
) -> Result<impl IntoResponse, ApiError>
where
  R: Responder,
  F: FormSink,
{
  let patient = parse_identity(&body.name, &body.age.as_text())?;

  let conversation = state.conversations.get(id).await?;
  let snapshot = conversation.lock().await.record().snapshot();
  let submission = FormSubmission::new(patient, snapshot)?;

  state
    .forms
    .submit(&submission)
    .await
    .map_err(|e| ApiError::FormSink(Box::new(e)))?;

  tracing::info!(
    conversation_id = %id,
    submission_id = %submission.submission_id,
    urgency = %submission.record.urgency,
    "form submitted"
  );
  Ok((StatusCode::CREATED, Json(submission)))
}
