//! Doctor-facing form submission.
//!
//! The transport collects the patient's identity; the core only attaches a
//! validated record snapshot and hands the result to a [`FormSink`].

use std::{convert::Infallible, future::Future};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{Result, record::RecordSnapshot};

/// Identity fields supplied by the transport layer. Not validated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientIdentity {
  pub name: String,
  pub age:  u8,
}

/// A completed form, ready for a doctor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSubmission {
  pub submission_id: Uuid,
  pub patient:       PatientIdentity,
  pub record:        RecordSnapshot,
  pub submitted_at:  DateTime<Utc>,
}

impl FormSubmission {
  /// Attach `record` to `patient`. Fails with
  /// [`Error::InvalidSnapshot`](crate::Error::InvalidSnapshot) if the
  /// snapshot breaks a record invariant.
  pub fn new(patient: PatientIdentity, record: RecordSnapshot) -> Result<Self> {
    record.validate()?;
    Ok(Self {
      submission_id: Uuid::new_v4(),
      patient,
      record,
      submitted_at: Utc::now(),
    })
  }
}

/// Destination for submitted forms (a doctor-facing system, a file, ...).
pub trait FormSink: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn submit<'a>(
    &'a self,
    submission: &'a FormSubmission,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

/// Keeps submissions in memory. Used for demo mode and tests.
#[derive(Debug, Default)]
pub struct MemoryFormSink {
  submissions: Mutex<Vec<FormSubmission>>,
}

impl MemoryFormSink {
  pub fn new() -> Self { Self::default() }

  pub async fn submissions(&self) -> Vec<FormSubmission> {
    self.submissions.lock().await.clone()
  }
}

impl FormSink for MemoryFormSink {
  type Error = Infallible;

  async fn submit(&self, submission: &FormSubmission) -> Result<(), Self::Error> {
    self.submissions.lock().await.push(submission.clone());
    tracing::info!(
      submission_id = %submission.submission_id,
      "form kept in memory"
    );
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{Error, record::PatientRecord};

  fn patient() -> PatientIdentity {
    PatientIdentity { name: "Ada Lovelace".into(), age: 36 }
  }

  #[test]
  fn submission_attaches_valid_snapshot() {
    let snapshot = PatientRecord::new().snapshot();
    let submission = FormSubmission::new(patient(), snapshot.clone()).unwrap();
    assert_eq!(submission.record, snapshot);
    assert_eq!(submission.patient.age, 36);
  }

  #[test]
  fn submission_rejects_invalid_snapshot() {
    let mut snapshot = PatientRecord::new().snapshot();
    snapshot.categories.push("Cardiac".into());
    let err = FormSubmission::new(patient(), snapshot).unwrap_err();
    assert!(matches!(err, Error::InvalidSnapshot(_)));
  }

  #[tokio::test]
  async fn memory_sink_keeps_submissions() {
    let sink = MemoryFormSink::new();
    let submission =
      FormSubmission::new(patient(), PatientRecord::new().snapshot()).unwrap();
    sink.submit(&submission).await.unwrap();

    let stored = sink.submissions().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].submission_id, submission.submission_id);
  }
}
