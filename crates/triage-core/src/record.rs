//! The patient record: structured state accumulated over a conversation.
//!
//! A record only grows: symptoms and notes are appended, urgency is only ever
//! raised. The engine is the sole writer, so the mutators are crate-private;
//! everyone else reads a [`RecordSnapshot`].

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Urgency ─────────────────────────────────────────────────────────────────

/// Conversation-level severity. Ordered `NonUrgent < Urgent < Emergency`.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Urgency {
  #[default]
  NonUrgent,
  Urgent,
  Emergency,
}

// ─── Note ────────────────────────────────────────────────────────────────────

/// A timestamped free-text entry. Never edited once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
  pub recorded_at: DateTime<Utc>,
  pub text:        String,
}

// ─── PatientRecord ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PatientRecord {
  symptoms:           Vec<String>,
  /// Category of each symptom, index-aligned with `symptoms`.
  symptom_categories: Vec<String>,
  categories:         BTreeSet<String>,
  urgency:            Urgency,
  notes:              Vec<Note>,
  created_at:         DateTime<Utc>,
}

impl PatientRecord {
  /// An empty record stamped with the current time.
  pub fn new() -> Self {
    Self {
      symptoms:           Vec::new(),
      symptom_categories: Vec::new(),
      categories:         BTreeSet::new(),
      urgency:            Urgency::default(),
      notes:              Vec::new(),
      created_at:         Utc::now(),
    }
  }

  pub fn symptoms(&self) -> &[String] { &self.symptoms }

  /// The category `phrase` was recorded under.
  pub fn symptom_category(&self, phrase: &str) -> Option<&str> {
    let index = self.symptoms.iter().position(|s| s == phrase)?;
    Some(self.symptom_categories[index].as_str())
  }

  pub fn categories(&self) -> &BTreeSet<String> { &self.categories }

  pub fn urgency(&self) -> Urgency { self.urgency }

  pub fn notes(&self) -> &[Note] { &self.notes }

  pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

  /// Record a symptom and its category. Returns `false` if the phrase was
  /// already present, in which case nothing changes.
  pub(crate) fn append_symptom(&mut self, phrase: &str, category: &str) -> bool {
    if self.symptoms.iter().any(|s| s == phrase) {
      return false;
    }
    self.symptoms.push(phrase.to_string());
    self.symptom_categories.push(category.to_string());
    self.categories.insert(category.to_string());
    true
  }

  /// Raise urgency to `level` if it ranks higher than the current level.
  /// Returns whether the level changed.
  pub(crate) fn raise_urgency(&mut self, level: Urgency) -> bool {
    if level > self.urgency {
      self.urgency = level;
      true
    } else {
      false
    }
  }

  /// Append a note. `at` is clamped to the latest timestamp already in the
  /// record so notes stay ordered even if the wall clock steps backwards.
  pub(crate) fn append_note(&mut self, text: impl Into<String>, at: DateTime<Utc>) {
    let recorded_at = at.max(self.latest_timestamp());
    self.notes.push(Note { recorded_at, text: text.into() });
  }

  fn latest_timestamp(&self) -> DateTime<Utc> {
    self.notes.last().map_or(self.created_at, |n| n.recorded_at)
  }

  /// Return the record to its empty initial state with a fresh timestamp.
  pub(crate) fn reset(&mut self) { *self = Self::new(); }

  /// An immutable copy of the record as of now.
  pub fn snapshot(&self) -> RecordSnapshot {
    RecordSnapshot {
      symptoms:           self.symptoms.clone(),
      symptom_categories: self.symptom_categories.clone(),
      categories:         self.categories.iter().cloned().collect(),
      urgency:            self.urgency,
      notes:              self.notes.clone(),
      created_at:         self.created_at,
      as_of:              Utc::now().max(self.latest_timestamp()),
    }
  }
}

impl Default for PatientRecord {
  fn default() -> Self { Self::new() }
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// The read model handed to transports, responders, and form consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSnapshot {
  pub symptoms:           Vec<String>,
  /// Category of each symptom, index-aligned with `symptoms`.
  pub symptom_categories: Vec<String>,
  /// Sorted, distinct.
  pub categories:         Vec<String>,
  pub urgency:            Urgency,
  pub notes:              Vec<Note>,
  pub created_at:         DateTime<Utc>,
  /// The point in time at which this snapshot was taken.
  pub as_of:              DateTime<Utc>,
}

impl RecordSnapshot {
  /// Check the record invariants, for snapshots that have crossed a process
  /// boundary before being attached to a form.
  pub fn validate(&self) -> Result<()> {
    let mut seen = HashSet::new();
    if let Some(dup) = self.symptoms.iter().find(|s| !seen.insert(s.as_str())) {
      return Err(Error::InvalidSnapshot(format!("duplicate symptom {dup:?}")));
    }

    let distinct: BTreeSet<&str> = self.categories.iter().map(String::as_str).collect();
    if distinct.len() != self.categories.len() {
      return Err(Error::InvalidSnapshot("duplicate category".into()));
    }
    if self.symptom_categories.len() != self.symptoms.len() {
      return Err(Error::InvalidSnapshot(
        "every symptom needs exactly one category".into(),
      ));
    }
    let derived: BTreeSet<&str> =
      self.symptom_categories.iter().map(String::as_str).collect();
    if derived != distinct {
      return Err(Error::InvalidSnapshot(
        "categories do not correspond to symptoms".into(),
      ));
    }

    let mut previous = self.created_at;
    for note in &self.notes {
      if note.recorded_at < previous {
        return Err(Error::InvalidSnapshot(format!(
          "note recorded at {} is out of order",
          note.recorded_at
        )));
      }
      previous = note.recorded_at;
    }
    if self.as_of < previous {
      return Err(Error::InvalidSnapshot("snapshot predates its contents".into()));
    }
    Ok(())
  }
}
