//! Phrase classifier.
//!
//! Classification is plain case-folded substring containment: no stemming,
//! no tokenisation. The taxonomy's priority order decides ties, never the
//! position of a phrase in the utterance.

use serde::{Deserialize, Serialize};

use crate::taxonomy::{SymptomEntry, Taxonomy, Tier};

// ─── Result types ────────────────────────────────────────────────────────────

/// A taxonomy entry that matched an utterance, with its rendered reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomMatch {
  pub phrase:        String,
  pub tier:          Tier,
  pub category:      String,
  pub response_text: String,
  pub escalates:     bool,
}

impl From<&SymptomEntry> for SymptomMatch {
  fn from(entry: &SymptomEntry) -> Self {
    Self {
      phrase:        entry.phrase.clone(),
      tier:          entry.tier,
      category:      entry.category.clone(),
      response_text: entry.render_response(),
      escalates:     entry.escalates,
    }
  }
}

/// Outcome of classifying one utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Classification {
  Matched(SymptomMatch),
  NoMatch,
}

impl Classification {
  pub fn is_match(&self) -> bool { matches!(self, Self::Matched(_)) }

  pub fn as_match(&self) -> Option<&SymptomMatch> {
    match self {
      Self::Matched(m) => Some(m),
      Self::NoMatch => None,
    }
  }

  pub fn tier(&self) -> Option<Tier> { self.as_match().map(|m| m.tier) }
}

// ─── Classifier ──────────────────────────────────────────────────────────────

/// Case-fold an utterance for matching.
pub fn normalize(utterance: &str) -> String { utterance.to_lowercase() }

/// Classify `utterance` against `taxonomy`.
///
/// Emergency entries are tried before routine ones, each in declaration
/// order; the first phrase contained in the normalised utterance wins.
pub fn classify(utterance: &str, taxonomy: &Taxonomy) -> Classification {
  let normalized = normalize(utterance);
  taxonomy
    .entries()
    .find(|entry| normalized.contains(entry.phrase.as_str()))
    .map_or(Classification::NoMatch, |entry| {
      Classification::Matched(SymptomMatch::from(entry))
    })
}

// ─── Form requests ───────────────────────────────────────────────────────────

/// Reply surfaced when the user asks for a form or a doctor.
pub const FORM_NOTICE: &str = "A medical form is available in the menu. \
  Fill it out with your name and age and it will be sent to one of our \
  trusted doctors together with the symptoms you have described.";

const DEFAULT_FORM_TRIGGERS: &[&str] = &[
  "create form",
  "create a form",
  "medical form",
  "want form",
  "need form",
  "fill form",
  "fill out a form",
  "contact doctor",
  "contact a doctor",
  "see doctor",
  "see a doctor",
  "talk to a doctor",
  "severe condition",
  "serious condition",
];

/// Phrases that signal a request for the doctor-facing form.
///
/// Only consulted after symptom classification found nothing, so a form
/// request can never mask an emergency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormTriggers(Vec<String>);

impl FormTriggers {
  pub fn new(phrases: impl IntoIterator<Item = impl Into<String>>) -> Self {
    Self(
      phrases
        .into_iter()
        .map(|p| Into::<String>::into(p).trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect(),
    )
  }

  /// The first trigger phrase contained in `utterance`, if any.
  pub fn find(&self, utterance: &str) -> Option<&str> {
    let normalized = normalize(utterance);
    self
      .0
      .iter()
      .find(|phrase| normalized.contains(phrase.as_str()))
      .map(String::as_str)
  }
}

impl Default for FormTriggers {
  fn default() -> Self { Self::new(DEFAULT_FORM_TRIGGERS.iter().copied()) }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn taxonomy() -> Taxonomy {
    Taxonomy::from_entries([
      SymptomEntry::emergency("chest pain", "Cardiac"),
      SymptomEntry::emergency("difficulty breathing", "Respiratory"),
      SymptomEntry::routine("headache", "Neurological"),
      SymptomEntry::routine("cough", "Respiratory"),
    ])
    .unwrap()
  }

  #[test]
  fn emergency_beats_routine_regardless_of_position() {
    let t = taxonomy();
    for utterance in [
      "I have chest pain and a headache",
      "I have a headache and chest pain",
      "cough, headache, CHEST PAIN",
    ] {
      let m = classify(utterance, &t);
      let m = m.as_match().unwrap();
      assert_eq!(m.tier, Tier::Emergency, "{utterance}");
      assert_eq!(m.phrase, "chest pain", "{utterance}");
      assert_eq!(m.category, "Cardiac");
    }
  }

  #[test]
  fn same_tier_resolves_by_declaration_order() {
    let t = taxonomy();
    // "cough" appears first in the text, but "headache" is declared first.
    let m = classify("a cough and then a headache", &t);
    assert_eq!(m.as_match().unwrap().phrase, "headache");

    let m = classify("difficulty breathing after chest pain", &t);
    assert_eq!(m.as_match().unwrap().phrase, "chest pain");
  }

  #[test]
  fn matching_is_case_insensitive() {
    let m = classify("HEADACHE since Monday", &taxonomy());
    assert_eq!(m.tier(), Some(Tier::Routine));
  }

  #[test]
  fn unknown_input_is_explicit_no_match() {
    let m = classify("I feel weird today", &taxonomy());
    assert_eq!(m, Classification::NoMatch);
    assert!(!m.is_match());
    assert!(m.tier().is_none());
  }

  #[test]
  fn classification_is_deterministic() {
    let t = taxonomy();
    let first = classify("chest pain and cough", &t);
    for _ in 0..10 {
      assert_eq!(classify("chest pain and cough", &t), first);
    }
  }

  #[test]
  fn matched_result_carries_rendered_response() {
    let m = classify("my headache is back", &taxonomy());
    let m = m.as_match().unwrap();
    assert!(m.response_text.contains("Neurological"));
    assert!(!m.escalates);
  }

  #[test]
  fn form_triggers_match_doctor_requests() {
    let triggers = FormTriggers::default();
    assert_eq!(triggers.find("I want to see a doctor"), Some("see a doctor"));
    assert_eq!(triggers.find("Can I fill out a form?"), Some("fill out a form"));
    assert!(triggers.find("good morning").is_none());
  }

  #[test]
  fn custom_form_triggers_are_normalised() {
    let triggers = FormTriggers::new(["  Book Appointment ", ""]);
    assert_eq!(triggers.find("please BOOK APPOINTMENT"), Some("book appointment"));
  }

  #[test]
  fn no_match_serialises_with_outcome_tag() {
    let json = serde_json::to_value(Classification::NoMatch).unwrap();
    assert_eq!(json["outcome"], "no_match");
  }
}
