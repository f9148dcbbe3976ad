//! The symptom taxonomy, a static table of trigger phrases.
//!
//! Each [`SymptomEntry`] maps a lowercase phrase to a severity [`Tier`], a
//! clinical category, and a response template. The table is immutable once
//! built. Emergency entries are always consulted before routine entries, and
//! within a tier entries keep the order in which they were declared.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Tier ────────────────────────────────────────────────────────────────────

/// Severity tier of a taxonomy entry.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Tier {
  Emergency,
  Routine,
}

// ─── Templates ───────────────────────────────────────────────────────────────

/// Every emergency reply must carry this instruction (matched
/// case-insensitively), whether it comes from the default template or an
/// override.
pub const EMERGENCY_INSTRUCTION: &str = "emergency services";

/// Default reply for emergency-tier entries. Placeholders: `{phrase}`,
/// `{category}`.
pub const EMERGENCY_TEMPLATE: &str = "EMERGENCY: {phrase} detected.\n\
  1. Call your local emergency services IMMEDIATELY.\n\
  2. Do NOT wait for further instructions from this chat.\n\
  3. Follow the operator's guidance until help arrives.";

/// Default reply for routine-tier entries. Placeholders: `{phrase}`,
/// `{category}`.
pub const ROUTINE_TEMPLATE: &str = "You mentioned {phrase}, which is a \
  {category} symptom.\n\
  Rest, stay hydrated, and keep track of how it changes over the next few \
  days.\n\
  Please consult a healthcare professional if it persists or gets worse.";

// ─── SymptomEntry ────────────────────────────────────────────────────────────

/// One row of the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomEntry {
  /// Lowercase trigger phrase, matched by substring containment.
  pub phrase:            String,
  pub tier:              Tier,
  /// Clinical label, e.g. `"Cardiac"` or `"Respiratory"`.
  pub category:          String,
  /// Overrides the tier's default template when set.
  #[serde(default)]
  pub response_template: Option<String>,
  /// Routine entries with this flag raise the record's urgency to `Urgent`.
  #[serde(default)]
  pub escalates:         bool,
}

impl SymptomEntry {
  pub fn new(
    phrase: impl Into<String>,
    tier: Tier,
    category: impl Into<String>,
  ) -> Self {
    Self {
      phrase: phrase.into(),
      tier,
      category: category.into(),
      response_template: None,
      escalates: false,
    }
  }

  pub fn emergency(phrase: &str, category: &str) -> Self {
    Self::new(phrase, Tier::Emergency, category)
  }

  pub fn routine(phrase: &str, category: &str) -> Self {
    Self::new(phrase, Tier::Routine, category)
  }

  pub fn with_template(mut self, template: impl Into<String>) -> Self {
    self.response_template = Some(template.into());
    self
  }

  pub fn escalating(mut self) -> Self {
    self.escalates = true;
    self
  }

  /// Render this entry's response template (or the tier default).
  pub fn render_response(&self) -> String {
    let template = self.response_template.as_deref().unwrap_or(match self.tier {
      Tier::Emergency => EMERGENCY_TEMPLATE,
      Tier::Routine => ROUTINE_TEMPLATE,
    });
    template
      .replace("{phrase}", &self.phrase)
      .replace("{category}", &self.category)
  }

  fn validate(&self) -> Result<()> {
    if self.phrase.trim().is_empty() {
      return Err(Error::InvalidTaxonomy("empty phrase".into()));
    }
    if self.phrase != self.phrase.trim() || self.phrase != self.phrase.to_lowercase() {
      return Err(Error::InvalidTaxonomy(format!(
        "phrase {:?} must be trimmed lowercase text",
        self.phrase
      )));
    }
    if self.category.trim().is_empty() {
      return Err(Error::InvalidTaxonomy(format!(
        "phrase {:?} has an empty category",
        self.phrase
      )));
    }

    let Some(template) = self.response_template.as_deref() else {
      return Ok(());
    };
    match self.tier {
      Tier::Emergency if !template.to_lowercase().contains(EMERGENCY_INSTRUCTION) => {
        Err(Error::InvalidTaxonomy(format!(
          "emergency template for {:?} must tell the user to contact {EMERGENCY_INSTRUCTION}",
          self.phrase
        )))
      }
      Tier::Routine if !template.contains("{category}") => {
        Err(Error::InvalidTaxonomy(format!(
          "routine template for {:?} must name its {{category}}",
          self.phrase
        )))
      }
      _ => Ok(()),
    }
  }
}

// ─── Taxonomy ────────────────────────────────────────────────────────────────

/// Immutable symptom table with a fixed priority order.
#[derive(Debug, Clone)]
pub struct Taxonomy {
  emergency: Vec<SymptomEntry>,
  routine:   Vec<SymptomEntry>,
}

impl Taxonomy {
  /// Build a taxonomy from entries in declaration order.
  ///
  /// Fails with [`Error::InvalidTaxonomy`] on an empty, untrimmed, or
  /// non-lowercase phrase, an empty category, or a duplicated phrase.
  pub fn from_entries(entries: impl IntoIterator<Item = SymptomEntry>) -> Result<Self> {
    let entries: Vec<SymptomEntry> = entries.into_iter().collect();
    let mut seen = HashSet::new();
    for entry in &entries {
      entry.validate()?;
      if !seen.insert(entry.phrase.as_str()) {
        return Err(Error::InvalidTaxonomy(format!(
          "duplicate phrase {:?}",
          entry.phrase
        )));
      }
    }
    Ok(Self::partition(entries))
  }

  fn partition(entries: Vec<SymptomEntry>) -> Self {
    let (emergency, routine) =
      entries.into_iter().partition(|e| e.tier == Tier::Emergency);
    Self { emergency, routine }
  }

  /// All entries in priority order: emergency first, then routine, each in
  /// declaration order.
  pub fn entries(&self) -> impl Iterator<Item = &SymptomEntry> {
    self.emergency.iter().chain(self.routine.iter())
  }

  /// Entries of a single tier, in declaration order.
  pub fn tier(&self, tier: Tier) -> &[SymptomEntry] {
    match tier {
      Tier::Emergency => &self.emergency,
      Tier::Routine => &self.routine,
    }
  }

  pub fn get(&self, phrase: &str) -> Option<&SymptomEntry> {
    self.entries().find(|e| e.phrase == phrase)
  }

  pub fn len(&self) -> usize { self.emergency.len() + self.routine.len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl Default for Taxonomy {
  /// The built-in table.
  fn default() -> Self { Self::partition(builtin_entries()) }
}

/// The built-in taxonomy rows, in declaration order.
pub fn builtin_entries() -> Vec<SymptomEntry> {
  vec![
    // Emergency
    SymptomEntry::emergency("chest pain", "Cardiac"),
    SymptomEntry::emergency("heart attack", "Cardiac"),
    SymptomEntry::emergency("difficulty breathing", "Respiratory"),
    SymptomEntry::emergency("choking", "Respiratory"),
    SymptomEntry::emergency("severe bleeding", "Trauma"),
    SymptomEntry::emergency("severe burns", "Trauma"),
    SymptomEntry::emergency("stroke symptoms", "Neurological"),
    SymptomEntry::emergency("sudden numbness", "Neurological"),
    SymptomEntry::emergency("loss of consciousness", "Neurological"),
    SymptomEntry::emergency("severe headache", "Neurological"),
    SymptomEntry::emergency("allergic reaction", "Immunological"),
    SymptomEntry::emergency("poisoning", "Toxicological"),
    SymptomEntry::emergency("suicidal thoughts", "Mental Health").with_template(
      "EMERGENCY: {phrase} detected.\n\
       1. Call your local emergency services or a crisis line IMMEDIATELY.\n\
       2. Do NOT wait for further instructions from this chat.\n\
       3. Stay with someone you trust until help arrives.",
    ),
    // Routine
    SymptomEntry::routine("headache", "Neurological"),
    SymptomEntry::routine("migraine", "Neurological"),
    SymptomEntry::routine("dizziness", "Neurological"),
    SymptomEntry::routine("cough", "Respiratory"),
    SymptomEntry::routine("sore throat", "Respiratory"),
    SymptomEntry::routine("runny nose", "Respiratory"),
    SymptomEntry::routine("fever", "General").escalating(),
    SymptomEntry::routine("fatigue", "General"),
    SymptomEntry::routine("nausea", "Gastrointestinal"),
    SymptomEntry::routine("vomiting", "Gastrointestinal").escalating(),
    SymptomEntry::routine("diarrhea", "Gastrointestinal"),
    SymptomEntry::routine("stomach ache", "Gastrointestinal"),
    SymptomEntry::routine("back pain", "Musculoskeletal"),
    SymptomEntry::routine("joint pain", "Musculoskeletal"),
    SymptomEntry::routine("rash", "Dermatological"),
    SymptomEntry::routine("anxiety", "Mental Health"),
    SymptomEntry::routine("insomnia", "Mental Health"),
  ]
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builtin_table_passes_validation() {
    let taxonomy = Taxonomy::from_entries(builtin_entries()).unwrap();
    assert_eq!(taxonomy.len(), Taxonomy::default().len());
  }

  #[test]
  fn entries_yield_emergency_before_routine() {
    let taxonomy = Taxonomy::from_entries([
      SymptomEntry::routine("headache", "Neurological"),
      SymptomEntry::emergency("chest pain", "Cardiac"),
      SymptomEntry::routine("cough", "Respiratory"),
      SymptomEntry::emergency("choking", "Respiratory"),
    ])
    .unwrap();

    let order: Vec<&str> = taxonomy.entries().map(|e| e.phrase.as_str()).collect();
    assert_eq!(order, ["chest pain", "choking", "headache", "cough"]);
  }

  #[test]
  fn get_finds_entry_by_phrase() {
    let taxonomy = Taxonomy::default();
    let entry = taxonomy.get("fever").unwrap();
    assert_eq!(entry.tier, Tier::Routine);
    assert!(entry.escalates);
    assert!(taxonomy.get("hiccups").is_none());
  }

  #[test]
  fn duplicate_phrase_is_rejected() {
    let err = Taxonomy::from_entries([
      SymptomEntry::routine("cough", "Respiratory"),
      SymptomEntry::emergency("cough", "Respiratory"),
    ])
    .unwrap_err();
    assert!(matches!(err, Error::InvalidTaxonomy(_)), "{err}");
  }

  #[test]
  fn uppercase_or_empty_entries_are_rejected() {
    assert!(Taxonomy::from_entries([SymptomEntry::routine("Cough", "Respiratory")]).is_err());
    assert!(Taxonomy::from_entries([SymptomEntry::routine(" cough", "Respiratory")]).is_err());
    assert!(Taxonomy::from_entries([SymptomEntry::routine("", "Respiratory")]).is_err());
    assert!(Taxonomy::from_entries([SymptomEntry::routine("cough", " ")]).is_err());
  }

  #[test]
  fn render_uses_tier_default_or_override() {
    let routine = SymptomEntry::routine("headache", "Neurological");
    let text = routine.render_response();
    assert!(text.contains("headache"));
    assert!(text.contains("Neurological"));

    let custom = SymptomEntry::routine("rash", "Dermatological")
      .with_template("{category}: {phrase}");
    assert_eq!(custom.render_response(), "Dermatological: rash");
  }

  #[test]
  fn emergency_override_must_keep_the_emergency_instruction() {
    let silent = SymptomEntry::emergency("chest pain", "Cardiac")
      .with_template("Noted {phrase}, let's keep chatting.");
    let err = Taxonomy::from_entries([silent]).unwrap_err();
    assert!(matches!(err, Error::InvalidTaxonomy(_)), "{err}");

    let loud = SymptomEntry::emergency("chest pain", "Cardiac")
      .with_template("{phrase}: call Emergency Services now.");
    assert!(Taxonomy::from_entries([loud]).is_ok());
  }

  #[test]
  fn routine_override_must_name_the_category() {
    let unnamed = SymptomEntry::routine("rash", "Dermatological")
      .with_template("You mentioned {phrase}.");
    assert!(Taxonomy::from_entries([unnamed]).is_err());
  }

  #[test]
  fn builtin_emergency_replies_carry_the_instruction() {
    for entry in Taxonomy::default().tier(Tier::Emergency) {
      let reply = entry.render_response().to_lowercase();
      assert!(reply.contains(EMERGENCY_INSTRUCTION), "{}", entry.phrase);
    }
  }

  #[test]
  fn entry_deserialises_with_defaults() {
    let entry: SymptomEntry = serde_json::from_str(
      r#"{"phrase":"earache","tier":"routine","category":"ENT"}"#,
    )
    .unwrap();
    assert_eq!(entry.tier, Tier::Routine);
    assert!(!entry.escalates);
    assert!(entry.response_template.is_none());
  }
}
