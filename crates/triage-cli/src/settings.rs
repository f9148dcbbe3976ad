//! Runtime configuration, layered from `triage.toml` and `TRIAGE_*`
//! environment variables.
//!
//! ```toml
//! [responder]
//! model = "gemma3n"
//! timeout_secs = 20
//!
//! [server]
//! port = 8088
//!
//! [[taxonomy]]
//! phrase = "chest pain"
//! tier = "emergency"
//! category = "Cardiac"
//! ```
//!
//! Nested keys are reachable from the environment with a `__` separator,
//! e.g. `TRIAGE_RESPONDER__BASE_URL`.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use serde::Deserialize;
use triage_core::{
  classify::FormTriggers,
  engine::EngineConfig,
  taxonomy::{SymptomEntry, Taxonomy},
};
use triage_ollama::OllamaConfig;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  pub responder:     ResponderConfig,
  pub server:        ServerConfig,
  pub forms:         FormsConfig,
  /// Replaces the built-in taxonomy when non-empty.
  pub taxonomy:      Vec<SymptomEntry>,
  /// Replaces the built-in form trigger phrases when non-empty.
  pub form_triggers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResponderConfig {
  pub enabled:        bool,
  pub base_url:       String,
  pub model:          String,
  pub timeout_secs:   u64,
  pub history_window: usize,
}

impl Default for ResponderConfig {
  fn default() -> Self {
    let ollama = OllamaConfig::default();
    Self {
      enabled:        true,
      base_url:       ollama.base_url,
      model:          ollama.model,
      timeout_secs:   ollama.timeout.as_secs(),
      history_window: ollama.history_window,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host: String,
  pub port: u16,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self { host: "127.0.0.1".to_string(), port: 8088 }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FormsConfig {
  /// JSON-lines file that submitted forms are appended to.
  pub path: PathBuf,
}

impl Default for FormsConfig {
  fn default() -> Self { Self { path: PathBuf::from("forms.jsonl") } }
}

impl AppConfig {
  /// Read `path` (if it exists) and overlay `TRIAGE_*` environment variables.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("TRIAGE").separator("__"))
      .build()
      .with_context(|| format!("failed to read config file {}", path.display()))?;

    settings
      .try_deserialize()
      .context("failed to deserialise configuration")
  }

  /// The configured taxonomy, or the built-in one when none is configured.
  pub fn taxonomy(&self) -> anyhow::Result<Taxonomy> {
    if self.taxonomy.is_empty() {
      return Ok(Taxonomy::default());
    }
    Taxonomy::from_entries(self.taxonomy.iter().cloned())
      .context("invalid [[taxonomy]] configuration")
  }

  pub fn engine_config(&self) -> EngineConfig {
    let form_triggers = if self.form_triggers.is_empty() {
      FormTriggers::default()
    } else {
      FormTriggers::new(self.form_triggers.iter().cloned())
    };
    EngineConfig {
      responder_timeout: Duration::from_secs(self.responder.timeout_secs),
      form_triggers,
    }
  }

  pub fn ollama_config(&self) -> OllamaConfig {
    OllamaConfig {
      base_url:       self.responder.base_url.clone(),
      model:          self.responder.model.clone(),
      timeout:        Duration::from_secs(self.responder.timeout_secs),
      history_window: self.responder.history_window,
    }
  }
}

#[cfg(test)]
mod tests {
  use triage_core::taxonomy::Tier;

  use super::*;

  fn write_temp(contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("triage-{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(&path, contents).unwrap();
    path
  }

  #[test]
  fn missing_file_yields_defaults() {
    let path = std::env::temp_dir().join(format!("absent-{}.toml", uuid::Uuid::new_v4()));
    let config = AppConfig::load(&path).unwrap();
    assert!(config.responder.enabled);
    assert_eq!(config.responder.history_window, 6);
    assert_eq!(config.server.port, 8088);
    assert_eq!(config.taxonomy().unwrap().len(), Taxonomy::default().len());
  }

  #[test]
  fn file_overrides_sections_and_taxonomy() {
    let path = write_temp(
      r#"
        [responder]
        enabled = false
        timeout_secs = 5

        [[taxonomy]]
        phrase = "chest pain"
        tier = "emergency"
        category = "Cardiac"

        [[taxonomy]]
        phrase = "earache"
        tier = "routine"
        category = "ENT"
        escalates = true
      "#,
    );
    let config = AppConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert!(!config.responder.enabled);
    assert_eq!(config.engine_config().responder_timeout, Duration::from_secs(5));
    assert_eq!(config.ollama_config().model, "gemma3n");

    let taxonomy = config.taxonomy().unwrap();
    assert_eq!(taxonomy.len(), 2);
    let earache = taxonomy.get("earache").unwrap();
    assert_eq!(earache.tier, Tier::Routine);
    assert!(earache.escalates);
  }

  #[test]
  fn invalid_taxonomy_is_a_startup_error() {
    let path = write_temp(
      r#"
        [[taxonomy]]
        phrase = "Chest Pain"
        tier = "emergency"
        category = "Cardiac"
      "#,
    );
    let config = AppConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert!(config.taxonomy().is_err());
  }

  #[test]
  fn emergency_template_without_instruction_is_a_startup_error() {
    let path = write_temp(
      r#"
        [[taxonomy]]
        phrase = "chest pain"
        tier = "emergency"
        category = "Cardiac"
        response_template = "Noted {phrase}, let's keep chatting."
      "#,
    );
    let config = AppConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();
    let err = config.taxonomy().unwrap_err();
    assert!(format!("{err:#}").contains("emergency services"), "{err:#}");
  }

  #[test]
  fn custom_form_triggers_replace_defaults() {
    let config = AppConfig {
      form_triggers: vec!["book appointment".into()],
      ..AppConfig::default()
    };
    let triggers = config.engine_config().form_triggers;
    assert!(triggers.find("please book appointment").is_some());
    assert!(triggers.find("see a doctor").is_none());
  }
}
