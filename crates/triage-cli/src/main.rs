//! `triage`: conversational symptom triage.
//!
//! # Usage
//!
//! ```text
//! triage                      # interactive chat on the terminal
//! triage --no-responder chat  # rule-based replies only
//! triage serve --port 8088    # JSON API under /api
//! ```
//!
//! Settings come from `triage.toml` (or `--config`) and `TRIAGE_*`
//! environment variables; see [`settings::AppConfig`].

mod forms;
mod repl;
mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::Router;
use clap::{Parser, Subcommand};
use forms::JsonlFormSink;
use settings::AppConfig;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use triage_api::AppState;
use triage_core::{engine::TriageEngine, taxonomy::Tier};
use triage_ollama::OllamaResponder;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "triage", version, about = "Conversational symptom triage")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "triage.toml", env = "TRIAGE_CONFIG")]
  config: PathBuf,

  /// Never call the language model; unmatched input gets a fixed reply.
  #[arg(long)]
  no_responder: bool,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Chat on the terminal (default).
  Chat,
  /// Serve the JSON API.
  Serve {
    /// Overrides `server.host`.
    #[arg(long)]
    host: Option<String>,
    /// Overrides `server.port`.
    #[arg(long)]
    port: Option<u16>,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr so they don't interleave with the chat on stdout.
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let app_config = AppConfig::load(&cli.config)?;

  let taxonomy = app_config.taxonomy()?;
  tracing::info!(
    entries = taxonomy.len(),
    emergency = taxonomy.tier(Tier::Emergency).len(),
    "taxonomy loaded"
  );

  let responder = if cli.no_responder || !app_config.responder.enabled {
    None
  } else {
    Some(
      OllamaResponder::new(app_config.ollama_config(), &taxonomy)
        .context("failed to build responder client")?,
    )
  };
  let status = responder_status(responder.as_ref()).await;

  let engine = TriageEngine::from_parts(
    Arc::new(taxonomy),
    responder,
    app_config.engine_config(),
  );
  let forms = JsonlFormSink::new(&app_config.forms.path);

  match cli.command.unwrap_or(Command::Chat) {
    Command::Chat => repl::run(&engine, &forms, &status).await,
    Command::Serve { host, port } => {
      let host = host.unwrap_or(app_config.server.host);
      let port = port.unwrap_or(app_config.server.port);
      serve(engine, forms, &format!("{host}:{port}")).await
    }
  }
}

/// Check the model once at startup and describe the result.
async fn responder_status(responder: Option<&OllamaResponder>) -> String {
  let Some(responder) = responder else {
    return "rule-based replies only".to_string();
  };
  let model = &responder.config().model;
  match responder.is_available().await {
    Ok(true) => format!("model {model} ready"),
    Ok(false) => {
      tracing::warn!(%model, "model is not installed; unmatched input will get a fixed reply");
      format!("model {model} not installed")
    }
    Err(e) => {
      tracing::warn!(error = %e, "language model unreachable");
      "language model offline".to_string()
    }
  }
}

async fn serve(
  engine: TriageEngine<OllamaResponder>,
  forms: JsonlFormSink,
  address: &str,
) -> anyhow::Result<()> {
  let state = AppState::new(engine, forms);
  let app = Router::new()
    .nest("/api", triage_api::api_router(state))
    .layer(TraceLayer::new_for_http());

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
