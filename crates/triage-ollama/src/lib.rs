//! Ollama-backed [`Responder`](triage_core::responder::Responder).
//!
//! Sends the recent conversation to a local or remote Ollama server's chat
//! endpoint and returns the assistant message. Failures are reported as
//! [`ResponderError`](triage_core::responder::ResponderError) values; the
//! engine decides what to do with them.

mod client;
mod prompt;

pub mod error;

pub use client::{OllamaConfig, OllamaResponder};
pub use error::{Error, Result};
pub use prompt::system_prompt;
