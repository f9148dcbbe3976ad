//! Core types and the triage engine for the symptom triage assistant.
//!
//! No HTTP here. This crate owns the symptom taxonomy, the phrase classifier,
//! the per-conversation patient record, and the engine that ties them
//! together. Free-form replies and form persistence
//! are reached only through the [`responder::Responder`] and
//! [`form::FormSink`] traits.

// Trait implementors write plain `async fn`; the traits themselves spell out
// the `Send` bound on the returned futures.
#![allow(async_fn_in_trait)]

pub mod classify;
pub mod conversation;
pub mod engine;
pub mod error;
pub mod form;
pub mod record;
pub mod registry;
pub mod responder;
pub mod safety;
pub mod taxonomy;

pub use error::{Error, Result};
