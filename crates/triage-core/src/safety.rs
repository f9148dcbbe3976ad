//! Output filtering for free-form responder replies.
//!
//! Generated text must not read as a diagnosis or a prescription, and must
//! always point the user at a professional. Deterministic templates are
//! written to satisfy this already and never pass through here.

use std::sync::LazyLock;

use regex::Regex;

use crate::responder::ResponderError;

/// Appended to generated replies that do not already recommend a
/// professional.
pub const DISCLAIMER: &str =
  "Please consult a healthcare professional for proper diagnosis.";

/// Substituted for diagnostic or prescriptive wording.
pub const REDACTION: &str = "[medical advice redacted]";

/// Diagnostic and prescriptive phrases removed from generated text.
static ADVICE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"(?i)\b(?:you\s+have|you're\s+diagnosed|you\s+are\s+diagnosed|take\s+this\s+medicine|you\s+should\s+buy|definitely|certainly)\b",
  )
  .expect("invalid advice redaction pattern")
});

static PROFESSIONAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)consult\s+a\s+(?:healthcare|medical)\s+professional")
    .expect("invalid disclaimer pattern")
});

/// Clean a generated reply for display.
///
/// Blank output counts as a malformed response and is reported as
/// [`ResponderError::Unavailable`].
pub fn sanitize_reply(raw: &str) -> Result<String, ResponderError> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Err(ResponderError::Unavailable("empty reply".into()));
  }

  let mut reply = ADVICE_PATTERN.replace_all(trimmed, REDACTION).into_owned();
  if !PROFESSIONAL_PATTERN.is_match(&reply) {
    reply.push_str("\n\n");
    reply.push_str(DISCLAIMER);
  }
  Ok(reply)
}
