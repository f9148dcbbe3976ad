//! Append-only JSON-lines form sink.

use std::path::PathBuf;

use tokio::{fs::OpenOptions, io::AsyncWriteExt as _, sync::Mutex};
use triage_core::form::{FormSink, FormSubmission};

/// Writes each submission as one JSON object per line.
#[derive(Debug)]
pub struct JsonlFormSink {
  path:  PathBuf,
  // Serialises appends so lines from concurrent submissions never interleave.
  write: Mutex<()>,
}

impl JsonlFormSink {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into(), write: Mutex::new(()) }
  }
}

impl FormSink for JsonlFormSink {
  type Error = std::io::Error;

  async fn submit(&self, submission: &FormSubmission) -> Result<(), Self::Error> {
    let mut line = serde_json::to_string(submission).map_err(std::io::Error::other)?;
    line.push('\n');

    let _guard = self.write.lock().await;
    let mut file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(&self.path)
      .await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await?;

    tracing::info!(
      submission_id = %submission.submission_id,
      path = %self.path.display(),
      "form appended"
    );
    Ok(())
  }
}
