//! Line-oriented chat loop over stdin/stdout.

use std::io::Write as _;

use anyhow::Context as _;
use tokio::io::{AsyncBufReadExt as _, BufReader};
use triage_api::form::parse_identity;
use triage_core::{
  conversation::Conversation,
  engine::{TriageEngine, TurnAction},
  form::{FormSink, FormSubmission},
  record::RecordSnapshot,
  responder::Responder,
};

const HELP: &str = "\
Commands:
  /record              show the patient record so far
  /history             show the conversation log
  /form <age> <name>   send the record to a doctor
  /reset               start over with an empty record
  /help                show this message
  /quit                exit";

/// One parsed input line.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
  Say(String),
  Record,
  History,
  Form { age: String, name: String },
  Reset,
  Help,
  Quit,
  Empty,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
  let line = line.trim();
  if line.is_empty() {
    return Ok(Command::Empty);
  }
  let Some(rest) = line.strip_prefix('/') else {
    return Ok(Command::Say(line.to_string()));
  };

  let (name, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
  match name {
    "record" => Ok(Command::Record),
    "history" => Ok(Command::History),
    "reset" => Ok(Command::Reset),
    "help" => Ok(Command::Help),
    "quit" | "exit" => Ok(Command::Quit),
    "form" => {
      let args = args.trim();
      let (age, name) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
      Ok(Command::Form { age: age.to_string(), name: name.trim().to_string() })
    }
    other => Err(format!("unknown command /{other}; try /help")),
  }
}

/// Human-readable rendering of a record snapshot.
pub fn render_record(snapshot: &RecordSnapshot) -> String {
  let list = |items: &[String]| {
    if items.is_empty() { "(none)".to_string() } else { items.join(", ") }
  };

  let mut out = format!(
    "Urgency:    {}\nSymptoms:   {}\nCategories: {}",
    snapshot.urgency,
    list(&snapshot.symptoms[..]),
    list(&snapshot.categories[..]),
  );
  if !snapshot.notes.is_empty() {
    out.push_str("\nNotes:");
    for note in &snapshot.notes {
      out.push_str(&format!("\n  {} {}", note.recorded_at.format("%H:%M:%S"), note.text));
    }
  }
  out
}

/// Validate the identity, attach the current record, and hand it to `forms`.
pub async fn submit_form<F: FormSink>(
  forms: &F,
  conversation: &Conversation,
  name: &str,
  age: &str,
) -> anyhow::Result<FormSubmission> {
  let patient = parse_identity(name, age)?;
  let submission = FormSubmission::new(patient, conversation.record().snapshot())?;
  forms
    .submit(&submission)
    .await
    .context("failed to submit form")?;
  Ok(submission)
}

/// Run the chat loop until `/quit` or end of input.
pub async fn run<R, F>(engine: &TriageEngine<R>, forms: &F, status: &str) -> anyhow::Result<()>
where
  R: Responder,
  F: FormSink,
{
  let mut conversation = Conversation::new();
  let mut lines = BufReader::new(tokio::io::stdin()).lines();

  println!("Medical triage assistant ({status})");
  println!("Describe your symptoms. Type /help for commands.\n");

  loop {
    print!("> ");
    std::io::stdout().flush().ok();

    let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
      break;
    };

    match parse_command(&line) {
      Err(message) => println!("{message}"),
      Ok(Command::Empty) => {}
      Ok(Command::Quit) => break,
      Ok(Command::Help) => println!("{HELP}"),
      Ok(Command::Record) => println!("{}", render_record(&conversation.record().snapshot())),
      Ok(Command::History) => {
        for turn in conversation.log().turns() {
          println!("[{}] {}: {}", turn.index, turn.role, turn.content);
        }
      }
      Ok(Command::Reset) => {
        conversation.reset();
        println!("Conversation cleared.");
      }
      Ok(Command::Form { age, name }) => {
        match submit_form(forms, &conversation, &name, &age).await {
          Ok(submission) => println!(
            "Form {} sent for {} (urgency: {}).",
            submission.submission_id, submission.patient.name, submission.record.urgency
          ),
          Err(e) => println!("{e}"),
        }
      }
      Ok(Command::Say(text)) => {
        let outcome = engine.handle_turn(&mut conversation, &text).await;
        println!("\n{}\n", outcome.reply);
        if outcome.action == TurnAction::FormRequest {
          println!("Use /form <age> <name> to send your record.\n");
        }
      }
    }
  }

  println!("Goodbye.");
  Ok(())
}
