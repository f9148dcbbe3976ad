//! Registry of live conversations for transports that serve many users.
//!
//! Each conversation sits behind its own async mutex: turns within one
//! conversation run one at a time in arrival order, while different
//! conversations never contend with each other.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::{
  Error, Result,
  conversation::Conversation,
  record::RecordSnapshot,
};

pub type SharedConversation = Arc<Mutex<Conversation>>;

#[derive(Debug, Default)]
pub struct ConversationRegistry {
  conversations: RwLock<HashMap<Uuid, SharedConversation>>,
}

impl ConversationRegistry {
  pub fn new() -> Self { Self::default() }

  /// Start a new, empty conversation and return its id and initial record.
  pub async fn create(&self) -> (Uuid, RecordSnapshot) {
    let conversation = Conversation::new();
    let id = conversation.id();
    let snapshot = conversation.record().snapshot();
    self
      .conversations
      .write()
      .await
      .insert(id, Arc::new(Mutex::new(conversation)));
    tracing::info!(conversation_id = %id, "conversation started");
    (id, snapshot)
  }

  /// Look up a conversation. Lock the returned handle to use it.
  pub async fn get(&self, id: Uuid) -> Result<SharedConversation> {
    self
      .conversations
      .read()
      .await
      .get(&id)
      .cloned()
      .ok_or(Error::UnknownConversation(id))
  }

  /// Reset a conversation to an empty record and log.
  pub async fn reset(&self, id: Uuid) -> Result<RecordSnapshot> {
    let conversation = self.get(id).await?;
    let mut conversation = conversation.lock().await;
    conversation.reset();
    Ok(conversation.record().snapshot())
  }

  /// Drop a conversation entirely.
  pub async fn remove(&self, id: Uuid) -> Result<()> {
    let removed = self.conversations.write().await.remove(&id);
    if removed.is_none() {
      return Err(Error::UnknownConversation(id));
    }
    tracing::info!(conversation_id = %id, "conversation ended");
    Ok(())
  }

  pub async fn len(&self) -> usize { self.conversations.read().await.len() }

  pub async fn is_empty(&self) -> bool { self.len().await == 0 }
}
