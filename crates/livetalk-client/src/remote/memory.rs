use std::collections::BTreeMap;

use async_trait::async_trait;
use livetalk_shared::constants::{CHATS_COLLECTION, USERS_COLLECTION};
use livetalk_shared::{from_document, Chat};
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{Document, DocumentStore};
use crate::error::RemoteError;
use crate::events::{ChangeKind, ChatChange};

/// Buffered change notifications per subscriber before it starts lagging.
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// In-process document store.
///
/// Documents are held as raw JSON, the way the backend holds them, so
/// anything a model does not understand survives a round trip.
#[derive(Debug)]
pub struct MemoryDocumentStore {
    chats: RwLock<BTreeMap<String, Value>>,
    users: RwLock<BTreeMap<String, Value>>,
    changes: broadcast::Sender<ChatChange>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            chats: RwLock::new(BTreeMap::new()),
            users: RwLock::new(BTreeMap::new()),
            changes,
        }
    }

    /// Store a raw chat document as-is, without emitting a notification.
    pub async fn insert_raw_chat(&self, id: &str, value: Value) {
        self.chats.write().await.insert(id.to_string(), value);
    }

    /// Store a raw user document as-is.
    pub async fn insert_raw_user(&self, uid: &str, value: Value) {
        self.users.write().await.insert(uid.to_string(), value);
    }

    /// The raw JSON currently stored for a chat.
    pub async fn raw_chat(&self, id: &str) -> Option<Value> {
        self.chats.read().await.get(id).cloned()
    }

    /// The raw JSON currently stored for a user.
    pub async fn raw_user(&self, uid: &str) -> Option<Value> {
        self.users.read().await.get(uid).cloned()
    }

    // Subscribers get a default chat for documents the model cannot read;
    // the write itself has already happened.
    fn notify(&self, kind: ChangeKind, id: &str, value: &Value) {
        let chat = from_document::<Chat>(value.clone()).unwrap_or_else(|e| {
            warn!(id = %id, error = %e, "Change notification for malformed chat");
            Chat::default()
        });
        // No subscribers is fine.
        let _ = self.changes.send(ChatChange {
            kind,
            id: id.to_string(),
            chat,
        });
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn documents(map: &BTreeMap<String, Value>) -> Vec<Document<Value>> {
    map.iter()
        .map(|(id, value)| Document {
            id: id.clone(),
            data: value.clone(),
        })
        .collect()
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_chat_value(&self, id: &str) -> Result<Option<Value>, RemoteError> {
        Ok(self.chats.read().await.get(id).cloned())
    }

    async fn list_chat_values(&self) -> Result<Vec<Document<Value>>, RemoteError> {
        Ok(documents(&*self.chats.read().await))
    }

    async fn add_chat_value(&self, chat: &Value) -> Result<String, RemoteError> {
        let id = Uuid::new_v4().simple().to_string();
        self.chats.write().await.insert(id.clone(), chat.clone());

        debug!(collection = CHATS_COLLECTION, id = %id, "document created");
        self.notify(ChangeKind::Added, &id, chat);
        Ok(id)
    }

    async fn set_chat_value(&self, id: &str, chat: &Value) -> Result<(), RemoteError> {
        let existed = self
            .chats
            .write()
            .await
            .insert(id.to_string(), chat.clone())
            .is_some();

        let kind = if existed {
            ChangeKind::Modified
        } else {
            ChangeKind::Added
        };
        self.notify(kind, id, chat);
        Ok(())
    }

    async fn delete_chat(&self, id: &str) -> Result<(), RemoteError> {
        let removed = self.chats.write().await.remove(id);
        if let Some(value) = removed {
            debug!(collection = CHATS_COLLECTION, id = %id, "document deleted");
            self.notify(ChangeKind::Removed, id, &value);
        }
        Ok(())
    }

    async fn get_user_value(&self, uid: &str) -> Result<Option<Value>, RemoteError> {
        Ok(self.users.read().await.get(uid).cloned())
    }

    async fn set_user_value(&self, uid: &str, profile: &Value) -> Result<(), RemoteError> {
        self.users
            .write()
            .await
            .insert(uid.to_string(), profile.clone());
        debug!(collection = USERS_COLLECTION, id = %uid, "document written");
        Ok(())
    }

    async fn list_user_values(&self) -> Result<Vec<Document<Value>>, RemoteError> {
        Ok(documents(&*self.users.read().await))
    }

    fn subscribe_chats(&self) -> broadcast::Receiver<ChatChange> {
        self.changes.subscribe()
    }
}
