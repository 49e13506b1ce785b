//! The remote document database, seen through its client SDK.
//!
//! [`DocumentStore`] is the seam between the client logic and whatever SDK
//! talks to the managed backend.  [`MemoryDocumentStore`] keeps the
//! collections in process and is what the tests and offline runs use.

pub mod memory;

use async_trait::async_trait;
use livetalk_shared::{from_document, to_document, Chat, UserProfile};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::warn;

use crate::error::RemoteError;
use crate::events::ChatChange;

pub use memory::MemoryDocumentStore;

/// A document together with its id in the collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Document<T> {
    pub id: String,
    pub data: T,
}

/// Operations on the `chats` and `users` collections.
///
/// Implementations move raw JSON documents; the typed methods are built on
/// top.  Writes replace the whole document, so callers that edit an existing
/// document do it on the raw value to keep fields the models do not carry.
/// Nothing here is transactional: two clients doing read-modify-write on the
/// same chat can overwrite each other.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_chat_value(&self, id: &str) -> Result<Option<Value>, RemoteError>;

    /// The whole collection, unpaginated.
    async fn list_chat_values(&self) -> Result<Vec<Document<Value>>, RemoteError>;

    /// Create a chat under a store-assigned id and return the id.
    async fn add_chat_value(&self, chat: &Value) -> Result<String, RemoteError>;

    async fn set_chat_value(&self, id: &str, chat: &Value) -> Result<(), RemoteError>;

    async fn delete_chat(&self, id: &str) -> Result<(), RemoteError>;

    async fn get_user_value(&self, uid: &str) -> Result<Option<Value>, RemoteError>;

    async fn set_user_value(&self, uid: &str, profile: &Value) -> Result<(), RemoteError>;

    async fn list_user_values(&self) -> Result<Vec<Document<Value>>, RemoteError>;

    /// Change notifications for the `chats` collection, in emission order.
    fn subscribe_chats(&self) -> broadcast::Receiver<ChatChange>;

    async fn get_chat(&self, id: &str) -> Result<Option<Document<Chat>>, RemoteError> {
        let Some(value) = self.get_chat_value(id).await? else {
            return Ok(None);
        };
        Ok(Some(Document {
            id: id.to_string(),
            data: from_document(value)?,
        }))
    }

    /// Every chat that fits the model.  Documents that do not are logged and
    /// left out.
    async fn list_chats(&self) -> Result<Vec<Document<Chat>>, RemoteError> {
        Ok(typed_documents(self.list_chat_values().await?))
    }

    async fn add_chat(&self, chat: &Chat) -> Result<String, RemoteError> {
        self.add_chat_value(&to_document(chat)?).await
    }

    async fn set_chat(&self, id: &str, chat: &Chat) -> Result<(), RemoteError> {
        self.set_chat_value(id, &to_document(chat)?).await
    }

    async fn get_user(&self, uid: &str) -> Result<Option<UserProfile>, RemoteError> {
        match self.get_user_value(uid).await? {
            Some(value) => Ok(Some(from_document(value)?)),
            None => Ok(None),
        }
    }

    async fn set_user(&self, uid: &str, profile: &UserProfile) -> Result<(), RemoteError> {
        self.set_user_value(uid, &to_document(profile)?).await
    }

    /// Every user that fits the model.
    async fn list_users(&self) -> Result<Vec<Document<UserProfile>>, RemoteError> {
        Ok(typed_documents(self.list_user_values().await?))
    }
}

fn typed_documents<T: DeserializeOwned>(raw: Vec<Document<Value>>) -> Vec<Document<T>> {
    raw.into_iter()
        .filter_map(|doc| match from_document(doc.data) {
            Ok(data) => Some(Document { id: doc.id, data }),
            Err(e) => {
                warn!(id = %doc.id, error = %e, "Skipping malformed document");
                None
            }
        })
        .collect()
}
