//! Fan-out of a profile change into every chat document embedding it.
//!
//! Chats hold copies of each member's name and photo, both in the member
//! list and on every message they sent.  After a profile edit those copies
//! are rewritten in place, one whole-document write per affected chat.

use futures::future::join_all;
use livetalk_shared::{rewrite_chat_for_profile, ProfilePatch};
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::remote::DocumentStore;

/// Rewrite every chat that references `email`.  Returns the number of chats
/// written.  Chats are handled as raw documents, so nothing but the
/// rewritten fields changes.
///
/// Writes run concurrently and are not retried or rolled back.  Any failure
/// is reported as [`ClientError::ProfilePropagation`], however many writes
/// went through.
pub async fn propagate_profile(
    store: &dyn DocumentStore,
    email: &str,
    patch: &ProfilePatch,
) -> Result<usize, ClientError> {
    if patch.is_empty() {
        return Ok(0);
    }

    let chats = store.list_chat_values().await.map_err(|e| {
        warn!(error = %e, "Failed to fetch chats for profile propagation");
        ClientError::ProfilePropagation
    })?;

    let updates: Vec<_> = chats
        .iter()
        .filter_map(|doc| {
            rewrite_chat_for_profile(&doc.data, email, patch).map(|chat| (doc.id.as_str(), chat))
        })
        .collect();

    debug!(
        scanned = chats.len(),
        affected = updates.len(),
        "propagating profile change"
    );

    let results = join_all(
        updates
            .iter()
            .map(|(id, chat)| async move { (*id, store.set_chat_value(id, chat).await) }),
    )
    .await;

    let mut failed = 0usize;
    for (id, result) in &results {
        if let Err(e) = result {
            warn!(chat = %id, error = %e, "Failed to update chat with new profile");
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(ClientError::ProfilePropagation);
    }

    info!(chats = results.len(), "profile propagated");
    Ok(results.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use crate::events::ChatChange;
    use crate::remote::{Document, MemoryDocumentStore};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio::sync::broadcast;

    fn rename(name: &str) -> ProfilePatch {
        ProfilePatch {
            name: Some(name.into()),
            photo_url: None,
        }
    }

    /// Delegates to a memory store but rejects writes to one chat id.
    struct FlakyStore {
        inner: MemoryDocumentStore,
        reject: &'static str,
    }

    #[async_trait]
    impl DocumentStore for FlakyStore {
        async fn get_chat_value(&self, id: &str) -> Result<Option<Value>, RemoteError> {
            self.inner.get_chat_value(id).await
        }

        async fn list_chat_values(&self) -> Result<Vec<Document<Value>>, RemoteError> {
            self.inner.list_chat_values().await
        }

        async fn add_chat_value(&self, chat: &Value) -> Result<String, RemoteError> {
            self.inner.add_chat_value(chat).await
        }

        async fn set_chat_value(&self, id: &str, chat: &Value) -> Result<(), RemoteError> {
            if id == self.reject {
                return Err(RemoteError::PermissionDenied(
                    "missing or insufficient permissions".into(),
                ));
            }
            self.inner.set_chat_value(id, chat).await
        }

        async fn delete_chat(&self, id: &str) -> Result<(), RemoteError> {
            self.inner.delete_chat(id).await
        }

        async fn get_user_value(&self, uid: &str) -> Result<Option<Value>, RemoteError> {
            self.inner.get_user_value(uid).await
        }

        async fn set_user_value(&self, uid: &str, profile: &Value) -> Result<(), RemoteError> {
            self.inner.set_user_value(uid, profile).await
        }

        async fn list_user_values(&self) -> Result<Vec<Document<Value>>, RemoteError> {
            self.inner.list_user_values().await
        }

        fn subscribe_chats(&self) -> broadcast::Receiver<ChatChange> {
            self.inner.subscribe_chats()
        }
    }

    async fn seed(store: &MemoryDocumentStore) {
        store
            .insert_raw_chat(
                "c1",
                json!({
                    "groupName": "",
                    "users": [
                        {"email": "a@x.com", "name": "Ann"},
                        {"email": "b@x.com", "name": "Bob"}
                    ],
                    "messages": [
                        {"_id": "1", "createdAt": 1, "text": "hi", "user": {"_id": "a@x.com", "name": "Ann"}}
                    ]
                }),
            )
            .await;
        store
            .insert_raw_chat(
                "c2",
                json!({
                    "groupName": "Team",
                    "users": [{"email": "a@x.com", "name": "Ann"}, "c@x.com"],
                    "messages": []
                }),
            )
            .await;
        store
            .insert_raw_chat(
                "c3",
                json!({
                    "groupName": "",
                    "users": [{"email": "b@x.com", "name": "Bob"}, {"email": "c@x.com"}],
                    "messages": [],
                    "lastUpdated": "2024-03-05T10:00:00Z"
                }),
            )
            .await;
    }

    #[tokio::test]
    async fn test_rename_reaches_members_and_authors() {
        let store = MemoryDocumentStore::new();
        seed(&store).await;
        let untouched = store.raw_chat("c3").await.unwrap();

        let written = propagate_profile(&store, "a@x.com", &rename("Jane")).await.unwrap();
        assert_eq!(written, 2);

        let c1 = store.raw_chat("c1").await.unwrap();
        assert_eq!(c1["users"][0], json!({"email": "a@x.com", "name": "Jane"}));
        assert_eq!(c1["users"][1], json!({"email": "b@x.com", "name": "Bob"}));
        assert_eq!(c1["messages"][0]["user"]["name"], "Jane");

        let c2 = store.raw_chat("c2").await.unwrap();
        assert_eq!(c2["users"][0]["name"], "Jane");
        assert_eq!(c2["users"][1], "c@x.com");

        assert_eq!(store.raw_chat("c3").await.unwrap(), untouched);
    }

    #[tokio::test]
    async fn test_rewritten_chat_keeps_unrelated_entries_verbatim() {
        let store = MemoryDocumentStore::new();
        let before = json!({
            "groupName": "",
            "lastUpdated": {"_seconds": 9, "_nanoseconds": 0},
            "users": [
                {"email": "a@x.com", "name": "Ann", "deletedFromChat": false},
                {"email": "b@x.com", "name": "Bob", "photoURL": null}
            ],
            "messages": [
                {"_id": "1", "createdAt": {"_seconds": 5, "_nanoseconds": 0}, "text": "yo",
                 "image": null, "user": {"_id": "b@x.com", "name": "Bob", "avatar": null}},
                {"_id": "2", "createdAt": 6000, "text": "hi", "image": null,
                 "user": {"_id": "a@x.com", "name": "Ann"}}
            ]
        });
        store.insert_raw_chat("c1", before.clone()).await;

        propagate_profile(&store, "a@x.com", &rename("Jane")).await.unwrap();

        let mut expected = before;
        expected["users"][0]["name"] = json!("Jane");
        expected["messages"][1]["user"]["name"] = json!("Jane");
        assert_eq!(store.raw_chat("c1").await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_untouched_chats_are_not_written() {
        let store = MemoryDocumentStore::new();
        seed(&store).await;
        let mut rx = store.subscribe_chats();

        propagate_profile(&store, "a@x.com", &rename("Jane")).await.unwrap();

        let mut written = vec![rx.recv().await.unwrap().id, rx.recv().await.unwrap().id];
        written.sort();
        assert_eq!(written, vec!["c1", "c2"]);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_empty_patch_writes_nothing() {
        let store = MemoryDocumentStore::new();
        seed(&store).await;
        let written = propagate_profile(&store, "a@x.com", &ProfilePatch::default())
            .await
            .unwrap();
        assert_eq!(written, 0);
    }

    #[tokio::test]
    async fn test_partial_failure_is_generic_and_not_rolled_back() {
        let inner = MemoryDocumentStore::new();
        seed(&inner).await;
        let store = FlakyStore { inner, reject: "c2" };

        let err = propagate_profile(&store, "a@x.com", &rename("Jane"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::ProfilePropagation));

        // The other write still landed.
        let c1 = store.inner.raw_chat("c1").await.unwrap();
        assert_eq!(c1["users"][0]["name"], "Jane");
        let c2 = store.inner.raw_chat("c2").await.unwrap();
        assert_eq!(c2["users"][0]["name"], "Ann");
    }

    #[tokio::test]
    async fn test_foreign_malformed_chat_does_not_block_the_rest() {
        let store = MemoryDocumentStore::new();
        seed(&store).await;
        let foreign = json!({
            "users": ["b@x.com", "c@x.com"],
            "messages": [{"_id": 7, "user": {"_id": "b@x.com"}}]
        });
        store.insert_raw_chat("legacy", foreign.clone()).await;

        let written = propagate_profile(&store, "a@x.com", &rename("Jane")).await.unwrap();
        assert_eq!(written, 2);
        assert_eq!(store.raw_chat("c1").await.unwrap()["users"][0]["name"], "Jane");
        assert_eq!(store.raw_chat("legacy").await.unwrap(), foreign);
    }
}
