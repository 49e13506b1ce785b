//! Chat list screen.

use futures::future::join_all;
use livetalk_shared::display::{chat_display_name, chat_subtitle, date_label};
use livetalk_shared::Chat;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::context::AppContext;
use crate::error::ClientError;
use crate::events::{ChangeKind, ChatChange};
use crate::remote::{Document, DocumentStore};

/// One row of the chat list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRow {
    pub id: String,
    pub name: String,
    pub subtitle: String,
    pub date_label: String,
    pub unread: u32,
}

/// Chats `email` belongs to, most recently updated first.
pub async fn list_chats(
    store: &dyn DocumentStore,
    email: &str,
) -> Result<Vec<Document<Chat>>, ClientError> {
    let mut chats: Vec<_> = store
        .list_chats()
        .await?
        .into_iter()
        .filter(|doc| doc.data.has_member(email))
        .collect();

    // Chats without a usable lastUpdated sink to the bottom.
    chats.sort_by(|a, b| b.data.last_updated_millis().cmp(&a.data.last_updated_millis()));

    debug!(count = chats.len(), "chat list loaded");
    Ok(chats)
}

pub fn chat_rows(ctx: &AppContext, chats: &[Document<Chat>]) -> Vec<ChatRow> {
    let session = ctx.session();
    let (email, uid) = (&session.email, &session.uid);

    chats
        .iter()
        .map(|doc| ChatRow {
            id: doc.id.clone(),
            name: chat_display_name(&doc.data, email),
            subtitle: chat_subtitle(&doc.data, email, uid),
            date_label: date_label(doc.data.last_updated.as_ref()),
            unread: ctx.unread.count(&doc.id),
        })
        .collect()
}

/// Open a chat: its unread counter drops to zero before the document is read.
pub async fn open_chat(ctx: &AppContext, chat_id: &str) -> Result<Document<Chat>, ClientError> {
    ctx.unread.reset(chat_id);

    ctx.store
        .get_chat(chat_id)
        .await?
        .ok_or_else(|| ClientError::ChatNotFound(chat_id.to_string()))
}

/// Delete the selected chats concurrently.
pub async fn delete_chats(store: &dyn DocumentStore, ids: &[String]) -> Result<(), ClientError> {
    let results = join_all(ids.iter().map(|id| store.delete_chat(id))).await;

    let mut failed = false;
    for (id, result) in ids.iter().zip(results) {
        if let Err(e) = result {
            warn!(chat = %id, error = %e, "Failed to delete chat");
            failed = true;
        }
    }

    if failed {
        return Err(ClientError::ChatDeletion);
    }

    info!(count = ids.len(), "chats deleted");
    Ok(())
}

/// Feed one notification to the unread counter.  Chats the user is not a
/// member of are ignored.
pub fn handle_chat_change(ctx: &AppContext, change: &ChatChange) -> bool {
    let session = ctx.session();
    if change.kind == ChangeKind::Removed || !change.chat.has_member(&session.email) {
        return false;
    }
    ctx.unread.apply(change, &session)
}

/// Consume change notifications until the subscription closes.
///
/// Only borrows the context, so screens keep using it while this runs on
/// its own task.
pub async fn run_chat_listener(ctx: &AppContext, mut rx: broadcast::Receiver<ChatChange>) {
    loop {
        match rx.recv().await {
            Ok(change) => {
                handle_chat_change(ctx, &change);
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "chat listener lagged, notifications dropped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    debug!("chat listener stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support;
    use crate::remote::MemoryDocumentStore;
    use serde_json::json;
    use std::sync::Arc;

    async fn seed(store: &MemoryDocumentStore) {
        store
            .insert_raw_chat(
                "old",
                json!({
                    "lastUpdated": 1_700_000_000_000i64,
                    "groupName": "",
                    "users": [{"email": "a@x.com", "name": "Ann"}, {"email": "b@x.com", "name": "Bob Stone"}],
                    "messages": [{"_id": "1", "createdAt": 1, "text": "hello there", "user": {"_id": "b@x.com", "name": "Bob Stone"}}]
                }),
            )
            .await;
        store
            .insert_raw_chat(
                "new",
                json!({
                    "lastUpdated": {"seconds": 1_710_000_000, "nanoseconds": 0},
                    "groupName": "Team",
                    "users": ["a@x.com", "c@x.com"],
                    "messages": []
                }),
            )
            .await;
        store
            .insert_raw_chat(
                "undated",
                json!({"users": [{"email": "a@x.com"}], "messages": []}),
            )
            .await;
        store
            .insert_raw_chat(
                "foreign",
                json!({"lastUpdated": 9_999_999_999_999i64, "users": ["b@x.com", "c@x.com"]}),
            )
            .await;
    }

    #[tokio::test]
    async fn test_list_filters_and_sorts() {
        let store = MemoryDocumentStore::new();
        seed(&store).await;

        let ids: Vec<_> = list_chats(&store, "a@x.com")
            .await
            .unwrap()
            .into_iter()
            .map(|doc| doc.id)
            .collect();
        assert_eq!(ids, vec!["new", "old", "undated"]);
    }

    #[tokio::test]
    async fn test_rows() {
        let (ctx, store, _dir) = test_support::context();
        seed(&store).await;
        let change = ChatChange {
            kind: ChangeKind::Modified,
            id: "old".into(),
            chat: store.get_chat("old").await.unwrap().unwrap().data,
        };
        handle_chat_change(&ctx, &change);

        let chats = list_chats(ctx.store.as_ref(), "a@x.com").await.unwrap();
        let rows = chat_rows(&ctx, &chats);

        assert_eq!(rows[0].name, "Team");
        assert_eq!(rows[0].subtitle, "No messages yet");
        assert_eq!(rows[0].unread, 0);

        assert_eq!(rows[1].name, "Bob Stone");
        assert_eq!(rows[1].subtitle, "Bob: hello there");
        assert_eq!(rows[1].date_label, "Nov 14");
        assert_eq!(rows[1].unread, 1);

        assert_eq!(rows[2].name, "a@x.com");
        assert_eq!(rows[2].date_label, "");
    }

    #[tokio::test]
    async fn test_open_resets_and_persists() {
        let (ctx, store, dir) = test_support::context();
        seed(&store).await;
        let change = ChatChange {
            kind: ChangeKind::Modified,
            id: "old".into(),
            chat: store.get_chat("old").await.unwrap().unwrap().data,
        };
        handle_chat_change(&ctx, &change);
        handle_chat_change(&ctx, &change);
        assert_eq!(ctx.unread.count("old"), 2);

        let doc = open_chat(&ctx, "old").await.unwrap();
        assert_eq!(doc.id, "old");
        assert_eq!(ctx.unread.count("old"), 0);

        let persisted = livetalk_store::Database::open_in(dir.path())
            .unwrap()
            .load_unread()
            .unwrap();
        assert_eq!(persisted.get("old"), Some(&0));
    }

    #[tokio::test]
    async fn test_open_missing_chat() {
        let (ctx, _store, _dir) = test_support::context();
        assert!(matches!(
            open_chat(&ctx, "nope").await,
            Err(ClientError::ChatNotFound(id)) if id == "nope"
        ));
    }

    #[tokio::test]
    async fn test_changes_to_foreign_chats_are_ignored() {
        let (ctx, store, _dir) = test_support::context();
        seed(&store).await;
        let mut chat = store.get_chat("foreign").await.unwrap().unwrap().data;
        chat.messages = serde_json::from_value(json!([{"_id": "1", "user": {"_id": "b@x.com"}}])).unwrap();

        let change = ChatChange {
            kind: ChangeKind::Modified,
            id: "foreign".into(),
            chat,
        };
        assert!(!handle_chat_change(&ctx, &change));
        assert_eq!(ctx.unread.total(), 0);
    }

    #[tokio::test]
    async fn test_listener_counts_until_closed() {
        let (ctx, _store, _dir) = test_support::context();
        let store = Arc::new(MemoryDocumentStore::new());
        let rx = store.subscribe_chats();

        let chat: Chat = serde_json::from_value(json!({
            "users": ["a@x.com", "b@x.com"],
            "messages": [{"_id": "1", "createdAt": 1, "user": {"_id": "b@x.com"}}]
        }))
        .unwrap();
        store.set_chat("c1", &chat).await.unwrap();
        store.set_chat("c1", &chat).await.unwrap();
        store.set_chat("c1", &chat).await.unwrap();
        drop(store);

        run_chat_listener(&ctx, rx).await;
        // The first write is an addition.
        assert_eq!(ctx.unread.count("c1"), 2);
    }

    #[tokio::test]
    async fn test_delete_chats() {
        let store = MemoryDocumentStore::new();
        seed(&store).await;

        delete_chats(&store, &["old".to_string(), "new".to_string()])
            .await
            .unwrap();
        let left = list_chats(&store, "a@x.com").await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, "undated");
    }

    #[tokio::test]
    async fn test_malformed_foreign_chat_keeps_the_list() {
        let store = MemoryDocumentStore::new();
        seed(&store).await;
        store
            .insert_raw_chat(
                "legacy",
                json!({"users": ["b@x.com"], "messages": [{"_id": 7, "createdAt": "soon"}]}),
            )
            .await;

        let ids: Vec<_> = list_chats(&store, "a@x.com")
            .await
            .unwrap()
            .into_iter()
            .map(|doc| doc.id)
            .collect();
        assert_eq!(ids, vec!["new", "old", "undated"]);
    }

    #[tokio::test]
    async fn test_screens_run_while_listener_is_active() {
        let (ctx, store, _dir) = test_support::context();
        seed(&store).await;
        let ctx = Arc::new(ctx);

        let listener = tokio::spawn({
            let ctx = ctx.clone();
            let rx = store.subscribe_chats();
            async move { run_chat_listener(&ctx, rx).await }
        });

        let mut chat = store.get_chat("old").await.unwrap().unwrap().data;
        chat.messages = serde_json::from_value(json!([
            {"_id": "2", "createdAt": 2, "text": "again", "user": {"_id": "b@x.com"}}
        ]))
        .unwrap();

        store.set_chat("old", &chat).await.unwrap();
        store.set_chat("old", &chat).await.unwrap();
        while ctx.unread.count("old") < 2 {
            tokio::task::yield_now().await;
        }

        // The screen reads and resets while the listener keeps its borrow.
        open_chat(&ctx, "old").await.unwrap();
        assert_eq!(ctx.unread.count("old"), 0);

        store.set_chat("old", &chat).await.unwrap();
        while ctx.unread.count("old") < 1 {
            tokio::task::yield_now().await;
        }
        let rows = chat_rows(&ctx, &list_chats(ctx.store.as_ref(), "a@x.com").await.unwrap());
        assert_eq!(rows.iter().find(|r| r.id == "old").unwrap().unread, 1);

        listener.abort();
    }
}
