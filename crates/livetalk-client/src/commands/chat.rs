//! Chat thread screen: rendering, sending and deleting messages.

use chrono::Utc;
use livetalk_shared::{from_document, to_document, Chat, MemberEntry, Message, ModelError, Timestamp};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::context::AppContext;
use crate::error::{ClientError, RemoteError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DeleteMode {
    /// Hide the message from the current user only.
    ForMe,
    /// Remove the message from the document.  Author only.
    ForEveryone,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadAuthor {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub avatar: Option<String>,
}

/// A message as the thread view renders it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadMessage {
    #[serde(rename = "_id")]
    pub id: String,
    pub created_at: i64,
    pub text: String,
    pub image: Option<String>,
    pub user: ThreadAuthor,
    pub sent: bool,
    pub received: bool,
}

/// Messages of `chat` visible to `viewer`, newest first.
///
/// Messages without a usable `createdAt` are stamped with the current time.
pub fn visible_messages(chat: &Chat, viewer: &str) -> Vec<ThreadMessage> {
    let now = Utc::now().timestamp_millis();
    let fallback_avatar = other_member_photo(chat, viewer);

    let mut messages: Vec<_> = chat
        .messages
        .iter()
        .filter(|m| !m.is_deleted_for(viewer))
        .map(|m| {
            let author = m.user.clone().unwrap_or_default();
            let avatar = non_empty(author.avatar.as_deref())
                .or_else(|| author.extra.get("photoURL").and_then(|v| non_empty(v.as_str())))
                .or(fallback_avatar)
                .map(str::to_string);
            let name = non_empty(author.name.as_deref())
                .or_else(|| author.extra.get("displayName").and_then(|v| non_empty(v.as_str())))
                .unwrap_or_default()
                .to_string();

            ThreadMessage {
                id: m.id.clone().unwrap_or_default(),
                created_at: m.created_millis().unwrap_or(now),
                text: m.text.clone().unwrap_or_default(),
                image: m.image.clone().filter(|i| !i.is_empty()),
                user: ThreadAuthor {
                    id: author.sender_id().unwrap_or_default().to_string(),
                    name,
                    avatar,
                },
                sent: m.sent.unwrap_or(false),
                received: m.received.unwrap_or(false),
            }
        })
        .collect();

    messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    messages
}

fn other_member_photo<'a>(chat: &'a Chat, viewer: &str) -> Option<&'a str> {
    let other = chat.users.iter().find(|u| match u {
        MemberEntry::Legacy(email) => email != viewer,
        MemberEntry::Record(m) => m.email.as_deref().is_some_and(|e| !e.is_empty() && e != viewer),
        MemberEntry::Other(_) => false,
    })?;
    match other {
        MemberEntry::Record(m) => non_empty(m.photo_url.as_deref())
            .or_else(|| m.extra.get("avatar").and_then(|v| non_empty(v.as_str()))),
        _ => None,
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

// Chat documents are edited as raw JSON so fields the models drop (explicit
// nulls, unknown keys, the admin SDK's timestamp spelling) are written back
// unchanged.
async fn load_raw_chat(ctx: &AppContext, chat_id: &str) -> Result<Value, ClientError> {
    ctx.store
        .get_chat_value(chat_id)
        .await?
        .ok_or_else(|| ClientError::ChatNotFound(chat_id.to_string()))
}

fn raw_messages(chat: &mut Value) -> Option<&mut Vec<Value>> {
    chat.get_mut("messages").and_then(Value::as_array_mut)
}

fn raw_message_id(message: &Value) -> Option<&str> {
    message.get("_id").and_then(Value::as_str)
}

/// Prepend `message` to the chat and bump `lastUpdated`.
pub async fn send_message(
    ctx: &AppContext,
    chat_id: &str,
    mut message: Message,
) -> Result<Message, ClientError> {
    let mut chat = load_raw_chat(ctx, chat_id).await?;
    let Value::Object(fields) = &mut chat else {
        return Err(RemoteError::Malformed(ModelError::NotAnObject).into());
    };

    message.sent = Some(true);
    message.received = Some(false);

    let entry = to_document(&message).map_err(RemoteError::from)?;
    match fields.get_mut("messages").and_then(Value::as_array_mut) {
        Some(messages) => messages.insert(0, entry),
        None => {
            fields.insert("messages".to_string(), Value::Array(vec![entry]));
        }
    }
    let now = to_document(&Timestamp::now_millis()).map_err(RemoteError::from)?;
    fields.insert("lastUpdated".to_string(), now);
    ctx.store.set_chat_value(chat_id, &chat).await?;

    debug!(chat = %chat_id, message = ?message.id, "message sent");
    Ok(message)
}

fn draft(ctx: &AppContext) -> Message {
    Message {
        id: Some(Uuid::new_v4().to_string()),
        created_at: Some(Timestamp::now()),
        user: Some(ctx.session().author(&ctx.config.default_avatar_url)),
        ..Message::default()
    }
}

pub async fn send_text(ctx: &AppContext, chat_id: &str, text: &str) -> Result<Message, ClientError> {
    if text.trim().is_empty() {
        return Err(ClientError::Validation("Message cannot be empty".into()));
    }

    let message = Message {
        text: Some(text.to_string()),
        ..draft(ctx)
    };
    send_message(ctx, chat_id, message).await
}

/// Upload a picked image, then send it as a message with empty text.
pub async fn send_image(
    ctx: &AppContext,
    chat_id: &str,
    bytes: Vec<u8>,
    mime: Option<&str>,
) -> Result<Message, ClientError> {
    let url = ctx.uploader.upload_chat_image(bytes, mime).await?;

    let message = Message {
        text: Some(String::new()),
        image: Some(url),
        ..draft(ctx)
    };
    send_message(ctx, chat_id, message).await
}

pub async fn delete_message(
    ctx: &AppContext,
    chat_id: &str,
    message_id: &str,
    mode: DeleteMode,
) -> Result<(), ClientError> {
    let mut chat = load_raw_chat(ctx, chat_id).await?;
    let session = ctx.session();
    let not_found = || ClientError::MessageNotFound(message_id.to_string());

    let messages = raw_messages(&mut chat).ok_or_else(not_found)?;
    let raw = messages
        .iter_mut()
        .find(|m| raw_message_id(m) == Some(message_id))
        .ok_or_else(not_found)?;

    match mode {
        DeleteMode::ForMe => {
            let Value::Object(fields) = raw else {
                return Err(not_found());
            };
            let deleted_for = fields
                .entry("deletedFor")
                .or_insert_with(|| Value::Array(Vec::new()));
            if !deleted_for.is_array() {
                *deleted_for = Value::Array(Vec::new());
            }
            if let Value::Array(emails) = deleted_for {
                if !emails.iter().any(|e| e.as_str() == Some(session.email.as_str())) {
                    emails.push(Value::String(session.email.clone()));
                }
            }
        }
        DeleteMode::ForEveryone => {
            let message: Message = from_document(raw.clone()).map_err(RemoteError::from)?;
            if !message.sender_id().is_some_and(|s| session.is_self(s)) {
                return Err(ClientError::NotAuthor);
            }
            messages.retain(|m| raw_message_id(m) != Some(message_id));
        }
    }

    ctx.store.set_chat_value(chat_id, &chat).await?;
    info!(chat = %chat_id, message = %message_id, ?mode, "message deleted");
    Ok(())
}
