//! Labels shown on the chat list.

use crate::constants::{IMAGE_PREVIEW, PREVIEW_MAX_CHARS};
use crate::models::{Chat, Message};
use crate::timestamp::Timestamp;

/// Title of a chat row: the group name, or the other member of a direct chat.
pub fn chat_display_name(chat: &Chat, self_email: &str) -> String {
    if let Some(group) = chat.group_name.as_deref().filter(|g| !g.is_empty()) {
        return group.to_string();
    }

    let other = chat
        .users
        .iter()
        .find(|u| u.email().is_some_and(|e| e != self_email))
        .or_else(|| {
            // A lone entry is shown even if it is our own.
            if chat.users.len() < 2 {
                chat.users.first()
            } else {
                None
            }
        });

    other
        .and_then(|u| u.name().or(u.email()).filter(|s| !s.is_empty()))
        .unwrap_or("Unnamed")
        .to_string()
}

/// `"{who}: {text}"` preview of a message.
///
/// `who` is `"You"` when the sender is the local user (by email or uid),
/// otherwise the sender's first name.
pub fn message_preview(message: &Message, self_email: &str, self_uid: &str) -> String {
    let sender = message.sender_id().unwrap_or_default();
    let is_self = !sender.is_empty() && (sender == self_email || sender == self_uid);

    let who = if is_self {
        "You".to_string()
    } else {
        message
            .user
            .as_ref()
            .and_then(|u| u.name.as_deref())
            .and_then(|n| n.split(' ').next())
            .filter(|n| !n.is_empty())
            .unwrap_or("User")
            .to_string()
    };

    let text = if message.has_image() {
        IMAGE_PREVIEW.to_string()
    } else {
        truncate(message.text.as_deref().unwrap_or_default(), PREVIEW_MAX_CHARS)
    };

    format!("{who}: {text}")
}

/// Subtitle of a chat row built from its latest message.
pub fn chat_subtitle(chat: &Chat, self_email: &str, self_uid: &str) -> String {
    match chat.latest_message() {
        Some(message) => message_preview(message, self_email, self_uid),
        None => "No messages yet".to_string(),
    }
}

/// Short date such as `"Mar 5"`, or an empty string when the value is unusable.
pub fn date_label(ts: Option<&Timestamp>) -> String {
    ts.and_then(Timestamp::to_datetime)
        .filter(|dt| dt.timestamp_millis() != 0)
        .map(|dt| dt.format("%b %-d").to_string())
        .unwrap_or_default()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}
