//! Rewriting of the denormalized profile copies embedded in chat documents.
//!
//! The rewrite works on the raw document: only the `name` / `photoURL` /
//! `avatar` fields of matching entries are touched, everything else is
//! written back exactly as it was read.

use serde_json::{Map, Value};

/// New profile values. `None` keeps whatever the document already holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub photo_url: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.photo_url.is_none()
    }

    fn apply(&self, entry: &mut Map<String, Value>, photo_key: &str) {
        if let Some(name) = &self.name {
            entry.insert("name".to_string(), Value::String(name.clone()));
        }
        if let Some(photo) = &self.photo_url {
            entry.insert(photo_key.to_string(), Value::String(photo.clone()));
        }
    }
}

/// Apply `patch` to every member record and message author of the raw chat
/// document `chat` that belongs to `email`.
///
/// Returns the rewritten document, or `None` when nothing in it belongs to
/// `email`. Legacy string members carry no name and are left as they are;
/// `users` or `messages` that are not arrays are skipped. Matching is by
/// email only, so duplicated member records are all rewritten.
pub fn rewrite_chat_for_profile(chat: &Value, email: &str, patch: &ProfilePatch) -> Option<Value> {
    if email.is_empty() {
        return None;
    }

    let mut updated = chat.clone();
    let mut modified = false;

    if let Some(users) = updated.get_mut("users").and_then(Value::as_array_mut) {
        for member in users.iter_mut().filter_map(Value::as_object_mut) {
            if member.get("email").and_then(Value::as_str) == Some(email) {
                patch.apply(member, "photoURL");
                modified = true;
            }
        }
    }

    if let Some(messages) = updated.get_mut("messages").and_then(Value::as_array_mut) {
        for message in messages.iter_mut() {
            let Some(author) = message.get_mut("user").and_then(Value::as_object_mut) else {
                continue;
            };
            if sender_id(author) == Some(email) {
                patch.apply(author, "avatar");
                modified = true;
            }
        }
    }

    modified.then_some(updated)
}

/// First non-empty of `_id`, `id`, `email`.
fn sender_id(author: &Map<String, Value>) -> Option<&str> {
    ["_id", "id", "email"]
        .into_iter()
        .filter_map(|key| author.get(key).and_then(Value::as_str))
        .find(|v| !v.is_empty())
}
