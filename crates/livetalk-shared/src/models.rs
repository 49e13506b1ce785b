//! Document shapes of the `users` and `chats` collections.
//!
//! Field names follow the stored documents exactly. Every struct keeps the
//! fields it does not know about in `extra`, so a read-modify-write cycle
//! leaves them untouched.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::latest;
use crate::timestamp::Timestamp;

pub type Extra = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// User profile
// ---------------------------------------------------------------------------

/// `users/{uid}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "photoURL", default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl UserProfile {
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().filter(|e| !e.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// `chats/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<Timestamp>,
    /// Empty for one-to-one chats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(default)]
    pub users: Vec<MemberEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_access: Option<Vec<LastAccess>>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Chat {
    pub fn is_direct(&self) -> bool {
        self.group_name.as_deref().map_or(true, str::is_empty)
    }

    pub fn has_member(&self, email: &str) -> bool {
        self.users.iter().any(|u| u.email() == Some(email))
    }

    /// Number of member entries carrying `email`.
    pub fn member_count(&self, email: &str) -> usize {
        self.users.iter().filter(|u| u.email() == Some(email)).count()
    }

    pub fn latest_message(&self) -> Option<&Message> {
        latest::latest_message(&self.messages)
    }

    pub fn last_updated_millis(&self) -> Option<i64> {
        self.last_updated.as_ref().and_then(Timestamp::to_millis)
    }

    pub fn message_mut(&mut self, id: &str) -> Option<&mut Message> {
        self.messages
            .iter_mut()
            .find(|m| m.id.as_deref() == Some(id))
    }
}

/// An entry of a chat's `users` array.
///
/// Current documents hold structured records; early ones held bare email
/// strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MemberEntry {
    Record(Member),
    Legacy(String),
    Other(serde_json::Value),
}

impl MemberEntry {
    pub fn email(&self) -> Option<&str> {
        match self {
            Self::Record(m) => m.email.as_deref(),
            Self::Legacy(email) => Some(email.as_str()),
            Self::Other(_) => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Record(m) => m.name.as_deref().filter(|n| !n.is_empty()),
            _ => None,
        }
    }

    pub fn photo_url(&self) -> Option<&str> {
        match self {
            Self::Record(m) => m.photo_url.as_deref().filter(|p| !p.is_empty()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_from_chat: Option<bool>,
    #[serde(rename = "photoURL", default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Member {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            name: Some(name.into()),
            deleted_from_chat: Some(false),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LastAccess {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Millis, or `""` for members who never opened the chat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<Timestamp>,
    #[serde(flatten)]
    pub extra: Extra,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Author>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received: Option<bool>,
    /// Emails of the viewers who deleted this message for themselves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_for: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Message {
    pub fn created_millis(&self) -> Option<i64> {
        self.created_at.as_ref().and_then(Timestamp::to_millis)
    }

    pub fn sender_id(&self) -> Option<&str> {
        self.user.as_ref().and_then(Author::sender_id)
    }

    pub fn is_deleted_for(&self, email: &str) -> bool {
        self.deleted_for
            .as_ref()
            .is_some_and(|list| list.iter().any(|e| e == email))
    }

    pub fn has_image(&self) -> bool {
        self.image.as_deref().is_some_and(|i| !i.is_empty())
    }
}

/// Denormalized copy of the author taken at send time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub legacy_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Author {
    /// First non-empty of `_id`, `id`, `email`.
    pub fn sender_id(&self) -> Option<&str> {
        [&self.id, &self.legacy_id, &self.email]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .find(|v| !v.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Raw document conversion
// ---------------------------------------------------------------------------

pub fn from_document<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, ModelError> {
    Ok(serde_json::from_value(value)?)
}

pub fn to_document<T: Serialize>(data: &T) -> Result<serde_json::Value, ModelError> {
    Ok(serde_json::to_value(data)?)
}
