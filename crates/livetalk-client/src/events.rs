use livetalk_shared::Chat;
use serde::Serialize;

/// What happened to a document in a change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// One change notification of the `chats` subscription.
#[derive(Debug, Clone)]
pub struct ChatChange {
    pub kind: ChangeKind,
    pub id: String,
    /// The document after the change (before it, for removals).
    pub chat: Chat,
}

/// A message box for the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAlert {
    pub title: String,
    pub message: String,
    /// The user must dismiss it before continuing.
    pub blocking: bool,
}

impl UserAlert {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            blocking: false,
        }
    }

    pub fn blocking(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            blocking: true,
            ..Self::new(title, message)
        }
    }
}
