use livetalk_shared::ModelError;
use livetalk_store::StoreError;
use thiserror::Error;

use crate::events::UserAlert;

/// Failures reported by a [`DocumentStore`](crate::remote::DocumentStore).
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Document store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Malformed(#[from] ModelError),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Chat not found: {0}")]
    ChatNotFound(String),

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("Only the author can delete a message for everyone")]
    NotAuthor,

    #[error("{0}")]
    Validation(String),

    #[error("Image upload is not configured")]
    UploadNotConfigured,

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Some chat documents could not be rewritten.  Deliberately carries no
    /// counts.
    #[error("Could not update your profile in every chat")]
    ProfilePropagation,

    #[error("Could not delete chats")]
    ChatDeletion,

    #[error("Local storage error: {0}")]
    Store(#[from] StoreError),
}

impl ClientError {
    /// The alert the UI shows for this error.
    pub fn alert(&self) -> UserAlert {
        match self {
            Self::Remote(RemoteError::PermissionDenied(msg)) => {
                UserAlert::blocking("Permission denied", msg.clone())
            }
            Self::Validation(msg) => UserAlert::new("Validation", msg.clone()),
            Self::UploadNotConfigured => UserAlert::new(
                "Upload not configured",
                "Please set the image upload configuration.",
            ),
            Self::Upload(_) | Self::Http(_) => UserAlert::new("Upload failed", self.to_string()),
            Self::ChatDeletion => UserAlert::new("Error", "Could not delete chats. Try again."),
            _ => UserAlert::new("Error", self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denial_blocks() {
        let err = ClientError::from(RemoteError::PermissionDenied("missing rule".into()));
        let alert = err.alert();
        assert!(alert.blocking);
        assert_eq!(alert.title, "Permission denied");
        assert_eq!(alert.message, "missing rule");
    }

    #[test]
    fn test_upload_failure_alert() {
        let alert = ClientError::Upload("bad preset".into()).alert();
        assert!(!alert.blocking);
        assert_eq!(alert.title, "Upload failed");
        assert_eq!(alert.message, "Upload failed: bad preset");
    }

    #[test]
    fn test_malformed_message_is_not_repeated() {
        let model_err = livetalk_shared::from_document::<livetalk_shared::Chat>(
            serde_json::json!({"messages": "oops"}),
        )
        .unwrap_err();
        let err = ClientError::from(RemoteError::from(model_err));
        let message = err.to_string();
        assert!(message.starts_with("Malformed document: "));
        assert_eq!(message.matches("Malformed document").count(), 1);
    }

    #[test]
    fn test_propagation_alert_is_generic() {
        let alert = ClientError::ProfilePropagation.alert();
        assert_eq!(alert.title, "Error");
        assert_eq!(alert.message, "Could not update your profile in every chat");
    }
}
