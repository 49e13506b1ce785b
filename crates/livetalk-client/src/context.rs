//! Per-session client context.
//!
//! An [`AppContext`] is owned by the top-level screen controller and lent to
//! the screen operations in [`crate::commands`].  It replaces process-wide
//! state: the unread counters, the signed-in user and the service handles all
//! live here.
//!
//! The context is `Send + Sync`: the chat listener and the screens share it
//! (behind an `Arc` or a plain borrow) and every operation takes `&AppContext`.

use std::sync::{Arc, PoisonError, RwLock};

use livetalk_shared::Author;
use livetalk_store::Database;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::remote::DocumentStore;
use crate::unread::UnreadCounter;
use crate::upload::ImageUploader;

/// The signed-in user, as reported by the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub uid: String,
    /// Stable key used inside chat documents.
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl Session {
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            display_name: None,
            photo_url: None,
        }
    }

    /// Whether an author identifier designates this user.
    pub fn is_self(&self, sender_id: &str) -> bool {
        !sender_id.is_empty() && (sender_id == self.email || sender_id == self.uid)
    }

    /// Author record stamped on outgoing messages.
    pub fn author(&self, default_avatar: &str) -> Author {
        Author {
            id: Some(self.email.clone()),
            name: Some(self.display_name.clone().unwrap_or_default()),
            avatar: Some(
                self.photo_url
                    .clone()
                    .filter(|p| !p.is_empty())
                    .unwrap_or_else(|| default_avatar.to_string()),
            ),
            ..Author::default()
        }
    }
}

/// Everything the screens of one signed-in session share.
pub struct AppContext {
    session: RwLock<Session>,
    pub store: Arc<dyn DocumentStore>,
    pub unread: UnreadCounter,
    pub uploader: ImageUploader,
    pub config: ClientConfig,
}

impl AppContext {
    /// Build a context around an already opened local database.
    pub fn new(
        config: ClientConfig,
        session: Session,
        store: Arc<dyn DocumentStore>,
        database: Database,
    ) -> Result<Self, ClientError> {
        let uploader = ImageUploader::new(&config)?;
        let unread = UnreadCounter::load(database);

        tracing::info!(
            uid = %session.uid,
            unread_total = unread.total(),
            uploads_enabled = uploader.is_configured(),
            "session context ready"
        );

        Ok(Self {
            session: RwLock::new(session),
            store,
            unread,
            uploader,
            config,
        })
    }

    /// Open the local database named by the configuration and build the
    /// context.
    pub fn open(
        config: ClientConfig,
        session: Session,
        store: Arc<dyn DocumentStore>,
    ) -> Result<Self, ClientError> {
        let database = match &config.data_dir {
            Some(dir) => Database::open_in(dir)?,
            None => Database::new()?,
        };
        Self::new(config, session, store, database)
    }

    /// Snapshot of the signed-in user.
    pub fn session(&self) -> Session {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Edit the session in place and return the updated snapshot.
    pub fn update_session(&self, edit: impl FnOnce(&mut Session)) -> Session {
        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        edit(&mut session);
        session.clone()
    }
}
