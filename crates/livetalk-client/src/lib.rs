//! # livetalk-client
//!
//! Client logic of the LiveTalk chat app: the screens' operations, the
//! unread accumulator fed by chat change notifications, profile propagation
//! into chat documents and image uploads.
//!
//! The document database is reached through [`remote::DocumentStore`]; all
//! per-session state lives in a [`context::AppContext`].

pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod propagate;
pub mod remote;
pub mod unread;
pub mod upload;

use tracing_subscriber::{fmt, EnvFilter};

pub use config::ClientConfig;
pub use context::{AppContext, Session};
pub use error::{ClientError, RemoteError};
pub use events::{ChangeKind, ChatChange, UserAlert};
pub use remote::{Document, DocumentStore, MemoryDocumentStore};

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `default_filter`.  Calling this twice is harmless.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}
