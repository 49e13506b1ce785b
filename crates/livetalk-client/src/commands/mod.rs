//! Screen operations.
//!
//! Each sub-module backs one screen of the app.  Operations take the session
//! [`AppContext`](crate::context::AppContext) (or just the document store when
//! nothing else is needed) and return `Result<_, ClientError>`; the UI turns
//! errors into alerts with [`ClientError::alert`](crate::error::ClientError::alert).

pub mod chat;
pub mod chats;
pub mod profile;
pub mod users;
