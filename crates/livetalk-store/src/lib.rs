//! # livetalk-store
//!
//! Device-local persistent storage for the LiveTalk client, backed by SQLite.
//!
//! The remote document database owns every chat and profile; this crate only
//! keeps what must survive a restart on the device itself. It exposes a
//! synchronous `Database` handle with a string key-value API (the shape the
//! mobile app's async storage had) and typed helpers for the unread map.

pub mod database;
pub mod kv;
pub mod migrations;
pub mod unread;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use unread::UnreadMap;
