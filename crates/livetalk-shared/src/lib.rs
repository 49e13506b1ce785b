//! # livetalk-shared
//!
//! Document models and the pure client logic shared by the store and client
//! crates: tolerant timestamps, latest-message selection, chat list labels,
//! and profile rewriting.

pub mod constants;
pub mod display;
pub mod latest;
pub mod models;
pub mod profile;
pub mod timestamp;

mod error;

pub use error::ModelError;
pub use latest::latest_message;
pub use models::*;
pub use profile::{rewrite_chat_for_profile, ProfilePatch};
pub use timestamp::Timestamp;
