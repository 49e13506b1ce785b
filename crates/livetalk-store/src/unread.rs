//! Persistence of the per-chat unread counters.
//!
//! The whole map is stored as one JSON object under
//! [`NEW_MESSAGES_KEY`], keyed by chat id.

use std::collections::BTreeMap;

use livetalk_shared::constants::NEW_MESSAGES_KEY;

use crate::database::Database;
use crate::error::Result;

/// Chat id to number of unseen messages.
pub type UnreadMap = BTreeMap<String, u32>;

impl Database {
    /// Load the persisted unread map.  A missing entry is an empty map.
    pub fn load_unread(&self) -> Result<UnreadMap> {
        Ok(self.get_json(NEW_MESSAGES_KEY)?.unwrap_or_default())
    }

    /// Replace the persisted unread map with `map`.
    pub fn save_unread(&self, map: &UnreadMap) -> Result<()> {
        self.set_json(NEW_MESSAGES_KEY, map)
    }
}
