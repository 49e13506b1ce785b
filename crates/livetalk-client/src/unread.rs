//! Per-chat unread counters derived from change notifications.
//!
//! The counts are a local heuristic, not a server-side figure: every
//! modified-chat notification whose latest message comes from someone else
//! adds one, so a burst of remote writes to one chat can overcount.

use std::sync::{Mutex, MutexGuard, PoisonError};

use livetalk_store::{Database, UnreadMap};
use tracing::{debug, warn};

use crate::context::Session;
use crate::events::{ChangeKind, ChatChange};

struct UnreadState {
    counts: UnreadMap,
    db: Database,
}

impl UnreadState {
    // Write failures only cost a stale badge after a restart.
    fn persist(&self) {
        if let Err(e) = self.db.save_unread(&self.counts) {
            warn!(error = %e, "Failed to persist unread counts");
        }
    }
}

/// In-memory unread map mirrored to local storage after every change.
///
/// The map and its database sit behind one lock, so the listener task and
/// the screens can share the counter through `&self`.  The lock is never
/// held across an `.await`.
pub struct UnreadCounter {
    state: Mutex<UnreadState>,
}

impl UnreadCounter {
    /// Restore the persisted map.  Unreadable state starts from empty.
    pub fn load(db: Database) -> Self {
        let counts = db.load_unread().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load unread counts, starting empty");
            UnreadMap::new()
        });
        Self {
            state: Mutex::new(UnreadState { counts, db }),
        }
    }

    // A panic mid-update leaves at worst one stale counter.
    fn state(&self) -> MutexGuard<'_, UnreadState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Feed one change notification.  Returns `true` if a counter was
    /// incremented.  Counters stop at `u32::MAX`.
    pub fn apply(&self, change: &ChatChange, session: &Session) -> bool {
        if change.kind != ChangeKind::Modified {
            return false;
        }

        let Some(latest) = change.chat.latest_message() else {
            return false;
        };
        let Some(sender) = latest.sender_id() else {
            return false;
        };
        if session.is_self(sender) {
            return false;
        }

        let mut state = self.state();
        let count = state.counts.entry(change.id.clone()).or_insert(0);
        *count = count.saturating_add(1);
        debug!(chat = %change.id, count = *count, "incoming message");

        state.persist();
        true
    }

    /// Mark a chat as read.
    pub fn reset(&self, chat_id: &str) {
        let mut state = self.state();
        state.counts.insert(chat_id.to_string(), 0);
        state.persist();
    }

    pub fn count(&self, chat_id: &str) -> u32 {
        self.state().counts.get(chat_id).copied().unwrap_or(0)
    }

    /// Sum over all chats, shown as the badge of the chat list tab.
    /// Saturates instead of wrapping.
    pub fn total(&self) -> u32 {
        self.state()
            .counts
            .values()
            .fold(0u32, |sum, n| sum.saturating_add(*n))
    }

    /// Snapshot of every counter.
    pub fn counts(&self) -> UnreadMap {
        self.state().counts.clone()
    }
}
