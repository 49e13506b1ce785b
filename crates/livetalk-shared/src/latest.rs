//! Selection of the most recent message of a chat.
//!
//! Messages are not stored in a reliable order, so the latest one is found by
//! a full scan over `createdAt`.

use std::cmp::Ordering;

use crate::models::Message;

/// Recency order used by [`latest_message`].
///
/// A message with a comparable timestamp is always newer than one without.
/// Equal timestamps (or two missing ones) fall back to comparing `_id`, which
/// makes the order total and the scan independent of list order.
pub fn compare_recency(a: &Message, b: &Message) -> Ordering {
    a.created_millis()
        .cmp(&b.created_millis())
        .then_with(|| a.id.as_deref().cmp(&b.id.as_deref()))
}

/// The most recent message, or `None` for an empty list.
pub fn latest_message(messages: &[Message]) -> Option<&Message> {
    messages.iter().max_by(|a, b| compare_recency(a, b))
}
