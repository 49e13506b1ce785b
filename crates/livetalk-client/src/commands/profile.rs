//! Profile screen: display name and photo.
//!
//! Both edits update the session, then the `users/{uid}` document, then the
//! copies embedded in chat documents (see [`crate::propagate`]).

use livetalk_shared::{to_document, ProfilePatch, UserProfile};
use serde_json::Value;
use tracing::info;

use crate::context::{AppContext, Session};
use crate::error::{ClientError, RemoteError};
use crate::propagate::propagate_profile;

/// Rename the signed-in user everywhere.
pub async fn save_display_name(ctx: &AppContext, name: &str) -> Result<(), ClientError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ClientError::Validation("Name cannot be empty".into()));
    }

    let session = ctx.update_session(|s| s.display_name = Some(name.to_string()));
    upsert_user(ctx, &session, "name", name).await?;

    let patch = ProfilePatch {
        name: Some(name.to_string()),
        photo_url: session.photo_url.clone(),
    };
    let chats = propagate_profile(ctx.store.as_ref(), &session.email, &patch).await?;

    info!(uid = %session.uid, chats, "display name changed");
    Ok(())
}

/// Upload a new profile photo and show it everywhere.  Returns its URL.
pub async fn change_photo(ctx: &AppContext, bytes: &[u8]) -> Result<String, ClientError> {
    let url = ctx.uploader.upload_profile_photo(bytes).await?;

    let session = ctx.update_session(|s| s.photo_url = Some(url.clone()));
    upsert_user(ctx, &session, "photoURL", &url).await?;

    let patch = ProfilePatch {
        name: None,
        photo_url: Some(url.clone()),
    };
    let chats = propagate_profile(ctx.store.as_ref(), &session.email, &patch).await?;

    info!(uid = %session.uid, chats, "profile photo changed");
    Ok(url)
}

/// Set one field of `users/{uid}`, leaving the rest of an existing document
/// as stored.  A missing document is created from the session.
async fn upsert_user(
    ctx: &AppContext,
    session: &Session,
    field: &str,
    value: &str,
) -> Result<(), ClientError> {
    let document = match ctx.store.get_user_value(&session.uid).await? {
        Some(Value::Object(mut existing)) => {
            existing.insert(field.to_string(), Value::String(value.to_string()));
            Value::Object(existing)
        }
        _ => to_document(&own_profile(session)).map_err(RemoteError::from)?,
    };
    ctx.store.set_user_value(&session.uid, &document).await?;
    Ok(())
}

fn own_profile(session: &Session) -> UserProfile {
    UserProfile {
        uid: session.uid.clone(),
        name: session.display_name.clone(),
        email: Some(session.email.clone()),
        photo_url: session.photo_url.clone(),
        ..UserProfile::default()
    }
}

/// Avatar placeholder: first letter of each name word, else of the email.
pub fn initials(session: &Session) -> String {
    let from_name: String = session
        .display_name
        .as_deref()
        .unwrap_or_default()
        .split(' ')
        .filter_map(|word| word.chars().next())
        .collect();

    if !from_name.is_empty() {
        return from_name;
    }

    session
        .email
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default()
}
