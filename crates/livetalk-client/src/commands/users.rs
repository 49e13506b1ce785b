//! User directory and direct chat creation.

use livetalk_shared::{Chat, LastAccess, Member, MemberEntry, Timestamp, UserProfile};
use tracing::info;

use crate::context::{AppContext, Session};
use crate::error::ClientError;
use crate::remote::{Document, DocumentStore};

/// Every registered user, sorted by name.  Users without a name come first.
pub async fn list_users(
    store: &dyn DocumentStore,
) -> Result<Vec<Document<UserProfile>>, ClientError> {
    let mut users = store.list_users().await?;
    users.sort_by(|a, b| a.data.name.cmp(&b.data.name));
    Ok(users)
}

pub fn directory_label(profile: &UserProfile, session: &Session) -> String {
    let Some(email) = profile.email() else {
        return "~ No Name or Email ~".to_string();
    };
    let name = profile
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
        .unwrap_or(email);

    if email == session.email {
        format!("{name} (You)")
    } else {
        name.to_string()
    }
}

pub fn directory_subtitle(profile: &UserProfile, session: &Session) -> &'static str {
    if profile.email() == Some(session.email.as_str()) {
        "Message yourself"
    } else {
        "User status"
    }
}

/// Find the direct chat with `target`, creating it if there is none.
/// Returns the chat id.
///
/// A chat with oneself is a direct chat listing the same email twice.
/// Chat documents that do not fit the model are not considered.
pub async fn open_direct_chat(ctx: &AppContext, target: &UserProfile) -> Result<String, ClientError> {
    let target_email = target
        .email()
        .ok_or_else(|| ClientError::Validation("This user has no email address".into()))?;
    let session = ctx.session();
    let self_email = session.email.as_str();

    let existing = ctx.store.list_chats().await?.into_iter().find(|doc| {
        let chat = &doc.data;
        if !chat.is_direct() {
            return false;
        }
        if target_email == self_email {
            chat.member_count(self_email) >= 2
        } else {
            chat.has_member(self_email) && chat.has_member(target_email)
        }
    });

    if let Some(doc) = existing {
        return Ok(doc.id);
    }

    let now = Timestamp::now_millis();
    let chat = Chat {
        last_updated: Some(now.clone()),
        group_name: Some(String::new()),
        users: vec![
            MemberEntry::Record(Member::new(
                self_email,
                session.display_name.clone().unwrap_or_default(),
            )),
            MemberEntry::Record(Member::new(
                target_email,
                target.name.clone().unwrap_or_default(),
            )),
        ],
        last_access: Some(vec![
            LastAccess {
                email: Some(self_email.to_string()),
                date: Some(now),
                ..LastAccess::default()
            },
            LastAccess {
                email: Some(target_email.to_string()),
                date: Some(Timestamp::Text(String::new())),
                ..LastAccess::default()
            },
        ]),
        messages: Vec::new(),
        ..Chat::default()
    };

    let id = ctx.store.add_chat(&chat).await?;
    info!(chat = %id, with = %target_email, "direct chat created");
    Ok(id)
}
