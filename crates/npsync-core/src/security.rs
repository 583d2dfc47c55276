use crate::domain::{ChatId, MessageRef, UserId};

/// Who may trigger the `nowplay` command.
///
/// Allowed: a sender listed in `allowed_users`, or any post in the chat that
/// holds the scheduled status message (channel posts carry no sender).
pub fn is_authorized(
    user_id: Option<UserId>,
    chat_id: ChatId,
    allowed_users: &[i64],
    nowplay_target: Option<MessageRef>,
) -> bool {
    if let Some(user_id) = user_id {
        if allowed_users.contains(&user_id.0) {
            return true;
        }
    }
    nowplay_target
        .map(|t| t.chat_id == chat_id)
        .unwrap_or(false)
}
