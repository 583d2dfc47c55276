use std::sync::Arc;

use teloxide::prelude::*;

use npsync_core::domain::{ChatId, MessageId, MessageRef};

use crate::router::AppState;

pub(crate) const NOWPLAY: &str = "nowplay";

/// Split `<prefix>cmd[@bot] args` into a lowercase command name and the rest.
///
/// Both the configured prefix and `/` are accepted.
pub(crate) fn parse_command<'a>(text: &'a str, prefix: &str) -> Option<(String, &'a str)> {
    let text = text.trim();
    let body = text
        .strip_prefix(prefix)
        .filter(|_| !prefix.is_empty())
        .or_else(|| text.strip_prefix('/'))?;

    let mut parts = body.splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("").trim();

    let cmd = first.split('@').next().unwrap_or("").to_lowercase();
    if cmd.is_empty() {
        return None;
    }
    Some((cmd, rest))
}

pub(crate) async fn handle_command(
    msg: Message,
    state: Arc<AppState>,
    cmd: &str,
) -> ResponseResult<()> {
    if cmd != NOWPLAY {
        return Ok(());
    }

    let trigger = MessageRef {
        chat_id: ChatId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
    };
    tracing::info!(chat_id = trigger.chat_id.0, "nowplay requested");
    state.driver.run_interactive(trigger).await;

    Ok(())
}
