//! Telegram update handlers.
//!
//! Only the `nowplay` command is handled; every other update is ignored.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use npsync_core::{
    domain::{ChatId, UserId},
    security::is_authorized,
};

use crate::router::AppState;

mod commands;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let Some((cmd, _args)) = commands::parse_command(text, &state.cfg.command_prefix) else {
        return Ok(());
    };

    let chat_id = ChatId(msg.chat.id.0);
    let user_id = msg.from().map(|u| UserId(u.id.0 as i64));

    if !is_authorized(
        user_id,
        chat_id,
        &state.cfg.telegram_allowed_users,
        state.cfg.nowplay_target,
    ) {
        tracing::debug!(
            chat_id = chat_id.0,
            user_id = user_id.map(|u| u.0),
            "ignoring command from unauthorized sender"
        );
        return Ok(());
    }

    commands::handle_command(msg, state, &cmd).await
}
