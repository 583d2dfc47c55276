//! Telegram adapter (teloxide).
//!
//! Implements the `npsync-core` MessagingPort over the Bot API and hosts the
//! update dispatcher for the `nowplay` command.

use async_trait::async_trait;

use teloxide::{prelude::*, ApiError, RequestError};

pub mod handlers;
pub mod router;

use npsync_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{EditOutcome, MessagingCapabilities, ParseMode},
    },
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    #[allow(deprecated)]
    fn tg_parse_mode(mode: ParseMode) -> teloxide::types::ParseMode {
        match mode {
            ParseMode::Markdown => teloxide::types::ParseMode::Markdown,
            ParseMode::Html => teloxide::types::ParseMode::Html,
        }
    }

    fn map_err(e: RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }
}

/// Telegram answers an edit with identical content with a 400
/// "message is not modified"; that is a successful no-op for us.
fn edit_outcome<T>(res: std::result::Result<T, RequestError>) -> Result<EditOutcome> {
    match res {
        Ok(_) => Ok(EditOutcome::Applied),
        Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(EditOutcome::Unchanged),
        Err(RequestError::Api(e @ ApiError::MessageCantBeEdited)) => {
            Err(Error::NotEditable(e.to_string()))
        }
        Err(e) => Err(TelegramMessenger::map_err(e)),
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            supports_edit: true,
            max_message_len: 4096,
        }
    }

    async fn edit_text(
        &self,
        msg: MessageRef,
        text: &str,
        mode: ParseMode,
    ) -> Result<EditOutcome> {
        let res = self
            .bot
            .edit_message_text(
                Self::tg_chat(msg.chat_id),
                Self::tg_msg_id(msg.message_id),
                text.to_string(),
            )
            .parse_mode(Self::tg_parse_mode(mode))
            .disable_web_page_preview(true)
            .await;
        edit_outcome(res)
    }

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        mode: Option<ParseMode>,
    ) -> Result<MessageRef> {
        let mut req = self
            .bot
            .send_message(Self::tg_chat(chat_id), text.to_string())
            .disable_web_page_preview(true);
        if let Some(mode) = mode {
            req = req.parse_mode(Self::tg_parse_mode(mode));
        }
        let msg = req.await.map_err(Self::map_err)?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }
}
