use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::{EditOutcome, MessagingCapabilities, ParseMode},
    Result,
};

/// Messenger port used by the publish layer.
///
/// `edit_text` must report "content unchanged" as `Ok(EditOutcome::Unchanged)`,
/// never as an error, and a message the platform will not let us edit as
/// `Error::NotEditable`.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    /// Edit a message in place with link previews disabled.
    async fn edit_text(&self, msg: MessageRef, text: &str, mode: ParseMode)
        -> Result<EditOutcome>;

    /// New message with link previews disabled; `None` sends plain text.
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        mode: Option<ParseMode>,
    ) -> Result<MessageRef>;
}
