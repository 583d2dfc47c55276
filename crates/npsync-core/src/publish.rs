//! Applies a composed status to its destination.

use std::sync::Arc;

use crate::{
    domain::{ChatId, Destination, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{EditOutcome, ParseMode},
    },
    Result,
};

pub struct PublishTarget {
    messenger: Arc<dyn MessagingPort>,
    parse_mode: ParseMode,
}

impl PublishTarget {
    pub fn new(messenger: Arc<dyn MessagingPort>, parse_mode: ParseMode) -> Self {
        Self {
            messenger,
            parse_mode,
        }
    }

    pub fn messenger(&self) -> Arc<dyn MessagingPort> {
        self.messenger.clone()
    }

    /// Issue one edit. `Unchanged` is a success; other failures propagate
    /// untouched (the next cycle is the retry).
    pub async fn publish(&self, destination: Destination, text: &str) -> Result<EditOutcome> {
        self.check_length(text)?;
        let outcome = self
            .messenger
            .edit_text(destination.message(), text, self.parse_mode)
            .await?;

        match outcome {
            EditOutcome::Applied => {
                tracing::debug!(destination = destination.label(), "status updated")
            }
            EditOutcome::Unchanged => {
                tracing::debug!(destination = destination.label(), "status unchanged")
            }
        }
        Ok(outcome)
    }

    /// Post the status as a new message in `chat_id`.
    pub async fn reply(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        self.check_length(text)?;
        self.messenger
            .send_text(chat_id, text, Some(self.parse_mode))
            .await
    }

    /// Cutting rendered markup could split an entity, so an oversized status
    /// fails the cycle instead.
    fn check_length(&self, text: &str) -> Result<()> {
        let limit = self.messenger.capabilities().max_message_len;
        let len = text.chars().count();
        if len > limit {
            return Err(Error::External(format!(
                "status is {len} characters, over the {limit} character limit"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::{collections::HashMap, sync::Mutex};

    use async_trait::async_trait;

    use crate::{
        domain::{ChatId, MessageId, MessageRef},
        errors::Error,
        messaging::types::MessagingCapabilities,
    };

    use super::*;

    /// Remembers the last text per message and reports repeats as unchanged,
    /// the way Telegram does.
    #[derive(Default)]
    pub(crate) struct FakeMessenger {
        pub(crate) current: Mutex<HashMap<MessageRef, String>>,
        pub(crate) edits: Mutex<Vec<(MessageRef, String)>>,
        pub(crate) sends: Mutex<Vec<(ChatId, String)>>,
        pub(crate) fail_with: Mutex<Option<String>>,
        /// Refuse every edit the way Telegram refuses a bot editing a user's
        /// message.
        pub(crate) not_editable: bool,
        pub(crate) max_len: Option<usize>,
    }

    #[async_trait]
    impl MessagingPort for FakeMessenger {
        fn capabilities(&self) -> MessagingCapabilities {
            MessagingCapabilities {
                supports_edit: true,
                max_message_len: self.max_len.unwrap_or(4096),
            }
        }

        async fn edit_text(
            &self,
            msg: MessageRef,
            text: &str,
            _mode: ParseMode,
        ) -> Result<EditOutcome> {
            if let Some(e) = self.fail_with.lock().unwrap().clone() {
                return Err(Error::External(e));
            }
            if self.not_editable {
                return Err(Error::NotEditable("message can't be edited".to_string()));
            }
            self.edits.lock().unwrap().push((msg, text.to_string()));
            let mut cur = self.current.lock().unwrap();
            if cur.get(&msg).map(|t| t == text).unwrap_or(false) {
                return Ok(EditOutcome::Unchanged);
            }
            cur.insert(msg, text.to_string());
            Ok(EditOutcome::Applied)
        }

        async fn send_text(
            &self,
            chat_id: ChatId,
            text: &str,
            _mode: Option<ParseMode>,
        ) -> Result<MessageRef> {
            self.sends.lock().unwrap().push((chat_id, text.to_string()));
            Ok(MessageRef {
                chat_id,
                message_id: MessageId(999),
            })
        }
    }
}
