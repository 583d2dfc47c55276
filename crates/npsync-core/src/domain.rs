/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Where a composed status should land for one cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Destination {
    /// The persistent message configured for the timer.
    Scheduled(MessageRef),
    /// The message that carried the `nowplay` command.
    Interactive(MessageRef),
}

impl Destination {
    pub fn message(&self) -> MessageRef {
        match self {
            Destination::Scheduled(m) | Destination::Interactive(m) => *m,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Destination::Scheduled(_) => "scheduled",
            Destination::Interactive(_) => "interactive",
        }
    }
}
