use crate::{errors::Error, Result};

/// Result of a successful edit request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditOutcome {
    /// The message text changed.
    Applied,
    /// The platform reported the new text equals the current one.
    Unchanged,
}

/// Rendering mode for outgoing text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Telegram legacy Markdown. Values are inserted verbatim.
    #[default]
    Markdown,
    Html,
}

impl ParseMode {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "markdown" | "md" => Ok(ParseMode::Markdown),
            "html" => Ok(ParseMode::Html),
            other => Err(Error::Config(format!(
                "unsupported parse mode `{other}` (expected markdown or html)"
            ))),
        }
    }
}

/// Capabilities / limits of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_edit: bool,
    pub max_message_len: usize,
}
