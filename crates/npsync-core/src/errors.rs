/// Core error type for the sync engine.
///
/// Adapter crates should map their specific errors into this type so a cycle
/// can be logged and skipped consistently.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("template error: {0}")]
    Template(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),

    /// The platform refuses to edit this message (e.g. a bot editing a
    /// user's message).
    #[error("message cannot be edited: {0}")]
    NotEditable(String),
}

pub type Result<T> = std::result::Result<T, Error>;
