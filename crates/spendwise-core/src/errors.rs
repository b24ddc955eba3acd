/// Core error type for the bridge.
///
/// Adapter crates should map their specific errors into this type so the bot
/// service can handle failures consistently (user-facing message vs log only).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error reported by the SpendWise backend. Displayed to users verbatim.
    #[error("{message}")]
    Backend { message: String },

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
