use std::time::Duration;

use thiserror::Error;

use crate::storage::document::ActorId;

/// Centralized error types for the application
///
/// Every fallible operation of the store, the repository, the navigation layer
/// and the bot flows returns this enum. Variants map one-to-one onto the
/// recovery messages shown to the actor (see [`AppError::user_message`]).
///
/// # Example
///
/// ```no_run
/// use chanpost::core::error::AppError;
///
/// fn report(err: &AppError) {
///     log::warn!("{} ({})", err, err.kind());
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// A taxonomy path is absent at request time
    #[error("Not found: {0}")]
    NotFound(String),

    /// A decoded token no longer matches the current listing
    #[error("Stale index: {0}")]
    StaleIndex(String),

    /// A token that cannot be parsed (corrupt or foreign)
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// Bad user input in the middle of a flow
    #[error("Validation error: {0}")]
    Validation(String),

    /// The actor does not administer the channel they try to bind
    #[error("User {actor} is not an administrator of channel {channel}")]
    NotChannelAdmin { actor: ActorId, channel: i64 },

    /// The bot itself lacks admin rights in the channel (warning only)
    #[error("Bot is not an administrator of channel {0}")]
    NotBotAdmin(i64),

    /// Owner-exclusive operation requested by somebody else
    #[error("Operation reserved for the owner, requested by {0}")]
    OwnerOnly(ActorId),

    /// Actor is neither owner nor admin
    #[error("Access denied for {0}")]
    Unauthorized(ActorId),

    /// Dispatch requested without a bound channel
    #[error("No channel bound for {0}")]
    ChannelNotBound(ActorId),

    /// Storage write failure; the mutation was not applied
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// External send/lookup failure, surfaced verbatim
    #[error("Transport error: {0}")]
    Transport(String),

    /// External call exceeded the caller-enforced timeout
    #[error("Transport call timed out after {0:?}")]
    Timeout(Duration),

    /// Import payload rejected as a whole
    #[error("Import error: {0}")]
    Import(String),

    /// IO errors outside of the persistence path
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors outside of the persistence path
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Short static label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::StaleIndex(_) => "stale_index",
            AppError::MalformedToken(_) => "malformed_token",
            AppError::Validation(_) => "validation",
            AppError::NotChannelAdmin { .. } => "not_channel_admin",
            AppError::NotBotAdmin(_) => "not_bot_admin",
            AppError::OwnerOnly(_) => "owner_only",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::ChannelNotBound(_) => "channel_not_bound",
            AppError::Persistence(_) => "persistence",
            AppError::Transport(_) => "transport",
            AppError::Timeout(_) => "timeout",
            AppError::Import(_) => "import",
            AppError::Io(_) => "io",
            AppError::Json(_) => "json",
        }
    }

    /// Errors caused by the actor's input or state. The rest come from
    /// storage or Telegram and are logged as warnings.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            AppError::Persistence(_)
                | AppError::Transport(_)
                | AppError::Timeout(_)
                | AppError::Io(_)
                | AppError::Json(_)
        )
    }

    /// Text shown to the actor when this error ends an action.
    pub fn user_message(&self) -> String {
        match self {
            AppError::NotFound(_) => "❌ Not found, it may have been changed or removed.".to_string(),
            AppError::StaleIndex(_) | AppError::MalformedToken(_) => {
                "❌ The list has changed, please reopen it.".to_string()
            }
            AppError::Validation(msg) => format!("❌ {}", msg),
            AppError::NotChannelAdmin { .. } => {
                "⛔️ You are not an administrator of this channel, connecting it is not allowed.".to_string()
            }
            AppError::NotBotAdmin(_) => {
                "⚠️ The bot is not an administrator of the channel. Posting will fail until it gets rights.".to_string()
            }
            AppError::OwnerOnly(_) => "⛔️ Owner only.".to_string(),
            AppError::Unauthorized(_) => "⛔️ Access is restricted to admins.".to_string(),
            AppError::ChannelNotBound(_) => "⚠️ Connect your channel in ⚙️ Settings first.".to_string(),
            AppError::Persistence(_) => "❌ Could not save changes, the action was not applied.".to_string(),
            AppError::Transport(e) => format!("❌ Telegram error: {}", e),
            AppError::Timeout(_) => "❌ Telegram did not respond in time, try again.".to_string(),
            AppError::Import(e) => format!("❌ Import failed: {}", e),
            AppError::Io(e) => format!("❌ Internal error: {}", e),
            AppError::Json(e) => format!("❌ Internal error: {}", e),
        }
    }
}

impl From<teloxide::RequestError> for AppError {
    fn from(err: teloxide::RequestError) -> Self {
        AppError::Transport(err.to_string())
    }
}

impl From<teloxide::DownloadError> for AppError {
    fn from(err: teloxide::DownloadError) -> Self {
        AppError::Transport(err.to_string())
    }
}
