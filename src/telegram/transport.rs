//! Outbound chat transport seam.
//!
//! The bot flows only talk to [`Transport`]; the production implementation
//! wraps a teloxide `Bot` (see `client.rs`) and tests use an in-memory
//! recorder. Keyboards are described with plain structs so nothing above
//! this module depends on teloxide types.

use std::future::Future;

use async_trait::async_trait;

use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::storage::ActorId;

/// Zero-width space appended to force a change when an edit would be a no-op
pub const ZERO_WIDTH_MARKER: char = '\u{200B}';

/// One inline button
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyButton {
    Callback { label: String, data: String },
    Url { label: String, url: String },
}

impl KeyButton {
    pub fn callback(label: impl Into<String>, data: impl Into<String>) -> Self {
        KeyButton::Callback {
            label: label.into(),
            data: data.into(),
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        KeyButton::Url {
            label: label.into(),
            url: url.into(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            KeyButton::Callback { label, .. } | KeyButton::Url { label, .. } => label,
        }
    }
}

/// Inline keyboard, row-major
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<KeyButton>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, row: Vec<KeyButton>) -> Self {
        if !row.is_empty() {
            self.rows.push(row);
        }
        self
    }

    pub fn button(self, button: KeyButton) -> Self {
        self.row(vec![button])
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every callback payload, in order
    pub fn callback_data(&self) -> Vec<&str> {
        self.rows
            .iter()
            .flatten()
            .filter_map(|b| match b {
                KeyButton::Callback { data, .. } => Some(data.as_str()),
                KeyButton::Url { .. } => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Edited,
    /// The platform refused because content and markup are unchanged
    NoOpEdit,
}

/// Result of a username lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatInfo {
    pub id: i64,
    pub title: String,
    pub is_channel: bool,
}

/// Every call is fallible and never retried automatically.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(&self, chat: i64, text: &str, keyboard: Option<&Keyboard>) -> AppResult<()>;

    async fn send_photo(&self, chat: i64, photo: &str, caption: &str, keyboard: Option<&Keyboard>) -> AppResult<()>;

    async fn send_document(&self, chat: i64, file_name: &str, bytes: Vec<u8>, caption: &str) -> AppResult<()>;

    async fn edit_text(
        &self,
        chat: i64,
        message_id: i32,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> AppResult<EditOutcome>;

    async fn get_chat_administrators(&self, chat: i64) -> AppResult<Vec<ActorId>>;

    /// `username` without the leading `@`
    async fn resolve_chat_by_username(&self, username: &str) -> AppResult<ChatInfo>;

    async fn download_file(&self, file_id: &str) -> AppResult<Vec<u8>>;

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>, alert: bool) -> AppResult<()>;
}

/// Runs a transport call under the configured timeout.
pub async fn timed<T>(fut: impl Future<Output = AppResult<T>>) -> AppResult<T> {
    let limit = config::network::timeout();
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            log::warn!("Transport call timed out after {:?}", limit);
            Err(AppError::Timeout(limit))
        }
    }
}

/// Edits a message in place, never failing the flow.
///
/// A no-op edit is retried once with a zero-width marker; any other failure
/// falls back to sending a fresh message.
pub async fn safe_edit(
    transport: &dyn Transport,
    chat: i64,
    message_id: i32,
    text: &str,
    keyboard: Option<&Keyboard>,
) -> AppResult<()> {
    match timed(transport.edit_text(chat, message_id, text, keyboard)).await {
        Ok(EditOutcome::Edited) => return Ok(()),
        Ok(EditOutcome::NoOpEdit) => {
            let marked = format!("{}{}", text, ZERO_WIDTH_MARKER);
            match timed(transport.edit_text(chat, message_id, &marked, keyboard)).await {
                Ok(_) => return Ok(()),
                Err(e) => log::debug!("Marked edit failed for {}:{}: {}", chat, message_id, e),
            }
        }
        Err(e) => log::debug!("Edit failed for {}:{}, sending a new message: {}", chat, message_id, e),
    }
    timed(transport.send_text(chat, text, keyboard)).await
}
