//! [`Transport`] over the Telegram Bot API (teloxide)

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    CallbackQueryId, FileId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId, ParseMode, Recipient,
};
use url::Url;

use super::transport::{ChatInfo, EditOutcome, KeyButton, Keyboard, Transport};
use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::storage::ActorId;

/// Production transport. Messages are sent with HTML parse mode.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

/// Converts a neutral keyboard. URL buttons whose link does not parse are
/// dropped; stored buttons are validated, so this only guards old data.
pub fn to_markup(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    let rows = keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .filter_map(|button| match button {
                    KeyButton::Callback { label, data } => Some(InlineKeyboardButton::callback(label, data)),
                    KeyButton::Url { label, url } => match Url::parse(url) {
                        Ok(url) => Some(InlineKeyboardButton::url(label, url)),
                        Err(e) => {
                            log::warn!("Skipping button '{}' with bad url {}: {}", label, url, e);
                            None
                        }
                    },
                })
                .collect::<Vec<_>>()
        })
        .filter(|row| !row.is_empty());
    InlineKeyboardMarkup::new(rows)
}

/// Telegram user id as a roster id
pub fn actor_id(user_id: UserId) -> Option<ActorId> {
    i64::try_from(user_id.0).ok()
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_text(&self, chat: i64, text: &str, keyboard: Option<&Keyboard>) -> AppResult<()> {
        let mut request = self.bot.send_message(ChatId(chat), text).parse_mode(ParseMode::Html);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(to_markup(keyboard));
        }
        request.await?;
        Ok(())
    }

    async fn send_photo(&self, chat: i64, photo: &str, caption: &str, keyboard: Option<&Keyboard>) -> AppResult<()> {
        let mut request = self
            .bot
            .send_photo(ChatId(chat), InputFile::file_id(FileId(photo.to_string())))
            .caption(caption)
            .parse_mode(ParseMode::Html);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(to_markup(keyboard));
        }
        request.await?;
        Ok(())
    }

    async fn send_document(&self, chat: i64, file_name: &str, bytes: Vec<u8>, caption: &str) -> AppResult<()> {
        self.bot
            .send_document(ChatId(chat), InputFile::memory(bytes).file_name(file_name.to_string()))
            .caption(caption)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    async fn edit_text(
        &self,
        chat: i64,
        message_id: i32,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> AppResult<EditOutcome> {
        let mut request = self
            .bot
            .edit_message_text(ChatId(chat), MessageId(message_id), text)
            .parse_mode(ParseMode::Html);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(to_markup(keyboard));
        }
        match request.await {
            Ok(_) => Ok(EditOutcome::Edited),
            Err(e) if e.to_string().contains("message is not modified") => Ok(EditOutcome::NoOpEdit),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_chat_administrators(&self, chat: i64) -> AppResult<Vec<ActorId>> {
        let members = self.bot.get_chat_administrators(ChatId(chat)).await?;
        Ok(members.iter().filter_map(|m| actor_id(m.user.id)).collect())
    }

    async fn resolve_chat_by_username(&self, username: &str) -> AppResult<ChatInfo> {
        let chat = self
            .bot
            .get_chat(Recipient::ChannelUsername(format!("@{}", username)))
            .await?;
        Ok(ChatInfo {
            id: chat.id.0,
            title: chat.title().unwrap_or(username).to_string(),
            is_channel: chat.is_channel(),
        })
    }

    async fn download_file(&self, file_id: &str) -> AppResult<Vec<u8>> {
        let file = self.bot.get_file(FileId(file_id.to_string())).await?;
        let file_url = self
            .bot
            .api_url()
            .join(&format!("file/bot{}/{}", self.bot.token(), file.path))
            .map_err(|e| AppError::Transport(format!("bad file url: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(config::network::timeout())
            .build()
            .map_err(|e| AppError::Transport(e.to_string()))?;
        let response = client
            .get(file_url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| AppError::Transport(format!("file download failed: {}", e.without_url())))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;
        log::debug!("Downloaded {} bytes for file {}", bytes.len(), file_id);
        Ok(bytes.to_vec())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>, alert: bool) -> AppResult<()> {
        let mut request = self
            .bot
            .answer_callback_query(CallbackQueryId(callback_id.to_string()))
            .show_alert(alert);
        if let Some(text) = text {
            request = request.text(text);
        }
        request.await?;
        Ok(())
    }
}
