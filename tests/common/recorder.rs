//! In-memory transport that records every outbound call
//!
//! Can be primed with channel admin rosters, username lookups,
//! downloadable files and chats whose sends fail.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use chanpost::core::error::{AppError, AppResult};
use chanpost::storage::ActorId;
use chanpost::telegram::transport::{ChatInfo, EditOutcome, Keyboard, Transport};

/// One recorded outbound call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SendText {
        chat: i64,
        text: String,
        keyboard: Option<Keyboard>,
    },
    SendPhoto {
        chat: i64,
        photo: String,
        caption: String,
        keyboard: Option<Keyboard>,
    },
    SendDocument {
        chat: i64,
        file_name: String,
        bytes: Vec<u8>,
        caption: String,
    },
    EditText {
        chat: i64,
        message_id: i32,
        text: String,
        keyboard: Option<Keyboard>,
    },
    GetAdministrators {
        chat: i64,
    },
    Resolve {
        username: String,
    },
    Download {
        file_id: String,
    },
    AnswerCallback {
        id: String,
        text: Option<String>,
        alert: bool,
    },
}

impl Call {
    /// Text or caption of a message-producing call
    pub fn text(&self) -> Option<&str> {
        match self {
            Call::SendText { text, .. } | Call::EditText { text, .. } => Some(text),
            Call::SendPhoto { caption, .. } => Some(caption),
            _ => None,
        }
    }

    pub fn keyboard(&self) -> Option<&Keyboard> {
        match self {
            Call::SendText { keyboard, .. } | Call::SendPhoto { keyboard, .. } | Call::EditText { keyboard, .. } => {
                keyboard.as_ref()
            }
            _ => None,
        }
    }

    /// Chat the call delivered content to
    pub fn chat(&self) -> Option<i64> {
        match self {
            Call::SendText { chat, .. }
            | Call::SendPhoto { chat, .. }
            | Call::SendDocument { chat, .. }
            | Call::EditText { chat, .. } => Some(*chat),
            _ => None,
        }
    }
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    admins: HashMap<i64, Vec<ActorId>>,
    chats: HashMap<String, ChatInfo>,
    files: HashMap<String, Vec<u8>>,
    failing_chats: HashSet<i64>,
    no_op_edits: bool,
}

#[derive(Default)]
pub struct RecordingTransport {
    state: Mutex<State>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn prime_admins(&self, chat: i64, admins: &[ActorId]) {
        self.state().admins.insert(chat, admins.to_vec());
    }

    pub fn prime_chat(&self, username: &str, info: ChatInfo) {
        self.state().chats.insert(username.to_string(), info);
    }

    pub fn prime_file(&self, file_id: &str, bytes: impl Into<Vec<u8>>) {
        self.state().files.insert(file_id.to_string(), bytes.into());
    }

    /// Every send to `chat` fails with a transport error
    pub fn fail_chat(&self, chat: i64) {
        self.state().failing_chats.insert(chat);
    }

    pub fn heal_chat(&self, chat: i64) {
        self.state().failing_chats.remove(&chat);
    }

    /// Every edit reports "message is not modified"
    pub fn no_op_edits(&self, enabled: bool) {
        self.state().no_op_edits = enabled;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn clear(&self) {
        self.state().calls.clear();
    }

    /// Calls that delivered content to `chat`
    pub fn delivered_to(&self, chat: i64) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.chat() == Some(chat)).collect()
    }

    /// Text of the last message sent or edited anywhere
    pub fn last_text(&self) -> Option<String> {
        self.calls().iter().rev().find_map(|c| c.text().map(str::to_string))
    }

    /// Keyboard of the last message sent or edited that had one
    pub fn last_keyboard(&self) -> Option<Keyboard> {
        self.calls().iter().rev().find_map(|c| c.keyboard().cloned())
    }

    /// Callback data of the last keyboard whose button label contains `needle`
    pub fn button_data(&self, needle: &str) -> Option<String> {
        let keyboard = self.last_keyboard()?;
        keyboard.rows.iter().flatten().find_map(|b| match b {
            chanpost::telegram::KeyButton::Callback { label, data } if label.contains(needle) => Some(data.clone()),
            _ => None,
        })
    }

    fn record(&self, call: Call) -> AppResult<()> {
        let mut state = self.state();
        let failing = call.chat().is_some_and(|chat| state.failing_chats.contains(&chat));
        state.calls.push(call);
        if failing {
            return Err(AppError::Transport("Forbidden: bot is not a member of the channel".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(&self, chat: i64, text: &str, keyboard: Option<&Keyboard>) -> AppResult<()> {
        self.record(Call::SendText {
            chat,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        })
    }

    async fn send_photo(&self, chat: i64, photo: &str, caption: &str, keyboard: Option<&Keyboard>) -> AppResult<()> {
        self.record(Call::SendPhoto {
            chat,
            photo: photo.to_string(),
            caption: caption.to_string(),
            keyboard: keyboard.cloned(),
        })
    }

    async fn send_document(&self, chat: i64, file_name: &str, bytes: Vec<u8>, caption: &str) -> AppResult<()> {
        self.record(Call::SendDocument {
            chat,
            file_name: file_name.to_string(),
            bytes,
            caption: caption.to_string(),
        })
    }

    async fn edit_text(
        &self,
        chat: i64,
        message_id: i32,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> AppResult<EditOutcome> {
        let no_op = self.state().no_op_edits;
        self.record(Call::EditText {
            chat,
            message_id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        })?;
        Ok(if no_op { EditOutcome::NoOpEdit } else { EditOutcome::Edited })
    }

    async fn get_chat_administrators(&self, chat: i64) -> AppResult<Vec<ActorId>> {
        let mut state = self.state();
        state.calls.push(Call::GetAdministrators { chat });
        state
            .admins
            .get(&chat)
            .cloned()
            .ok_or_else(|| AppError::Transport("Bad Request: chat not found".to_string()))
    }

    async fn resolve_chat_by_username(&self, username: &str) -> AppResult<ChatInfo> {
        let mut state = self.state();
        state.calls.push(Call::Resolve {
            username: username.to_string(),
        });
        state
            .chats
            .get(username)
            .cloned()
            .ok_or_else(|| AppError::Transport("Bad Request: chat not found".to_string()))
    }

    async fn download_file(&self, file_id: &str) -> AppResult<Vec<u8>> {
        let mut state = self.state();
        state.calls.push(Call::Download {
            file_id: file_id.to_string(),
        });
        state
            .files
            .get(file_id)
            .cloned()
            .ok_or_else(|| AppError::Transport("Bad Request: invalid file_id".to_string()))
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>, alert: bool) -> AppResult<()> {
        self.state().calls.push(Call::AnswerCallback {
            id: callback_id.to_string(),
            text: text.map(str::to_string),
            alert,
        });
        Ok(())
    }
}
