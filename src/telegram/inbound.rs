//! Transport-neutral inbound events

use crate::storage::ActorId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Start,
    Cancel,
    EchoId,
    Storage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundKind {
    Command(CommandKind),
    /// Message text with formatting rendered as HTML
    Text(String),
    Photo {
        file_id: String,
        caption: Option<String>,
    },
    Document {
        file_id: String,
        file_name: Option<String>,
    },
    /// A message forwarded from a chat (channel post forwards carry the channel)
    ForwardedFromChat {
        chat_id: i64,
        title: String,
        is_channel: bool,
        /// The forwarded message itself as a `Text` or `Photo` kind
        body: Option<Box<InboundKind>>,
    },
    Callback {
        id: String,
        data: String,
        message_id: Option<i32>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub actor: ActorId,
    pub chat: i64,
    pub kind: InboundKind,
}

impl Inbound {
    pub fn new(actor: ActorId, chat: i64, kind: InboundKind) -> Self {
        Self { actor, chat, kind }
    }

    pub fn text(actor: ActorId, text: impl Into<String>) -> Self {
        Self::new(actor, actor, InboundKind::Text(text.into()))
    }

    pub fn command(actor: ActorId, command: CommandKind) -> Self {
        Self::new(actor, actor, InboundKind::Command(command))
    }

    pub fn callback(actor: ActorId, data: impl Into<String>) -> Self {
        Self::new(
            actor,
            actor,
            InboundKind::Callback {
                id: format!("cb-{}", actor),
                data: data.into(),
                message_id: Some(1),
            },
        )
    }

    pub fn photo(actor: ActorId, file_id: impl Into<String>) -> Self {
        Self::new(
            actor,
            actor,
            InboundKind::Photo {
                file_id: file_id.into(),
                caption: None,
            },
        )
    }

    /// A forward from a channel carrying the given message
    pub fn forwarded(actor: ActorId, chat_id: i64, title: impl Into<String>, is_channel: bool, body: Option<InboundKind>) -> Self {
        Self::new(
            actor,
            actor,
            InboundKind::ForwardedFromChat {
                chat_id,
                title: title.into(),
                is_channel,
                body: body.map(Box::new),
            },
        )
    }

    /// Short label for logs
    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            InboundKind::Command(_) => "command",
            InboundKind::Text(_) => "text",
            InboundKind::Photo { .. } => "photo",
            InboundKind::Document { .. } => "document",
            InboundKind::ForwardedFromChat { .. } => "forward",
            InboundKind::Callback { .. } => "callback",
        }
    }
}
