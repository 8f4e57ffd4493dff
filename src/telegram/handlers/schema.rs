//! Dispatcher schema and handler chain builders
//!
//! Every update is normalized into an [`Inbound`] event and handed to
//! [`App::handle`](crate::telegram::app::App::handle).

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{Message, MessageOrigin};
use teloxide::utils::render::RenderMessageTextHelper;

use super::types::{HandlerDeps, HandlerError};
use crate::telegram::bot::Command;
use crate::telegram::client::actor_id;
use crate::telegram::inbound::{Inbound, InboundKind};

/// Creates the main dispatcher schema for the Telegram bot.
///
/// The same schema is used in production and can be used in integration tests.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_messages = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        .branch(command_handler(deps_commands))
        .branch(message_handler(deps_messages))
        .branch(callback_handler(deps_callback))
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.chat.is_private())
        .branch(dptree::entry().filter_command::<Command>().endpoint(
            move |msg: Message, cmd: Command| {
                let deps = deps.clone();
                async move {
                    log::info!("🎯 Received command: {:?} from chat {}", cmd, msg.chat.id);
                    let Some(actor) = msg.from.as_ref().and_then(|u| actor_id(u.id)) else {
                        return Ok(());
                    };
                    let inbound = Inbound::new(actor, msg.chat.id.0, InboundKind::Command(cmd.into()));
                    deps.app.handle(inbound).await;
                    Ok(())
                }
            },
        ))
}

fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.chat.is_private())
        .endpoint(move |msg: Message| {
            let deps = deps.clone();
            async move {
                match inbound_from_message(&msg) {
                    Some(inbound) => deps.app.handle(inbound).await,
                    None => log::debug!("Ignoring unsupported message {} in chat {}", msg.id, msg.chat.id),
                }
                Ok(())
            }
        })
}

fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            match inbound_from_callback(&q) {
                Some(inbound) => deps.app.handle(inbound).await,
                None => log::warn!("Callback query {} without a usable sender", q.id),
            }
            Ok(())
        }
    })
}

/// Normalizes a private message. Text keeps its formatting as HTML.
pub fn inbound_from_message(msg: &Message) -> Option<Inbound> {
    let actor = msg.from.as_ref().and_then(|u| actor_id(u.id))?;
    let chat = msg.chat.id.0;

    let plain = if let Some(photos) = msg.photo() {
        photos.last().map(|largest| InboundKind::Photo {
            file_id: largest.file.id.to_string(),
            caption: msg.html_caption(),
        })
    } else if let Some(document) = msg.document() {
        Some(InboundKind::Document {
            file_id: document.file.id.to_string(),
            file_name: document.file_name.clone(),
        })
    } else {
        msg.html_text().map(InboundKind::Text)
    };

    let source = msg.forward_origin().and_then(|origin| match origin {
        MessageOrigin::Channel { chat, .. } => Some((chat.id.0, chat.title().unwrap_or_default().to_string(), true)),
        MessageOrigin::Chat { sender_chat, .. } => Some((
            sender_chat.id.0,
            sender_chat.title().unwrap_or_default().to_string(),
            sender_chat.is_channel(),
        )),
        _ => None,
    });
    let kind = match source {
        Some((chat_id, title, is_channel)) => InboundKind::ForwardedFromChat {
            chat_id,
            title,
            is_channel,
            body: plain.map(Box::new),
        },
        None => plain?,
    };
    Some(Inbound::new(actor, chat, kind))
}

pub fn inbound_from_callback(q: &CallbackQuery) -> Option<Inbound> {
    let actor = actor_id(q.from.id)?;
    let chat = q.message.as_ref().map(|m| m.chat().id.0).unwrap_or(actor);
    let kind = InboundKind::Callback {
        id: q.id.to_string(),
        data: q.data.clone().unwrap_or_default(),
        message_id: q.message.as_ref().map(|m| m.id().0),
    };
    Some(Inbound::new(actor, chat, kind))
}
