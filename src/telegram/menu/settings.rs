//! Channel binding: connect via forward or @username, test, disconnect

use crate::compose::{Prompt, Session};
use crate::core::access::check_channel_rights;
use crate::core::error::AppResult;
use crate::storage::ChannelRef;
use crate::telegram::actions::{menu, settings};
use crate::telegram::app::{App, Ctx};
use crate::telegram::transport::{timed, KeyButton, Keyboard};
use crate::telegram::{keyboards, texts};

pub async fn show(app: &App, ctx: &Ctx, notice: Option<&str>) -> AppResult<()> {
    app.sessions.clear(ctx.actor);
    let channel = app.repo.channel_of(ctx.actor);
    let mut keyboard = Keyboard::new().button(KeyButton::callback("🔗 Connect channel", settings::CONNECT));
    if channel.is_some() {
        keyboard = keyboard.row(vec![
            KeyButton::callback("🧪 Test post", settings::TEST),
            KeyButton::callback("❌ Disconnect", settings::CLEAR),
        ]);
    }
    keyboard = keyboard.button(keyboards::back_to_main());

    let body = format!(
        "⚙️ <b>Settings</b>\nChannel: {}",
        texts::escape(&texts::channel_label(channel.as_ref()))
    );
    let text = match notice {
        Some(notice) => format!("{}\n\n{}", notice, body),
        None => body,
    };
    app.show(ctx, &text, Some(&keyboard)).await
}

pub async fn show_connect(app: &App, ctx: &Ctx) -> AppResult<()> {
    let keyboard = Keyboard::new()
        .button(KeyButton::callback("📨 Forward a post", settings::VIA_FORWARD))
        .button(KeyButton::callback("✍️ Enter @username", settings::VIA_USERNAME))
        .button(keyboards::back(menu::SETTINGS));
    app.show(ctx, "🔗 <b>Connect a channel</b>\nHow do you want to connect it?", Some(&keyboard))
        .await
}

pub async fn await_input(app: &App, ctx: &Ctx, prompt: Prompt) -> AppResult<()> {
    let text = match prompt {
        Prompt::ChannelForward => texts::PROMPT_FORWARD,
        _ => texts::PROMPT_USERNAME,
    };
    app.sessions.start(ctx.actor, Session::Awaiting(prompt));
    let keyboard = Keyboard::new().button(keyboards::back(menu::SETTINGS));
    app.show(ctx, text, Some(&keyboard)).await
}

/// A post forwarded from a chat while the actor is asked for one
pub async fn on_forward(app: &App, ctx: &Ctx, chat_id: i64, title: &str, is_channel: bool) -> AppResult<()> {
    if !is_channel {
        return app.say(ctx, texts::NOT_A_CHANNEL).await;
    }
    bind(app, ctx, ChannelRef::new(chat_id, title)).await
}

pub async fn on_username(app: &App, ctx: &Ctx, text: &str) -> AppResult<()> {
    let Some(username) = text.trim().strip_prefix('@').filter(|u| !u.is_empty()) else {
        return app.say(ctx, texts::NEED_AT).await;
    };
    let chat = timed(app.transport.resolve_chat_by_username(username)).await?;
    if !chat.is_channel {
        return app.say(ctx, texts::NOT_A_CHANNEL).await;
    }
    bind(app, ctx, ChannelRef::new(chat.id, chat.title)).await
}

/// Binds the channel once the actor is confirmed as one of its admins.
async fn bind(app: &App, ctx: &Ctx, channel: ChannelRef) -> AppResult<()> {
    let admins = timed(app.transport.get_chat_administrators(channel.id)).await?;
    let rights = check_channel_rights(ctx.actor, app.bot_id, channel.id, &admins)?;

    let label = channel.label();
    let channel_id = channel.id;
    app.repo.bind_channel(ctx.actor, channel)?;
    app.sessions.clear(ctx.actor);
    app.audit.record(ctx.actor, &format!("Bound channel {}", label));
    log::info!("Actor {} bound channel {}", ctx.actor, label);

    let mut text = format!("✅ Channel connected: {}", texts::escape(&label));
    if let Some(warning) = rights.warning(channel_id) {
        log::warn!("Bot is not an admin of channel {}", channel_id);
        text.push_str("\n\n");
        text.push_str(&warning.user_message());
    }
    show(app, &ctx.fresh(), Some(&text)).await
}

pub async fn test(app: &App, ctx: &Ctx) -> AppResult<()> {
    let channel = app
        .repo
        .channel_of(ctx.actor)
        .ok_or(crate::core::error::AppError::ChannelNotBound(ctx.actor))?;
    timed(app.transport.send_text(channel.id, texts::TEST_POST, None)).await?;
    log::info!("Test post sent to {} by {}", channel.label(), ctx.actor);
    app.say(ctx, &format!("✅ Test post sent to {}", texts::escape(&channel.label())))
        .await
}

pub async fn clear(app: &App, ctx: &Ctx) -> AppResult<()> {
    let notice = if app.repo.unbind_channel(ctx.actor)? {
        app.audit.record(ctx.actor, "Cleared channel binding");
        "✅ Channel disconnected."
    } else {
        "ℹ️ No channel was connected."
    };
    show(app, ctx, Some(notice)).await
}
