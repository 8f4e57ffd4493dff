use chrono::{DateTime, Local};

use crate::core::error::AppResult;
use crate::telegram::app::{App, Ctx};
use crate::telegram::{keyboards, texts};

/// Shows the main menu. Returning here always ends the actor's session.
pub async fn show(app: &App, ctx: &Ctx, notice: Option<&str>) -> AppResult<()> {
    if app.sessions.clear(ctx.actor).is_some() {
        log::debug!("Session of {} cleared by main menu", ctx.actor);
    }
    let channel = app.repo.channel_of(ctx.actor);
    let keyboard = keyboards::main_menu(ctx.role, &texts::channel_label(channel.as_ref()));
    let text = match notice {
        Some(notice) => format!("{}\n\n{}", notice, texts::MAIN_MENU),
        None => texts::MAIN_MENU.to_string(),
    };
    app.show(ctx, &text, Some(&keyboard)).await
}

/// `/echo_id`
pub async fn echo_id(app: &App, ctx: &Ctx) -> AppResult<()> {
    let text = format!(
        "🆔 Chat id: <code>{}</code>\n👤 Your id: <code>{}</code>",
        ctx.chat, ctx.actor
    );
    app.say(ctx, &text).await
}

/// `/storage`: where state lives and what it holds for this actor
pub async fn storage_info(app: &App, ctx: &Ctx) -> AppResult<()> {
    let path = app.repo.store().path();
    let modified = fs_err::metadata(path)
        .and_then(|m| m.modified())
        .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| "-".to_string());
    let snapshot = app.repo.snapshot();

    let text = format!(
        "🗂 <b>Storage</b>\nPath: <code>{}</code>\nExists: {}\nModified: {}\nVersion: {}\n\nAdmins: {}\nChannel bindings: {}\nYour templates: {}",
        texts::escape(&path.display().to_string()),
        if path.exists() { "yes" } else { "no" },
        modified,
        snapshot.version,
        snapshot.admins.len(),
        snapshot.channels.len(),
        app.repo.template_count(ctx.actor)
    );
    app.say(ctx, &text).await
}
