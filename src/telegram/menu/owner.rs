//! Owner panel: admin roster, channel bindings, audit tail

use itertools::Itertools;

use crate::compose::{Prompt, Session};
use crate::core::config::limits::{AUDIT_TAIL_LINES, LONG_TEXT_THRESHOLD};
use crate::core::error::AppResult;
use crate::storage::{ActorId, ChannelRef};
use crate::telegram::actions::owner;
use crate::telegram::app::{App, Ctx};
use crate::telegram::transport::{KeyButton, Keyboard};
use crate::telegram::{keyboards, texts};

pub const AUDIT_FILE_NAME: &str = "audit_tail.txt";

fn bindings_overview<'a>(channels: impl Iterator<Item = (&'a ActorId, &'a ChannelRef)>) -> String {
    let lines = channels
        .map(|(actor, channel)| format!("• <code>{}</code> → {}", actor, texts::escape(&channel.label())))
        .join("\n");
    if lines.is_empty() {
        "📡 No channels connected.".to_string()
    } else {
        format!("📡 <b>Channels</b>\n{}", lines)
    }
}

pub async fn show(app: &App, ctx: &Ctx) -> AppResult<()> {
    app.gate.require_owner(ctx.actor)?;
    app.sessions.clear(ctx.actor);
    let snapshot = app.repo.snapshot();
    let text = format!(
        "{}\n\n{}",
        texts::admins_listing(&snapshot.admins, app.gate.owner()),
        bindings_overview(snapshot.channels.iter())
    );
    let keyboard = Keyboard::new()
        .row(vec![
            KeyButton::callback("➕ Add admin", owner::ADD_ADMIN),
            KeyButton::callback("➖ Remove admin", owner::REMOVE_ADMIN),
        ])
        .row(vec![
            KeyButton::callback("👥 List", owner::LIST_ADMINS),
            KeyButton::callback("🧾 Audit log", owner::AUDIT),
        ])
        .button(keyboards::back_to_main());
    app.show(ctx, &text, Some(&keyboard)).await
}

pub async fn await_admin_id(app: &App, ctx: &Ctx, prompt: Prompt) -> AppResult<()> {
    app.gate.require_owner(ctx.actor)?;
    let text = match prompt {
        Prompt::AdminRemove => texts::PROMPT_ADMIN_REMOVE,
        _ => texts::PROMPT_ADMIN_ADD,
    };
    app.sessions.start(ctx.actor, Session::Awaiting(prompt));
    let keyboard = Keyboard::new().button(keyboards::back(owner::PANEL));
    app.show(ctx, text, Some(&keyboard)).await
}

/// Numeric id typed in answer to an add/remove prompt
pub async fn on_admin_id(app: &App, ctx: &Ctx, text: &str, add: bool) -> AppResult<()> {
    app.gate.require_owner(ctx.actor)?;
    let Ok(id) = text.trim().parse::<ActorId>() else {
        return app.say(ctx, texts::NEED_NUMERIC_ID).await;
    };

    let notice = if add {
        if app.repo.add_admin(id)? {
            app.audit.record(ctx.actor, &format!("Added admin {}", id));
            log::info!("Admin {} added by {}", id, ctx.actor);
            format!("✅ <code>{}</code> is now an admin.", id)
        } else {
            format!("ℹ️ <code>{}</code> is already an admin.", id)
        }
    } else if app.repo.remove_admin(id)? {
        app.audit.record(ctx.actor, &format!("Removed admin {}", id));
        log::info!("Admin {} removed by {}", id, ctx.actor);
        format!("✅ <code>{}</code> is no longer an admin.", id)
    } else {
        format!("ℹ️ <code>{}</code> is not an admin.", id)
    };
    app.sessions.clear(ctx.actor);
    app.say(ctx, &notice).await?;
    show(app, &ctx.fresh()).await
}

pub async fn list(app: &App, ctx: &Ctx) -> AppResult<()> {
    app.gate.require_owner(ctx.actor)?;
    app.say(ctx, &texts::admins_listing(&app.repo.admins(), app.gate.owner()))
        .await
}

pub async fn audit(app: &App, ctx: &Ctx) -> AppResult<()> {
    app.gate.require_owner(ctx.actor)?;
    let lines = app.audit.tail(AUDIT_TAIL_LINES);
    if lines.is_empty() {
        return app.say(ctx, "🧾 The audit log is empty.").await;
    }
    let body = lines.join("\n");
    if body.chars().count() > LONG_TEXT_THRESHOLD {
        return app
            .send_document(ctx, AUDIT_FILE_NAME, body.into_bytes(), "🧾 Audit log tail")
            .await;
    }
    app.say(ctx, &format!("🧾 <b>Audit log</b>\n<pre>{}</pre>", texts::escape(&body)))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_bindings_overview() {
        let empty: BTreeMap<ActorId, ChannelRef> = BTreeMap::new();
        assert_eq!(bindings_overview(empty.iter()), "📡 No channels connected.");

        let mut channels = BTreeMap::new();
        channels.insert(100_000, ChannelRef::new(-100_555, "News"));
        let text = bindings_overview(channels.iter());
        assert!(text.contains("<code>100000</code>"));
        assert!(text.contains("News"));
    }
}
