//! Ready posts: categories → subcategories → names → template

use crate::core::config::limits::BUTTON_LABEL_MAX_CHARS;
use crate::core::error::{AppError, AppResult};
use crate::navigation::{Address, Navigator, Resolved};
use crate::storage::TemplatePath;
use crate::telegram::actions::{browse, Action, BrowseOp};
use crate::telegram::app::{App, Ctx};
use crate::telegram::transport::{KeyButton, Keyboard};
use crate::telegram::{keyboards, texts};

fn item_button(label: &str, data: String) -> KeyButton {
    KeyButton::callback(truncate(label), data)
}

fn truncate(label: &str) -> String {
    texts::truncate_label(label, BUTTON_LABEL_MAX_CHARS)
}

fn with_notice(notice: Option<&str>, body: String) -> String {
    match notice {
        Some(notice) => format!("{}\n\n{}", notice, body),
        None => body,
    }
}

pub async fn show_categories(app: &App, ctx: &Ctx, notice: Option<&str>) -> AppResult<()> {
    let nav = Navigator::new(&app.repo, ctx.actor);
    let categories = app.repo.list_categories(ctx.actor);
    if categories.is_empty() {
        let keyboard = Keyboard::new().button(keyboards::back_to_main());
        return app
            .show(ctx, &with_notice(notice, texts::NO_TEMPLATES.to_string()), Some(&keyboard))
            .await;
    }

    let keyboard = categories
        .iter()
        .enumerate()
        .fold(Keyboard::new(), |kb, (g, category)| {
            kb.button(item_button(category, nav.issue(browse::CATEGORY, &[g])))
        })
        .button(keyboards::back_to_main());
    let body = "📚 <b>Ready posts</b>\nChoose a category:".to_string();
    app.show(ctx, &with_notice(notice, body), Some(&keyboard)).await
}

/// Opens the node a browse token points at. A stale or foreign token
/// re-renders the category list instead.
pub async fn open(app: &App, ctx: &Ctx, op: BrowseOp, address: &Address) -> AppResult<()> {
    let nav = Navigator::new(&app.repo, ctx.actor);
    let resolved = match nav.resolve(address) {
        Ok(resolved) => resolved,
        Err(e @ AppError::StaleIndex(_)) => {
            log::info!("Stale browse token from {}: {}", ctx.actor, e);
            return show_categories(app, ctx, Some(&e.user_message())).await;
        }
        Err(e @ AppError::MalformedToken(_)) => {
            log::warn!("Malformed browse token from {}: {}", ctx.actor, e);
            return show_categories(app, ctx, Some(&e.user_message())).await;
        }
        Err(e) => return Err(e),
    };
    let positions: Vec<usize> = address.positions.iter().map(|p| *p as usize).collect();

    match (op, resolved) {
        (BrowseOp::Category, Resolved::Category { category }) => {
            show_subcategories(app, ctx, &nav, &category, &positions).await
        }
        (BrowseOp::Subcategory, Resolved::Subcategory { category, subcategory }) => {
            show_names(app, ctx, &nav, &category, &subcategory, &positions).await
        }
        (BrowseOp::View, Resolved::Template(path)) => view(app, ctx, &nav, &path, &positions).await,
        (BrowseOp::Preview, Resolved::Template(path)) => {
            let entry = app.repo.get(ctx.actor, &path.category, &path.subcategory, &path.name)?;
            app.send_entry(ctx.chat, &entry).await
        }
        (BrowseOp::Send, Resolved::Template(path)) => send(app, ctx, &path).await,
        (op, resolved) => Err(AppError::MalformedToken(format!("{:?} does not apply to {:?}", op, resolved))),
    }
}

async fn show_subcategories(
    app: &App,
    ctx: &Ctx,
    nav: &Navigator<'_>,
    category: &str,
    positions: &[usize],
) -> AppResult<()> {
    let g = positions[0];
    let keyboard = app
        .repo
        .list_subcategories(ctx.actor, category)
        .iter()
        .enumerate()
        .fold(Keyboard::new(), |kb, (c, subcategory)| {
            kb.button(item_button(subcategory, nav.issue(browse::SUBCATEGORY, &[g, c])))
        })
        .button(keyboards::back(browse::ROOT));
    let text = format!("📂 <b>{}</b>\nChoose a subcategory:", texts::escape(category));
    app.show(ctx, &text, Some(&keyboard)).await
}

async fn show_names(
    app: &App,
    ctx: &Ctx,
    nav: &Navigator<'_>,
    category: &str,
    subcategory: &str,
    positions: &[usize],
) -> AppResult<()> {
    let (g, c) = (positions[0], positions[1]);
    let keyboard = app
        .repo
        .list_names(ctx.actor, category, subcategory)
        .iter()
        .enumerate()
        .fold(Keyboard::new(), |kb, (n, name)| {
            kb.button(item_button(name, nav.issue(browse::VIEW, &[g, c, n])))
        })
        .button(keyboards::back(nav.issue(browse::CATEGORY, &[g])));
    let text = format!(
        "📁 <b>{} / {}</b>\nChoose a template:",
        texts::escape(category),
        texts::escape(subcategory)
    );
    app.show(ctx, &text, Some(&keyboard)).await
}

async fn view(app: &App, ctx: &Ctx, nav: &Navigator<'_>, path: &TemplatePath, positions: &[usize]) -> AppResult<()> {
    let entry = app.repo.get(ctx.actor, &path.category, &path.subcategory, &path.name)?;
    let keyboard = Keyboard::new()
        .row(vec![
            KeyButton::callback("👁 Preview", nav.issue(Action::browse_prefix(BrowseOp::Preview), positions)),
            KeyButton::callback("📤 Send to channel", nav.issue(Action::browse_prefix(BrowseOp::Send), positions)),
        ])
        .button(keyboards::back(nav.issue(browse::SUBCATEGORY, &positions[..2])));
    let text = format!(
        "📄 <b>{}</b>\nPhoto: {}\nButtons: {}\n\n{}",
        texts::escape(&path.to_string()),
        if entry.photo.is_some() { "yes" } else { "no" },
        entry.button_count(),
        entry.text
    );
    app.show(ctx, &text, Some(&keyboard)).await
}

async fn send(app: &App, ctx: &Ctx, path: &TemplatePath) -> AppResult<()> {
    let entry = app.repo.get(ctx.actor, &path.category, &path.subcategory, &path.name)?;
    let channel = app.dispatch(ctx.actor, &entry).await?;
    app.audit
        .record(ctx.actor, &format!("Sent template {} to channel {}", path, channel));
    log::info!("Template {} of {} sent to {}", path, ctx.actor, channel);
    app.say(ctx, texts::SENT).await
}
