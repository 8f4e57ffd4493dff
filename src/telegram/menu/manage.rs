//! Template management: add, paginated delete, list, export, import

use itertools::Itertools;

use crate::compose::{Prompt, Session};
use crate::core::config::limits::{BUTTON_LABEL_MAX_CHARS, DELETE_PAGE_SIZE, LONG_TEXT_THRESHOLD};
use crate::core::error::{AppError, AppResult};
use crate::navigation::{page_of, paginate, Address, Navigator};
use crate::storage::repository::compare_names;
use crate::storage::TemplateTree;
use crate::telegram::actions::{manage, menu};
use crate::telegram::app::{App, Ctx};
use crate::telegram::transport::{timed, KeyButton, Keyboard};
use crate::telegram::{keyboards, texts};

pub const LIST_FILE_NAME: &str = "templates_list.txt";
pub const EXPORT_FILE_NAME: &str = "templates_export.json";

pub async fn show(app: &App, ctx: &Ctx) -> AppResult<()> {
    app.sessions.clear(ctx.actor);
    let keyboard = Keyboard::new()
        .row(vec![
            KeyButton::callback("➕ Add", manage::ADD),
            KeyButton::callback("🗑 Delete", manage::DELETE),
        ])
        .button(KeyButton::callback("📋 List", manage::LIST))
        .row(vec![
            KeyButton::callback("📤 Export", manage::EXPORT),
            KeyButton::callback("📥 Import", manage::IMPORT),
        ])
        .button(keyboards::back_to_main());
    let text = format!(
        "🗂 <b>Manage templates</b>\nYou have {} template(s).",
        app.repo.template_count(ctx.actor)
    );
    app.show(ctx, &text, Some(&keyboard)).await
}

pub async fn show_delete_page(app: &App, ctx: &Ctx, requested: usize, notice: Option<&str>) -> AppResult<()> {
    let nav = Navigator::new(&app.repo, ctx.actor);
    let all = app.repo.list_all(ctx.actor);
    let page = paginate(all.len(), requested, DELETE_PAGE_SIZE);

    let mut keyboard = page.range().fold(Keyboard::new(), |kb, index| {
        let label = texts::truncate_label(&format!("🗑 {}", all[index]), BUTTON_LABEL_MAX_CHARS);
        kb.button(KeyButton::callback(label, nav.issue(manage::DELETE_ITEM, &[index])))
    });
    if page.total_pages > 1 {
        let mut row = Vec::new();
        if page.has_prev() {
            row.push(KeyButton::callback("◀️", nav.issue(manage::DELETE_PAGE, &[page.number - 1])));
        }
        row.push(keyboards::page_indicator(page.number, page.total_pages));
        if page.has_next() {
            row.push(KeyButton::callback("▶️", nav.issue(manage::DELETE_PAGE, &[page.number + 1])));
        }
        keyboard = keyboard.row(row);
    }
    keyboard = keyboard.button(keyboards::back(menu::MANAGE));

    let body = if all.is_empty() {
        texts::NO_TEMPLATES.to_string()
    } else {
        "🗑 <b>Delete a template</b>\nTap the one to remove:".to_string()
    };
    let text = match notice {
        Some(notice) => format!("{}\n\n{}", notice, body),
        None => body,
    };
    app.show(ctx, &text, Some(&keyboard)).await
}

pub async fn delete_page(app: &App, ctx: &Ctx, address: &Address) -> AppResult<()> {
    let nav = Navigator::new(&app.repo, ctx.actor);
    match nav.check_page(address) {
        Ok(page) => show_delete_page(app, ctx, page, None).await,
        Err(e) => {
            log::info!("Stale delete page token from {}: {}", ctx.actor, e);
            show_delete_page(app, ctx, 0, Some(&e.user_message())).await
        }
    }
}

/// Deletes the addressed template and re-renders the page it was on.
pub async fn delete_item(app: &App, ctx: &Ctx, address: &Address) -> AppResult<()> {
    let nav = Navigator::new(&app.repo, ctx.actor);
    let (index, path) = match nav.resolve_flat(address) {
        Ok(found) => found,
        Err(e @ (AppError::StaleIndex(_) | AppError::MalformedToken(_))) => {
            log::info!("Stale delete token from {}: {}", ctx.actor, e);
            return show_delete_page(app, ctx, 0, Some(&e.user_message())).await;
        }
        Err(e) => return Err(e),
    };

    app.repo
        .delete(ctx.actor, &path.category, &path.subcategory, &path.name)?;
    app.audit.record(ctx.actor, &format!("Deleted template {}", path));
    log::info!("Template {} deleted by {}", path, ctx.actor);

    let remaining = app.repo.template_count(ctx.actor);
    let page = page_of(index, remaining, DELETE_PAGE_SIZE);
    let notice = format!("✅ Deleted {}", texts::escape(&path.to_string()));
    show_delete_page(app, ctx, page, Some(&notice)).await
}

/// "category -> subcategory -> name, name" per line
pub fn render_listing(tree: &TemplateTree) -> String {
    tree.iter()
        .sorted_by(|a, b| compare_names(a.0, b.0))
        .flat_map(|(category, subs)| {
            subs.iter().sorted_by(|a, b| compare_names(a.0, b.0)).map(move |(subcategory, names)| {
                let names = names.keys().sorted_by(|a, b| compare_names(a, b)).join(", ");
                format!("{} -> {} -> {}", category, subcategory, names)
            })
        })
        .join("\n")
}

pub async fn list(app: &App, ctx: &Ctx) -> AppResult<()> {
    let tree = app.repo.export_all(ctx.actor);
    if tree.is_empty() {
        return app.say(ctx, texts::NO_TEMPLATES).await;
    }
    let listing = render_listing(&tree);
    if listing.chars().count() > LONG_TEXT_THRESHOLD {
        return app
            .send_document(ctx, LIST_FILE_NAME, listing.into_bytes(), "📋 Your templates")
            .await;
    }
    app.say(ctx, &format!("📋 <b>Your templates</b>\n{}", texts::escape(&listing)))
        .await
}

pub async fn export(app: &App, ctx: &Ctx) -> AppResult<()> {
    let tree = app.repo.export_all(ctx.actor);
    let count = crate::storage::document::count_leaves(&tree);
    let bytes = serde_json::to_vec_pretty(&tree)?;
    app.send_document(ctx, EXPORT_FILE_NAME, bytes, &format!("📤 {} template(s)", count))
        .await?;
    log::info!("Exported {} templates for {}", count, ctx.actor);
    Ok(())
}

pub async fn start_import(app: &App, ctx: &Ctx) -> AppResult<()> {
    app.sessions.start(ctx.actor, Session::Awaiting(Prompt::ImportFile));
    let keyboard = Keyboard::new().button(keyboards::back(menu::MANAGE));
    app.show(ctx, texts::PROMPT_IMPORT, Some(&keyboard)).await
}

/// Downloads the uploaded JSON and merges it into the actor's tree.
pub async fn import_document(app: &App, ctx: &Ctx, file_id: &str, file_name: Option<&str>) -> AppResult<()> {
    log::info!("Import from {} ({:?})", ctx.actor, file_name);
    let bytes = timed(app.transport.download_file(file_id)).await?;
    let payload: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|e| AppError::Import(format!("not valid JSON: {}", e)))?;
    let report = app.repo.import_json(ctx.actor, &payload)?;

    app.sessions.clear(ctx.actor);
    app.audit
        .record(ctx.actor, &format!("Imported {} template(s)", report.merged));
    let mut text = format!("✅ Imported {} template(s).", report.merged);
    if report.skipped > 0 {
        text.push_str(&format!("\n⚠️ Skipped {} malformed entr(ies).", report.skipped));
    }
    app.say(ctx, &text).await
}
