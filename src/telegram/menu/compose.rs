//! Post draft and template build screens

use super::main_menu;
use crate::compose::{Composer, Flow, Input, Outcome, Session, Step};
use crate::core::error::{AppError, AppResult};
use crate::storage::{TemplateEntry, TemplatePath};
use crate::telegram::app::{App, Ctx};
use crate::telegram::{keyboards, texts};

pub async fn start_post(app: &App, ctx: &Ctx) -> AppResult<()> {
    start(app, ctx, Composer::post()).await
}

pub async fn start_template(app: &App, ctx: &Ctx) -> AppResult<()> {
    start(app, ctx, Composer::template()).await
}

async fn start(app: &App, ctx: &Ctx, composer: Composer) -> AppResult<()> {
    app.sessions.start(ctx.actor, Session::compose(composer.clone()));
    render(app, ctx, &composer, None).await
}

async fn render(app: &App, ctx: &Ctx, composer: &Composer, notice: Option<&str>) -> AppResult<()> {
    let prompt = texts::step_prompt(composer);
    let text = match notice {
        Some(notice) => format!("{}\n\n{}", notice, prompt),
        None => prompt,
    };
    app.show(ctx, &text, Some(&keyboards::for_step(composer))).await
}

/// Feeds one input to the actor's composer and renders the result.
pub async fn apply_input(app: &App, ctx: &Ctx, input: Input) -> AppResult<()> {
    let applied = app.sessions.with_composer(ctx.actor, |composer| {
        let outcome = composer.apply(input);
        (outcome, composer.clone())
    });
    let Some((outcome, composer)) = applied else {
        return app.say(ctx, texts::USE_MENU).await;
    };

    match outcome {
        Outcome::Prompt(_) => render(app, ctx, &composer, None).await,
        Outcome::Retry(e) => render(app, &ctx.fresh(), &composer, Some(&e.user_message())).await,
        Outcome::Complete { path, entry } => save_template(app, ctx, &path, entry).await,
    }
}

/// On failure the session stays on the button menu, so "Save" can be pressed again.
async fn save_template(app: &App, ctx: &Ctx, path: &TemplatePath, entry: TemplateEntry) -> AppResult<()> {
    app.repo
        .put(ctx.actor, &path.category, &path.subcategory, &path.name, entry)?;
    app.sessions.clear(ctx.actor);
    app.audit.record(ctx.actor, &format!("Saved template {}", path));
    log::info!("Template {} saved by {}", path, ctx.actor);
    main_menu::show(app, ctx, Some(texts::SAVED)).await
}

fn post_draft(app: &App, ctx: &Ctx) -> Option<Composer> {
    app.sessions
        .get(ctx.actor)
        .and_then(|s| s.composer().cloned())
        .filter(|c| c.flow() == Flow::PostDraft)
}

/// Sends the draft to the actor's own chat, then repeats the draft menu below it.
pub async fn preview(app: &App, ctx: &Ctx) -> AppResult<()> {
    let Some(composer) = post_draft(app, ctx) else {
        return app.say(ctx, texts::USE_MENU).await;
    };
    app.send_entry(ctx.chat, &composer.draft().to_entry()).await?;
    render(app, &ctx.fresh(), &composer, None).await
}

/// Dispatches the draft to the bound channel. The draft is destroyed only
/// after the channel accepted it.
pub async fn send(app: &App, ctx: &Ctx) -> AppResult<()> {
    let prepared = app.sessions.with_composer(ctx.actor, |composer| {
        if composer.flow() != Flow::PostDraft {
            return None;
        }
        if composer.step() != &Step::Idle {
            return Some(Err(AppError::Validation("Finish the current step first".to_string())));
        }
        Some(Ok(composer.prepare_dispatch()))
    });
    let entry = match prepared.flatten() {
        Some(entry) => entry?,
        None => return app.say(ctx, texts::USE_MENU).await,
    };

    let channel = app.dispatch(ctx.actor, &entry).await?;
    app.sessions.clear(ctx.actor);
    app.audit.record(ctx.actor, &format!("Sent post to channel {}", channel));
    log::info!("Post of {} sent to {}", ctx.actor, channel);
    main_menu::show(app, &ctx.fresh(), Some(texts::SENT)).await
}
