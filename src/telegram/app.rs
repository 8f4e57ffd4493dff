//! Bot core: every inbound event passes the access gate, then is routed
//! to a menu flow. Flows only use the [`Transport`] seam, so the whole
//! behaviour is exercised in tests without Telegram.

use std::sync::Arc;

use super::actions::{manage as manage_actions, Action};
use super::inbound::{CommandKind, Inbound, InboundKind};
use super::keyboards;
use super::menu::{browse, compose, main_menu, manage, owner, settings};
use super::texts;
use super::transport::{safe_edit, timed, Keyboard, Transport};
use crate::compose::{Choice, Input, Prompt, Session, SessionStore, Step};
use crate::core::config::AppConfig;
use crate::core::error::{AppError, AppResult};
use crate::core::{AccessGate, AuditLog, Role};
use crate::storage::{ActorId, Repository, Store, TemplateEntry};

/// Where a reply goes. Callbacks edit the message they came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ctx {
    pub actor: ActorId,
    pub chat: i64,
    pub message_id: Option<i32>,
    pub role: Role,
}

impl Ctx {
    /// Same destination, but always as a fresh message
    pub fn fresh(self) -> Self {
        Self {
            message_id: None,
            ..self
        }
    }
}

pub struct App {
    pub repo: Arc<Repository>,
    pub gate: AccessGate,
    pub sessions: SessionStore,
    pub audit: Arc<AuditLog>,
    pub transport: Arc<dyn Transport>,
    pub config: AppConfig,
    /// Telegram id of the bot itself, for channel rights checks
    pub bot_id: ActorId,
}

impl App {
    /// Opens storage and the audit log under `config.data_dir`.
    pub fn new(config: AppConfig, transport: Arc<dyn Transport>, bot_id: ActorId) -> Self {
        let store = Store::new(config.storage_path(), config.owner_id);
        let repo = Arc::new(Repository::open(store, &config.admin_ids));
        let gate = AccessGate::new(config.owner_id, Arc::clone(&repo));
        let audit = Arc::new(AuditLog::new(config.audit_path()));
        Self {
            repo,
            gate,
            sessions: SessionStore::new(),
            audit,
            transport,
            config,
            bot_id,
        }
    }

    /// Handles one inbound event. Never fails: errors are rendered to the actor.
    pub async fn handle(&self, inbound: Inbound) {
        log::debug!("Inbound {} from {}", inbound.kind_label(), inbound.actor);

        let role = match self.gate.admit(inbound.actor) {
            Ok(role) => role,
            Err(_) => {
                self.deny(&inbound).await;
                return;
            }
        };

        let message_id = match &inbound.kind {
            InboundKind::Callback { message_id, .. } => *message_id,
            _ => None,
        };
        let ctx = Ctx {
            actor: inbound.actor,
            chat: inbound.chat,
            message_id,
            role,
        };

        if let Err(e) = self.route(&ctx, inbound.kind).await {
            self.report(&ctx, e).await;
        }
    }

    async fn deny(&self, inbound: &Inbound) {
        let result = match &inbound.kind {
            InboundKind::Callback { id, .. } => timed(self.transport.answer_callback(id, Some(texts::DENIED), true)).await,
            _ => timed(self.transport.send_text(inbound.chat, texts::DENIED, None)).await,
        };
        if let Err(e) = result {
            log::warn!("Failed to deliver denial to {}: {}", inbound.actor, e);
        }
    }

    async fn route(&self, ctx: &Ctx, kind: InboundKind) -> AppResult<()> {
        let kind = match kind {
            InboundKind::ForwardedFromChat {
                chat_id,
                title,
                is_channel,
                body,
            } => {
                if self.sessions.awaiting(ctx.actor) == Some(Prompt::ChannelForward) {
                    return settings::on_forward(self, ctx, chat_id, &title, is_channel).await;
                }
                match body {
                    Some(body) => *body,
                    None => return self.say(ctx, texts::USE_MENU).await,
                }
            }
            other => other,
        };

        match kind {
            InboundKind::Command(command) => self.on_command(ctx, command).await,
            InboundKind::Callback { id, data, .. } => {
                if let Err(e) = timed(self.transport.answer_callback(&id, None, false)).await {
                    log::debug!("Failed to acknowledge callback {}: {}", id, e);
                }
                self.on_callback(ctx, &data).await
            }
            InboundKind::Text(text) => self.on_text(ctx, text).await,
            InboundKind::Photo { file_id, caption } => self.on_photo(ctx, file_id, caption).await,
            InboundKind::Document { file_id, file_name } => match self.sessions.awaiting(ctx.actor) {
                Some(Prompt::ImportFile) => manage::import_document(self, ctx, &file_id, file_name.as_deref()).await,
                _ => self.say(ctx, texts::USE_MENU).await,
            },
            InboundKind::ForwardedFromChat { .. } => self.say(ctx, texts::USE_MENU).await,
        }
    }

    /// A photo fills the photo step; at the text step its caption is the post text.
    async fn on_photo(&self, ctx: &Ctx, file_id: String, caption: Option<String>) -> AppResult<()> {
        let Some(step) = self.sessions.with_composer(ctx.actor, |c| c.step().clone()) else {
            return self.say(ctx, texts::USE_MENU).await;
        };
        let input = match (step, caption) {
            (Step::CollectingText, Some(caption)) if !caption.trim().is_empty() => Input::Text(caption),
            _ => Input::Photo(file_id),
        };
        compose::apply_input(self, ctx, input).await
    }

    async fn on_command(&self, ctx: &Ctx, command: CommandKind) -> AppResult<()> {
        match command {
            CommandKind::Start => main_menu::show(self, ctx, None).await,
            CommandKind::Cancel => main_menu::show(self, ctx, Some(texts::CANCELLED)).await,
            CommandKind::EchoId => main_menu::echo_id(self, ctx).await,
            CommandKind::Storage => main_menu::storage_info(self, ctx).await,
        }
    }

    async fn on_text(&self, ctx: &Ctx, text: String) -> AppResult<()> {
        match self.sessions.get(ctx.actor) {
            Some(Session::Awaiting(prompt)) => match prompt {
                Prompt::ChannelForward => self.say(ctx, texts::PROMPT_FORWARD).await,
                Prompt::ChannelUsername => settings::on_username(self, ctx, &text).await,
                Prompt::AdminAdd => owner::on_admin_id(self, ctx, &text, true).await,
                Prompt::AdminRemove => owner::on_admin_id(self, ctx, &text, false).await,
                Prompt::ImportFile => self.say(ctx, texts::NEED_DOCUMENT).await,
            },
            Some(Session::PostDraft(_)) | Some(Session::TemplateBuild(_)) => {
                compose::apply_input(self, ctx, Input::Text(text)).await
            }
            None => self.say(ctx, texts::USE_MENU).await,
        }
    }

    async fn on_callback(&self, ctx: &Ctx, data: &str) -> AppResult<()> {
        let action = match Action::parse(data) {
            Ok(action) => action,
            Err(e) => {
                log::warn!("Malformed callback data from {}: {:?}", ctx.actor, data);
                let notice = e.user_message();
                if data.starts_with(manage_actions::NAMESPACE) {
                    return manage::show_delete_page(self, ctx, 0, Some(&notice)).await;
                }
                return browse::show_categories(self, ctx, Some(&notice)).await;
            }
        };

        match action {
            Action::Noop => Ok(()),
            Action::MainMenu => main_menu::show(self, ctx, None).await,
            Action::CreatePost => compose::start_post(self, ctx).await,
            Action::Browse => browse::show_categories(self, ctx, None).await,
            Action::Manage => manage::show(self, ctx).await,
            Action::Settings => settings::show(self, ctx, None).await,

            Action::AddButton => compose::apply_input(self, ctx, Input::Choice(Choice::AddButton)).await,
            Action::NewRow => compose::apply_input(self, ctx, Input::Choice(Choice::NewRow)).await,
            Action::AddPhoto => compose::apply_input(self, ctx, Input::Choice(Choice::AddPhoto)).await,
            Action::RemovePhoto => compose::apply_input(self, ctx, Input::Choice(Choice::RemovePhoto)).await,
            Action::ButtonAddToRow => compose::apply_input(self, ctx, Input::Choice(Choice::AddToRow)).await,
            Action::ButtonNewRow => compose::apply_input(self, ctx, Input::Choice(Choice::NewRow)).await,
            Action::ButtonFinish => compose::apply_input(self, ctx, Input::Choice(Choice::Finish)).await,
            Action::PreviewDraft => compose::preview(self, ctx).await,
            Action::SendDraft => compose::send(self, ctx).await,

            Action::BrowseNode(op, address) => browse::open(self, ctx, op, &address).await,

            Action::AddTemplate => compose::start_template(self, ctx).await,
            Action::DeleteMenu => manage::show_delete_page(self, ctx, 0, None).await,
            Action::DeletePage(address) => manage::delete_page(self, ctx, &address).await,
            Action::DeleteItem(address) => manage::delete_item(self, ctx, &address).await,
            Action::ListTemplates => manage::list(self, ctx).await,
            Action::Export => manage::export(self, ctx).await,
            Action::Import => manage::start_import(self, ctx).await,

            Action::Connect => settings::show_connect(self, ctx).await,
            Action::ConnectViaForward => settings::await_input(self, ctx, Prompt::ChannelForward).await,
            Action::ConnectViaUsername => settings::await_input(self, ctx, Prompt::ChannelUsername).await,
            Action::TestChannel => settings::test(self, ctx).await,
            Action::ClearChannel => settings::clear(self, ctx).await,

            Action::OwnerPanel => owner::show(self, ctx).await,
            Action::AddAdmin => owner::await_admin_id(self, ctx, Prompt::AdminAdd).await,
            Action::RemoveAdmin => owner::await_admin_id(self, ctx, Prompt::AdminRemove).await,
            Action::ListAdmins => owner::list(self, ctx).await,
            Action::Audit => owner::audit(self, ctx).await,
        }
    }

    /// Renders an error that ended an action
    async fn report(&self, ctx: &Ctx, err: AppError) {
        if err.is_recoverable() {
            log::info!("Action of {} rejected ({}): {}", ctx.actor, err.kind(), err);
        } else {
            log::warn!("Action of {} failed ({}): {}", ctx.actor, err.kind(), err);
        }
        if let Err(e) = timed(self.transport.send_text(ctx.chat, &err.user_message(), None)).await {
            log::warn!("Failed to report error to {}: {}", ctx.actor, e);
        }
    }

    /// Edits the callback message in place, or sends a new one
    pub async fn show(&self, ctx: &Ctx, text: &str, keyboard: Option<&Keyboard>) -> AppResult<()> {
        match ctx.message_id {
            Some(message_id) => safe_edit(self.transport.as_ref(), ctx.chat, message_id, text, keyboard).await,
            None => timed(self.transport.send_text(ctx.chat, text, keyboard)).await,
        }
    }

    /// Sends a new plain message
    pub async fn say(&self, ctx: &Ctx, text: &str) -> AppResult<()> {
        timed(self.transport.send_text(ctx.chat, text, None)).await
    }

    pub async fn send_document(&self, ctx: &Ctx, file_name: &str, bytes: Vec<u8>, caption: &str) -> AppResult<()> {
        timed(self.transport.send_document(ctx.chat, file_name, bytes, caption)).await
    }

    /// Sends a post (photo with caption, or text) with its URL buttons
    pub async fn send_entry(&self, chat: i64, entry: &TemplateEntry) -> AppResult<()> {
        let keyboard = keyboards::post_buttons(&entry.buttons);
        match &entry.photo {
            Some(photo) => timed(self.transport.send_photo(chat, photo, &entry.text, keyboard.as_ref())).await,
            None => timed(self.transport.send_text(chat, &entry.text, keyboard.as_ref())).await,
        }
    }

    /// Sends a post to the actor's bound channel
    pub async fn dispatch(&self, actor: ActorId, entry: &TemplateEntry) -> AppResult<String> {
        let channel = self.repo.channel_of(actor).ok_or(AppError::ChannelNotBound(actor))?;
        self.send_entry(channel.id, entry).await?;
        Ok(channel.label())
    }
}
