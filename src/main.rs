use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;

use chanpost::cli::{Cli, Commands};
use chanpost::core::logging::log_startup_configuration;
use chanpost::core::{config, init_logger, AppConfig};
use chanpost::storage::{ActorId, Repository, Store};
use chanpost::telegram::client::actor_id;
use chanpost::telegram::handlers::{schema, HandlerDeps};
use chanpost::telegram::{create_bot, setup_bot_commands, App, TelegramTransport};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Log panics in handlers instead of losing them with the dispatcher task
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    // Load environment variables from .env if present, before config statics are read
    let _ = dotenv();

    init_logger(&config::LOG_FILE_PATH)?;

    let app_config = AppConfig::from_env();
    match cli.command {
        Some(Commands::Run) => run_bot(app_config).await,
        Some(Commands::Migrate) => run_migrate(app_config),
        Some(Commands::Export { actor }) => run_export(app_config, actor),
        None => {
            log::info!("No command specified, running bot in default mode");
            run_bot(app_config).await
        }
    }
}

fn open_repository(app_config: &AppConfig) -> Repository {
    let store = Store::new(app_config.storage_path(), app_config.owner_id);
    Repository::open(store, &app_config.admin_ids)
}

/// Loads, migrates and persists the storage document, then exits
fn run_migrate(app_config: AppConfig) -> Result<()> {
    let repo = open_repository(&app_config);
    let snapshot = repo.snapshot();
    log::info!(
        "Storage {} is at version {} ({} admins, {} channel bindings, {} template trees)",
        repo.store().path().display(),
        snapshot.version,
        snapshot.admins.len(),
        snapshot.channels.len(),
        snapshot.templates.len()
    );
    Ok(())
}

/// Prints an actor's template tree to stdout
fn run_export(app_config: AppConfig, actor: ActorId) -> Result<()> {
    let repo = open_repository(&app_config);
    let tree = repo.export_all(actor);
    println!("{}", serde_json::to_string_pretty(&tree)?);
    Ok(())
}

async fn run_bot(app_config: AppConfig) -> Result<()> {
    log::info!("Starting bot...");
    log_startup_configuration(&app_config);

    let bot = create_bot()?;
    let me = bot.get_me().await?;
    let bot_id = actor_id(me.id).ok_or_else(|| anyhow::anyhow!("Bot id {} does not fit an actor id", me.id))?;
    log::info!("Bot @{} ({}) authorized", me.username(), bot_id);

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let transport = Arc::new(TelegramTransport::new(bot.clone()));
    let app = Arc::new(App::new(app_config, transport, bot_id));
    let handler = schema(HandlerDeps::new(app));

    let listener = Polling::builder(bot.clone()).drop_pending_updates().build();
    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}
