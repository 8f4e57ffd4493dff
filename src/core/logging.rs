//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - Startup configuration logging

use anyhow::Result;
use simplelog::*;
use std::fs::File;

use crate::core::config::AppConfig;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to initialize logger
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs where state lives and who controls the bot
pub fn log_startup_configuration(config: &AppConfig) {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("🗂 storage.json path: {}", config.storage_path().display());
    log::info!("🧾 audit.log path:   {}", config.audit_path().display());
    match config.owner_id {
        Some(owner) => log::info!("👑 Owner: {}", owner),
        None => {
            log::warn!("⚠️  OWNER_ID is not set: admin roster and audit log are unavailable");
            log::warn!("   Legacy shared templates will be migrated into namespace 0");
        }
    }
    log::info!("👥 Seed admins from ADMIN_IDS: {}", config.admin_ids.len());
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
