use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::storage::document::ActorId;

/// Configuration constants for the bot
/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Owner of the bot (exclusive rights over the admin roster and the audit log)
/// Read from OWNER_ID environment variable; absent, empty or 0 means "no owner"
pub static OWNER_ID: Lazy<Option<ActorId>> = Lazy::new(|| parse_owner_id(env::var("OWNER_ID").ok().as_deref()));

/// Admin ids seeded into the roster at startup
/// Read from ADMIN_IDS environment variable (comma separated)
pub static ADMIN_IDS: Lazy<Vec<ActorId>> =
    Lazy::new(|| parse_admin_ids(&env::var("ADMIN_IDS").unwrap_or_default()));

/// Directory holding storage.json and audit.log
/// Read from DATA_DIR environment variable
/// Default: current directory
pub static DATA_DIR: Lazy<PathBuf> = Lazy::new(|| {
    env::var("DATA_DIR")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
});

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: chanpost.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "chanpost.log".to_string()));

/// File names inside DATA_DIR
pub mod files {
    pub const STORAGE_FILE: &str = "storage.json";
    pub const AUDIT_FILE: &str = "audit.log";
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Caller-enforced timeout for every Telegram call (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Presentation limits
pub mod limits {
    /// Lines returned by the owner's audit view
    pub const AUDIT_TAIL_LINES: usize = 20;

    /// Items per page in the delete listing
    pub const DELETE_PAGE_SIZE: usize = 20;

    /// Max characters of a label on an inline button
    pub const BUTTON_LABEL_MAX_CHARS: usize = 64;

    /// Longer listings are sent as a document instead of a message
    pub const LONG_TEXT_THRESHOLD: usize = 3500;
}

/// Audit log bounding
pub mod audit {
    /// Rewrite the audit file once it grows past this size
    pub const MAX_BYTES: u64 = 256 * 1024;

    /// Lines kept after a rewrite
    pub const KEEP_LINES: usize = 1000;

    /// Bytes read from the end of the file for `tail`
    pub const TAIL_READ_BYTES: u64 = 64 * 1024;
}

/// Parses OWNER_ID. Zero and garbage mean "no owner configured".
pub fn parse_owner_id(raw: Option<&str>) -> Option<ActorId> {
    raw.and_then(|s| s.trim().parse::<ActorId>().ok()).filter(|id| *id != 0)
}

/// Parses a comma separated id list, skipping anything that is not a positive number.
pub fn parse_admin_ids(raw: &str) -> Vec<ActorId> {
    raw.split(',')
        .filter_map(|part| part.trim().parse::<ActorId>().ok())
        .filter(|id| *id > 0)
        .collect()
}

/// Startup configuration snapshot.
///
/// Built once in `main` and handed to every component; never reloaded at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub owner_id: Option<ActorId>,
    pub admin_ids: Vec<ActorId>,
    pub data_dir: PathBuf,
}

impl AppConfig {
    /// Snapshot of the environment-backed statics
    pub fn from_env() -> Self {
        Self {
            owner_id: *OWNER_ID,
            admin_ids: ADMIN_IDS.clone(),
            data_dir: DATA_DIR.clone(),
        }
    }

    pub fn new(owner_id: Option<ActorId>, admin_ids: Vec<ActorId>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            owner_id,
            admin_ids,
            data_dir: data_dir.into(),
        }
    }

    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join(files::STORAGE_FILE)
    }

    pub fn audit_path(&self) -> PathBuf {
        self.data_dir.join(files::AUDIT_FILE)
    }
}
