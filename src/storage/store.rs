//! Durable storage of the whole document in one JSON file
//!
//! Saves are atomic: the document is written to a temporary file in the
//! target directory, forced to disk, then renamed over the target. A reader
//! (or a later `load`) never observes a half-written document.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;
use tempfile::NamedTempFile;

use super::document::{ActorId, Document};
use super::migrations;
use crate::core::config::files::STORAGE_FILE;
use crate::core::error::{AppError, AppResult};

/// Result of [`Store::load`]
#[derive(Debug, Clone)]
pub struct Loaded {
    pub document: Document,
    /// The on-disk file differs from `document` and should be rewritten
    pub needs_persist: bool,
}

#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    owner: Option<ActorId>,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>, owner: Option<ActorId>) -> Self {
        Self {
            path: path.into(),
            owner,
        }
    }

    /// Store backed by `storage.json` inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>, owner: Option<ActorId>) -> Self {
        Self::new(dir.as_ref().join(STORAGE_FILE), owner)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn owner(&self) -> Option<ActorId> {
        self.owner
    }

    /// Loads, backfills and migrates the document. Never fails:
    /// a missing or corrupt file yields the default skeleton.
    pub fn load(&self) -> Loaded {
        let raw = match fs_err::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No storage file at {}, starting empty", self.path.display());
                return Loaded {
                    document: Document::default(),
                    needs_persist: true,
                };
            }
            Err(e) => {
                // Unreadable but present: leave it alone and never overwrite it
                log::error!("Failed to read {}: {}", self.path.display(), e);
                return Loaded {
                    document: Document::default(),
                    needs_persist: false,
                };
            }
        };

        let mut root = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(root)) => root,
            Ok(_) => {
                log::error!("Storage root in {} is not an object", self.path.display());
                return self.recover_from_corrupt();
            }
            Err(e) => {
                log::error!("Storage file {} is not valid JSON: {}", self.path.display(), e);
                return self.recover_from_corrupt();
            }
        };

        let migrated = migrations::run(&mut root, self.owner);
        let (document, report) = Document::from_value(&root);
        if !report.is_clean() {
            log::warn!(
                "Storage repaired on load: backfilled {:?}, skipped {} malformed entries",
                report.backfilled,
                report.skipped
            );
        }
        Loaded {
            document,
            needs_persist: migrated || !report.is_clean(),
        }
    }

    /// Copies the corrupt file aside so later saves cannot destroy it.
    fn recover_from_corrupt(&self) -> Loaded {
        let aside = corrupt_copy_path(&self.path);
        match fs_err::copy(&self.path, &aside) {
            Ok(_) => {
                log::warn!("Corrupt storage copied to {}", aside.display());
                Loaded {
                    document: Document::default(),
                    needs_persist: true,
                }
            }
            Err(e) => {
                log::error!("Failed to copy corrupt storage aside: {}", e);
                Loaded {
                    document: Document::default(),
                    needs_persist: false,
                }
            }
        }
    }

    /// Atomically replaces the file with `doc`.
    pub fn save(&self, doc: &Document) -> AppResult<()> {
        self.stage(doc)?.commit()
    }

    /// First half of a save: the document is fully written and synced to a
    /// temporary file next to the target, which is left untouched.
    pub fn stage(&self, doc: &Document) -> AppResult<StagedWrite> {
        let json = serde_json::to_vec_pretty(doc).map_err(|e| AppError::Persistence(e.to_string()))?;
        let dir = parent_dir(&self.path);

        let mut temp = tempfile::Builder::new()
            .prefix("storage_")
            .suffix(".json")
            .tempfile_in(&dir)
            .map_err(|e| persistence_error("create temp file in", &dir, e))?;
        temp.write_all(&json)
            .map_err(|e| persistence_error("write temp file in", &dir, e))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| persistence_error("sync temp file in", &dir, e))?;

        Ok(StagedWrite {
            temp,
            target: self.path.clone(),
        })
    }
}

/// A written but not yet published document
pub struct StagedWrite {
    temp: NamedTempFile,
    target: PathBuf,
}

impl StagedWrite {
    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    /// Renames the temporary file over the target.
    pub fn commit(self) -> AppResult<()> {
        let dir = parent_dir(&self.target);
        self.temp
            .persist(&self.target)
            .map_err(|e| persistence_error("replace storage file in", &dir, e.error))?;

        // Make the rename itself durable; not every platform supports this
        if let Ok(handle) = std::fs::File::open(&dir) {
            let _ = handle.sync_all();
        }
        Ok(())
    }

    /// Leaves the temporary file on disk without publishing it,
    /// as an interrupted process would.
    pub fn abandon(self) -> AppResult<PathBuf> {
        self.temp
            .into_temp_path()
            .keep()
            .map_err(|e| AppError::Persistence(e.to_string()))
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn corrupt_copy_path(path: &Path) -> PathBuf {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".corrupt-{}", timestamp));
    path.with_file_name(name)
}

fn persistence_error(action: &str, dir: &Path, err: std::io::Error) -> AppError {
    log::error!("Failed to {} {}: {}", action, dir.display(), err);
    AppError::Persistence(format!("failed to {} {}: {}", action, dir.display(), err))
}
