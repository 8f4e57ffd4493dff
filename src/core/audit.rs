//! Bounded, human-readable action trail
//!
//! One line per action: `[YYYY-MM-DD HH:MM] <actor> - <description>`.
//! The trail is independent of the storage document; recording never fails
//! the action that triggered it.

use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use fs_err::{File, OpenOptions};

use crate::core::config;
use crate::storage::document::ActorId;

/// Formats a single audit line (without trailing newline).
///
/// Newlines inside the description are flattened so one action always
/// occupies exactly one line.
pub fn format_line(timestamp: &str, actor: ActorId, description: &str) -> String {
    let description = description.replace(['\r', '\n'], " ");
    format!("[{}] {} - {}", timestamp, actor, description)
}

pub struct AuditLog {
    path: PathBuf,
    max_bytes: u64,
    keep_lines: usize,
    write_lock: Mutex<()>,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_limits(path, config::audit::MAX_BYTES, config::audit::KEEP_LINES)
    }

    pub fn with_limits(path: impl Into<PathBuf>, max_bytes: u64, keep_lines: usize) -> Self {
        Self {
            path: path.into(),
            max_bytes,
            keep_lines,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one line. Failures are logged and swallowed.
    pub fn record(&self, actor: ActorId, description: &str) {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M").to_string();
        let line = format_line(&timestamp, actor, description);

        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = self.append(&line) {
            log::error!("Failed to write audit line to {}: {}", self.path.display(), e);
            return;
        }
        if let Err(e) = self.enforce_bound() {
            log::warn!("Failed to trim audit log {}: {}", self.path.display(), e);
        }
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Rewrites the file to its last `keep_lines` lines once it grows past `max_bytes`.
    fn enforce_bound(&self) -> std::io::Result<()> {
        let len = fs_err::metadata(&self.path)?.len();
        if len <= self.max_bytes {
            return Ok(());
        }
        let content = fs_err::read_to_string(&self.path)?;
        let lines: Vec<&str> = content.lines().collect();
        let start = lines.len().saturating_sub(self.keep_lines);
        let mut trimmed = lines[start..].join("\n");
        trimmed.push('\n');
        fs_err::write(&self.path, trimmed)?;
        log::info!(
            "Audit log trimmed from {} bytes to the last {} lines",
            len,
            lines.len() - start
        );
        Ok(())
    }

    /// Last `n` lines, oldest first. A missing file reads as empty.
    pub fn tail(&self, n: usize) -> Vec<String> {
        match read_tail(&self.path, config::audit::TAIL_READ_BYTES) {
            Ok(buf) => {
                let lines: Vec<String> = buf.lines().filter(|l| !l.is_empty()).map(str::to_string).collect();
                let start = lines.len().saturating_sub(n);
                lines[start..].to_vec()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                log::warn!("Failed to read audit log {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }
}

/// Reads at most `max_bytes` from the end of the file, dropping a partial first line.
fn read_tail(path: &Path, max_bytes: u64) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    let truncated = len > max_bytes;
    if truncated {
        file.seek(SeekFrom::End(-(max_bytes as i64)))?;
    }

    let mut raw = Vec::new();
    file.read_to_end(&mut raw)?;
    let mut buf = String::from_utf8_lossy(&raw).into_owned();
    if truncated {
        if let Some(pos) = buf.find('\n') {
            buf.drain(..=pos);
        }
    }
    Ok(buf)
}
