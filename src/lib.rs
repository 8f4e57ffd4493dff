//! Chanpost - Telegram bot for composing and publishing channel posts
//!
//! Admins compose posts (text, optional photo, rows of URL buttons), keep
//! them as named templates in a category / subcategory / name tree, and
//! dispatch them to the channel bound to their account.
//!
//! # Module Structure
//!
//! - `core`: Configuration, errors, logging, access control, audit log
//! - `storage`: The persisted document, its migrations and the repository
//! - `navigation`: Compact callback tokens and pagination
//! - `compose`: Draft composition state machine and per-actor sessions
//! - `telegram`: Transport seam, menus and the teloxide dispatcher

pub mod cli;
pub mod compose;
pub mod core;
pub mod navigation;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use core::{config, AppError, AppResult};
pub use storage::{Repository, Store};
pub use telegram::{App, Transport};
