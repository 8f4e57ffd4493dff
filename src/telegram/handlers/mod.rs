//! Telegram bot handler tree configuration
//!
//! This module provides the main dispatcher schema for the Telegram bot.
//! Handlers only translate updates; behaviour lives in [`App`](crate::telegram::app::App),
//! so integration tests drive the same code without a dispatcher.

mod schema;
mod types;

pub use schema::{inbound_from_callback, inbound_from_message, schema};
pub use types::{HandlerDeps, HandlerError};
