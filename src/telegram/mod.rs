//! Telegram bot integration and handlers

pub mod actions;
pub mod app;
pub mod bot;
pub mod client;
pub mod handlers;
pub mod inbound;
pub mod keyboards;
pub mod menu;
pub mod texts;
pub mod transport;

// Re-exports for convenience
pub use app::{App, Ctx};
pub use bot::{create_bot, setup_bot_commands, Command};
pub use client::TelegramTransport;
pub use inbound::{CommandKind, Inbound, InboundKind};
pub use transport::{ChatInfo, EditOutcome, KeyButton, Keyboard, Transport};
