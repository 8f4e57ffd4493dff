//! Persistent document, migrations and the template repository

pub mod document;
pub mod migrations;
pub mod repository;
pub mod store;

// Re-exports for convenience
pub use document::{ActorId, ChannelRef, Document, LinkButton, TemplateEntry, TemplateTree};
pub use repository::{ImportReport, Repository, TemplatePath};
pub use store::{Loaded, StagedWrite, Store};
