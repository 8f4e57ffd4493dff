//! Core utilities, configuration, and common functionality

pub mod access;
pub mod audit;
pub mod config;
pub mod error;
pub mod logging;
pub mod validation;

// Re-exports for convenience
pub use access::{AccessGate, Role};
pub use audit::AuditLog;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use logging::init_logger;
