//! Handler types and dependencies

use std::sync::Arc;

use crate::telegram::app::App;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub app: Arc<App>,
}

impl HandlerDeps {
    pub fn new(app: Arc<App>) -> Self {
        Self { app }
    }
}
