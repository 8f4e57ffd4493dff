//! Test environment: an `App` over a scratch data directory and a recording transport

#![allow(dead_code)]

use std::sync::Arc;
use tempfile::TempDir;

use super::recorder::RecordingTransport;
use chanpost::core::config::AppConfig;
use chanpost::storage::{ActorId, Repository, Store};
use chanpost::telegram::{App, Inbound};

pub const OWNER: ActorId = 100_001;
pub const ADMIN: ActorId = 200_002;
pub const STRANGER: ActorId = 300_003;
pub const BOT_ID: ActorId = 900_009;
pub const CHANNEL: i64 = -100_777_000;

pub struct TestEnv {
    pub dir: TempDir,
    pub transport: Arc<RecordingTransport>,
    pub app: App,
}

impl TestEnv {
    /// Owner plus one seeded admin
    pub fn new() -> Self {
        Self::with_roster(Some(OWNER), &[ADMIN])
    }

    pub fn with_roster(owner: Option<ActorId>, admins: &[ActorId]) -> Self {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(RecordingTransport::new());
        let config = AppConfig::new(owner, admins.to_vec(), dir.path());
        let app = App::new(config, transport.clone(), BOT_ID);
        Self { dir, transport, app }
    }

    pub async fn send(&self, inbound: Inbound) {
        self.app.handle(inbound).await;
    }

    pub async fn text(&self, actor: ActorId, text: &str) {
        self.send(Inbound::text(actor, text)).await;
    }

    pub async fn press(&self, actor: ActorId, data: &str) {
        self.send(Inbound::callback(actor, data)).await;
    }

    /// Presses the button whose label contains `needle` on the last keyboard
    pub async fn press_label(&self, actor: ActorId, needle: &str) {
        let data = self
            .transport
            .button_data(needle)
            .unwrap_or_else(|| panic!("no button labelled {:?} on the last keyboard", needle));
        self.press(actor, &data).await;
    }

    /// A fresh repository reading the same storage file
    pub fn reopen(&self) -> Repository {
        let store = Store::in_dir(self.dir.path(), Some(OWNER));
        Repository::open(store, &[])
    }

    pub fn audit_lines(&self) -> Vec<String> {
        self.app.audit.tail(100)
    }
}
