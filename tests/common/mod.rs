//! Common test utilities
//!
//! This module is shared across all integration tests

pub mod fixtures;
pub mod recorder;

#[allow(unused_imports)]
pub use fixtures::{TestEnv, ADMIN, BOT_ID, CHANNEL, OWNER, STRANGER};
#[allow(unused_imports)]
pub use recorder::{Call, RecordingTransport};
