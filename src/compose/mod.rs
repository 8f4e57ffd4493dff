//! Multi-step composition of posts and templates

pub mod draft;
pub mod machine;
pub mod session;

pub use draft::Draft;
pub use machine::{Choice, Composer, Flow, Input, Outcome, Step, SKIP_SENTINEL};
pub use session::{Prompt, Session, SessionStore};
