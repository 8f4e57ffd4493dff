//! Per-actor session memory
//!
//! Each actor has at most one session. Starting a new one replaces the
//! previous one (last write wins). The map is guarded by a std mutex and
//! only touched through short synchronous closures, so no lock is ever held
//! across a transport call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::machine::{Composer, Flow};
use crate::storage::ActorId;

/// Single free-text answer the bot is waiting for outside of composition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// Forwarded channel post expected
    ChannelForward,
    /// `@username` of a channel expected
    ChannelUsername,
    AdminAdd,
    AdminRemove,
    /// JSON document expected
    ImportFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    PostDraft(Composer),
    TemplateBuild(Composer),
    Awaiting(Prompt),
}

impl Session {
    pub fn compose(composer: Composer) -> Self {
        match composer.flow() {
            Flow::PostDraft => Session::PostDraft(composer),
            Flow::TemplateBuild => Session::TemplateBuild(composer),
        }
    }

    pub fn composer_mut(&mut self) -> Option<&mut Composer> {
        match self {
            Session::PostDraft(c) | Session::TemplateBuild(c) => Some(c),
            Session::Awaiting(_) => None,
        }
    }

    pub fn composer(&self) -> Option<&Composer> {
        match self {
            Session::PostDraft(c) | Session::TemplateBuild(c) => Some(c),
            Session::Awaiting(_) => None,
        }
    }
}

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<ActorId, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ActorId, Session>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Starts a session, discarding any previous one. Returns whether one was replaced.
    pub fn start(&self, actor: ActorId, session: Session) -> bool {
        let replaced = self.lock().insert(actor, session);
        if let Some(prev) = &replaced {
            log::debug!("Session of {} replaced (was {:?})", actor, session_kind(prev));
        }
        replaced.is_some()
    }

    pub fn clear(&self, actor: ActorId) -> Option<Session> {
        self.lock().remove(&actor)
    }

    pub fn get(&self, actor: ActorId) -> Option<Session> {
        self.lock().get(&actor).cloned()
    }

    /// Runs `f` on the actor's composer, if a composition session is active.
    /// The session is committed as soon as `f` returns.
    pub fn with_composer<T>(&self, actor: ActorId, f: impl FnOnce(&mut Composer) -> T) -> Option<T> {
        self.lock().get_mut(&actor).and_then(Session::composer_mut).map(f)
    }

    pub fn awaiting(&self, actor: ActorId) -> Option<Prompt> {
        match self.lock().get(&actor) {
            Some(Session::Awaiting(prompt)) => Some(*prompt),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

fn session_kind(session: &Session) -> &'static str {
    match session {
        Session::PostDraft(_) => "post draft",
        Session::TemplateBuild(_) => "template build",
        Session::Awaiting(_) => "prompt",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::machine::{Input, Step};

    #[test]
    fn test_last_write_wins() {
        let store = SessionStore::new();
        assert!(!store.start(1, Session::compose(Composer::post())));
        store.with_composer(1, |c| c.apply(Input::Text("Hello".into())));
        assert!(store.start(1, Session::compose(Composer::template())));

        let session = store.get(1).unwrap();
        assert!(matches!(session, Session::TemplateBuild(_)));
        assert_eq!(session.composer().unwrap().step(), &Step::CollectingCategory);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_steps_are_committed_between_calls() {
        let store = SessionStore::new();
        store.start(7, Session::compose(Composer::post()));
        store.with_composer(7, |c| c.apply(Input::Text("Hello".into())));
        let step = store.with_composer(7, |c| c.step().clone()).unwrap();
        assert_eq!(step, Step::CollectingPhotoOrSkip);
    }

    #[test]
    fn test_clear_and_prompts() {
        let store = SessionStore::new();
        store.start(7, Session::Awaiting(Prompt::AdminAdd));
        assert_eq!(store.awaiting(7), Some(Prompt::AdminAdd));
        assert!(store.with_composer(7, |_| ()).is_none());
        assert!(store.clear(7).is_some());
        assert!(store.is_empty());
    }
}
