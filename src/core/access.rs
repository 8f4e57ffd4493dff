//! Access control gate
//!
//! Every inbound action is classified before any handler runs. Owner-only
//! operations call [`AccessGate::require_owner`] again at the point of use.

use std::sync::Arc;

use crate::core::error::{AppError, AppResult};
use crate::storage::document::ActorId;
use crate::storage::Repository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Owner,
    Admin,
    Unauthorized,
}

impl Role {
    pub fn is_owner(self) -> bool {
        self == Role::Owner
    }
}

#[derive(Clone)]
pub struct AccessGate {
    owner: Option<ActorId>,
    repo: Arc<Repository>,
}

impl AccessGate {
    pub fn new(owner: Option<ActorId>, repo: Arc<Repository>) -> Self {
        Self { owner, repo }
    }

    pub fn owner(&self) -> Option<ActorId> {
        self.owner
    }

    pub fn classify(&self, actor: ActorId) -> Role {
        if self.owner == Some(actor) {
            Role::Owner
        } else if self.repo.is_admin(actor) {
            Role::Admin
        } else {
            Role::Unauthorized
        }
    }

    /// Role of an admitted actor, `Unauthorized` error otherwise
    pub fn admit(&self, actor: ActorId) -> AppResult<Role> {
        match self.classify(actor) {
            Role::Unauthorized => {
                log::debug!("Access denied for {}", actor);
                Err(AppError::Unauthorized(actor))
            }
            role => Ok(role),
        }
    }

    pub fn require_owner(&self, actor: ActorId) -> AppResult<()> {
        if self.classify(actor).is_owner() {
            Ok(())
        } else {
            log::warn!("Owner-only operation requested by {}", actor);
            Err(AppError::OwnerOnly(actor))
        }
    }
}

/// Outcome of a successful channel rights check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelRights {
    pub bot_is_admin: bool,
}

impl ChannelRights {
    /// Warning to show next to the confirmation, if the bot lacks rights
    pub fn warning(&self, channel: i64) -> Option<AppError> {
        (!self.bot_is_admin).then_some(AppError::NotBotAdmin(channel))
    }
}

/// Binding a channel requires the actor to administer it.
/// A bot without admin rights only produces a warning.
pub fn check_channel_rights(
    actor: ActorId,
    bot_id: ActorId,
    channel: i64,
    channel_admins: &[ActorId],
) -> AppResult<ChannelRights> {
    if !channel_admins.contains(&actor) {
        return Err(AppError::NotChannelAdmin { actor, channel });
    }
    Ok(ChannelRights {
        bot_is_admin: channel_admins.contains(&bot_id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Store;
    use tempfile::TempDir;

    fn gate(owner: Option<ActorId>, admins: &[ActorId]) -> (TempDir, AccessGate) {
        let dir = TempDir::new().unwrap();
        let repo = Arc::new(Repository::open(Store::in_dir(dir.path(), owner), admins));
        (dir, AccessGate::new(owner, repo))
    }

    #[test]
    fn test_classify_roles() {
        let (_dir, gate) = gate(Some(100_000), &[200_000]);
        assert_eq!(gate.classify(100_000), Role::Owner);
        assert_eq!(gate.classify(200_000), Role::Admin);
        assert_eq!(gate.classify(300_000), Role::Unauthorized);
    }

    #[test]
    fn test_admit_and_require_owner() {
        let (_dir, gate) = gate(Some(100_000), &[200_000]);
        assert!(matches!(gate.admit(300_000), Err(AppError::Unauthorized(300_000))));
        assert_eq!(gate.admit(200_000).unwrap(), Role::Admin);
        assert!(gate.require_owner(100_000).is_ok());
        assert!(matches!(gate.require_owner(200_000), Err(AppError::OwnerOnly(200_000))));
    }

    #[test]
    fn test_no_owner_configured() {
        let (_dir, gate) = gate(None, &[200_000]);
        assert_eq!(gate.classify(0), Role::Unauthorized);
        assert!(gate.require_owner(200_000).is_err());
    }

    #[test]
    fn test_channel_rights() {
        let admins = [10, 20];
        assert!(matches!(
            check_channel_rights(30, 20, -100, &admins),
            Err(AppError::NotChannelAdmin { actor: 30, channel: -100 })
        ));
        let rights = check_channel_rights(10, 20, -100, &admins).unwrap();
        assert!(rights.bot_is_admin);
        assert!(rights.warning(-100).is_none());

        let rights = check_channel_rights(10, 99, -100, &admins).unwrap();
        assert!(matches!(rights.warning(-100), Some(AppError::NotBotAdmin(-100))));
    }
}
