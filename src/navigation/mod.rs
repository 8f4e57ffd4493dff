//! Index addressing over an actor's template tree
//!
//! Screens are rendered from the current sorted listings and their buttons
//! carry positions, not names. Inbound tokens are re-resolved against fresh
//! listings; a changed tree or an out-of-range position is `StaleIndex`.

pub mod listing;
pub mod token;

use crate::core::error::{AppError, AppResult};
use crate::storage::{ActorId, Repository, TemplatePath};

pub use listing::{page_of, paginate, Page};
pub use token::{decode, encode, position, Address, Position};

/// A node of the tree addressed by a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Category {
        category: String,
    },
    Subcategory {
        category: String,
        subcategory: String,
    },
    Template(TemplatePath),
}

/// Resolves and issues tokens for one actor's tree
pub struct Navigator<'a> {
    repo: &'a Repository,
    actor: ActorId,
    fingerprint: u32,
}

impl<'a> Navigator<'a> {
    pub fn new(repo: &'a Repository, actor: ActorId) -> Self {
        Self {
            repo,
            actor,
            fingerprint: repo.fingerprint(actor),
        }
    }

    pub fn fingerprint(&self) -> u32 {
        self.fingerprint
    }

    /// Token for a node at `positions`, bound to the current tree
    pub fn issue(&self, prefix: &str, positions: &[usize]) -> String {
        let positions: Vec<Position> = positions.iter().copied().map(position).collect();
        encode(prefix, self.fingerprint, &positions)
    }

    fn check_fingerprint(&self, address: &Address) -> AppResult<()> {
        if address.fingerprint == self.fingerprint {
            Ok(())
        } else {
            Err(AppError::StaleIndex(format!(
                "fingerprint {} issued, tree is now {}",
                address.fingerprint, self.fingerprint
            )))
        }
    }

    /// Resolves a hierarchical address of depth 1 to 3.
    pub fn resolve(&self, address: &Address) -> AppResult<Resolved> {
        self.check_fingerprint(address)?;

        let categories = self.repo.list_categories(self.actor);
        let (&g, rest) = address
            .positions
            .split_first()
            .ok_or_else(|| AppError::MalformedToken("empty address".to_string()))?;
        let category = pick(&categories, g, "category")?;
        let Some((&c, rest)) = rest.split_first() else {
            return Ok(Resolved::Category { category });
        };

        let subcategories = self.repo.list_subcategories(self.actor, &category);
        let subcategory = pick(&subcategories, c, "subcategory")?;
        let Some((&n, rest)) = rest.split_first() else {
            return Ok(Resolved::Subcategory { category, subcategory });
        };
        if !rest.is_empty() {
            return Err(AppError::MalformedToken(format!("address too deep: {:?}", address.positions)));
        }

        let names = self.repo.list_names(self.actor, &category, &subcategory);
        let name = pick(&names, n, "name")?;
        Ok(Resolved::Template(TemplatePath::new(category, subcategory, name)))
    }

    /// Resolves a position inside the flat `list_all` listing.
    pub fn resolve_flat(&self, address: &Address) -> AppResult<(usize, TemplatePath)> {
        self.check_fingerprint(address)?;
        let &[index] = address.positions.as_slice() else {
            return Err(AppError::MalformedToken(format!("flat address {:?}", address.positions)));
        };
        let all = self.repo.list_all(self.actor);
        let index = index as usize;
        all.get(index)
            .cloned()
            .map(|path| (index, path))
            .ok_or_else(|| AppError::StaleIndex(format!("item {} of {}", index, all.len())))
    }

    /// Checks a page token's fingerprint; the page number itself is clamped
    /// by [`paginate`] and never fails.
    pub fn check_page(&self, address: &Address) -> AppResult<usize> {
        self.check_fingerprint(address)?;
        Ok(address.positions.first().map(|p| *p as usize).unwrap_or(0))
    }
}

fn pick(items: &[String], index: Position, what: &str) -> AppResult<String> {
    items
        .get(index as usize)
        .cloned()
        .ok_or_else(|| AppError::StaleIndex(format!("{} {} of {}", what, index, items.len())))
}
