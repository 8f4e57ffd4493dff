//! Template repository: the only way the document is read or changed
//!
//! The in-memory [`Document`] sits behind a single mutex. Every mutation is
//! applied to a copy, persisted through the [`Store`], and only swapped in
//! once the save succeeded, so memory never drifts from disk and writers
//! from different actors are serialized.

use std::cmp::Ordering;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use itertools::Itertools;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::runtime::{Handle, RuntimeFlavor};

use super::document::{
    count_leaves, normalize_admins, parse_tree, ActorId, ChannelRef, Document, TemplateEntry, TemplateTree,
};
use super::store::Store;
use crate::core::error::{AppError, AppResult};
use crate::core::validation::validate_name;

/// Full taxonomy address of a template
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplatePath {
    pub category: String,
    pub subcategory: String,
    pub name: String,
}

impl TemplatePath {
    pub fn new(category: impl Into<String>, subcategory: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            subcategory: subcategory.into(),
            name: name.into(),
        }
    }

    fn sort_key(&self) -> [&str; 3] {
        [&self.category, &self.subcategory, &self.name]
    }
}

impl fmt::Display for TemplatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.category, self.subcategory, self.name)
    }
}

/// Case-insensitive order with the raw string as a tie-break, so the
/// result is fully determined by the set of names.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

/// Runs blocking file I/O. Inside a multi-threaded tokio runtime the
/// current worker hands its queued tasks off first.
fn blocking_io<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => tokio::task::block_in_place(f),
        _ => f(),
    }
}

fn sorted_keys<'a>(keys: impl Iterator<Item = &'a String>) -> Vec<String> {
    keys.sorted_by(|a, b| compare_names(a, b)).cloned().collect()
}

/// Counts reported by [`Repository::import_json`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub merged: usize,
    pub skipped: usize,
}

pub struct Repository {
    store: Store,
    doc: Mutex<Document>,
}

impl Repository {
    /// Loads the document, seeds the admin roster (owner + `seed_admins`)
    /// and persists whatever load/migration changed.
    pub fn open(store: Store, seed_admins: &[ActorId]) -> Self {
        let loaded = store.load();
        let mut document = loaded.document;
        let before = document.admins.clone();
        document.admins.extend_from_slice(seed_admins);
        normalize_admins(&mut document.admins, store.owner());
        let roster_changed = document.admins != before;

        if loaded.needs_persist || roster_changed {
            match store.save(&document) {
                Ok(()) => log::info!("Storage written to {}", store.path().display()),
                Err(e) => log::error!("Failed to persist storage after load: {}", e),
            }
        }
        log::info!(
            "Storage loaded: {} admins, {} channel bindings, {} template namespaces",
            document.admins.len(),
            document.channels.len(),
            document.templates.len()
        );

        Self {
            store,
            doc: Mutex::new(document),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    fn lock(&self) -> MutexGuard<'_, Document> {
        self.doc.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read<T>(&self, f: impl FnOnce(&Document) -> T) -> T {
        f(&self.lock())
    }

    /// Applies `f` to a copy, saves it, then publishes it.
    /// On any error the visible document is unchanged.
    ///
    /// The lock is held through the save, so writers are serialized. On a
    /// multi-threaded runtime the save runs under `block_in_place`, and the
    /// worker's other tasks move to another thread meanwhile.
    fn mutate<T>(&self, f: impl FnOnce(&mut Document) -> AppResult<T>) -> AppResult<T> {
        let mut guard = self.lock();
        let mut draft = guard.clone();
        let out = f(&mut draft)?;
        blocking_io(|| self.store.save(&draft))?;
        *guard = draft;
        Ok(out)
    }

    /// Deep copy of the whole document
    pub fn snapshot(&self) -> Document {
        self.read(Clone::clone)
    }

    pub fn list_categories(&self, actor: ActorId) -> Vec<String> {
        self.read(|doc| {
            doc.tree(actor)
                .map(|tree| sorted_keys(tree.keys()))
                .unwrap_or_default()
        })
    }

    pub fn list_subcategories(&self, actor: ActorId, category: &str) -> Vec<String> {
        self.read(|doc| {
            doc.tree(actor)
                .and_then(|tree| tree.get(category))
                .map(|subs| sorted_keys(subs.keys()))
                .unwrap_or_default()
        })
    }

    pub fn list_names(&self, actor: ActorId, category: &str, subcategory: &str) -> Vec<String> {
        self.read(|doc| {
            doc.tree(actor)
                .and_then(|tree| tree.get(category))
                .and_then(|subs| subs.get(subcategory))
                .map(|names| sorted_keys(names.keys()))
                .unwrap_or_default()
        })
    }

    /// Every template of the actor as a flat, sorted list
    pub fn list_all(&self, actor: ActorId) -> Vec<TemplatePath> {
        self.read(|doc| flatten(doc.tree(actor)))
    }

    pub fn template_count(&self, actor: ActorId) -> usize {
        self.read(|doc| doc.tree(actor).map(count_leaves).unwrap_or(0))
    }

    /// 32-bit digest of the actor's path set. Changes whenever a template
    /// is added, removed or renamed, which shifts listing positions.
    pub fn fingerprint(&self, actor: ActorId) -> u32 {
        fingerprint_of(&self.list_all(actor))
    }

    pub fn get(&self, actor: ActorId, category: &str, subcategory: &str, name: &str) -> AppResult<TemplateEntry> {
        self.read(|doc| {
            doc.tree(actor)
                .and_then(|tree| tree.get(category))
                .and_then(|subs| subs.get(subcategory))
                .and_then(|names| names.get(name))
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("{} / {} / {}", category, subcategory, name)))
        })
    }

    /// Upsert; intermediate containers are created as needed.
    pub fn put(
        &self,
        actor: ActorId,
        category: &str,
        subcategory: &str,
        name: &str,
        entry: TemplateEntry,
    ) -> AppResult<()> {
        let category = validate_name(category, "Category")?;
        let subcategory = validate_name(subcategory, "Subcategory")?;
        let name = validate_name(name, "Template name")?;
        let entry = entry.normalized()?;
        self.mutate(|doc| {
            doc.templates
                .entry(actor)
                .or_default()
                .entry(category)
                .or_default()
                .entry(subcategory)
                .or_default()
                .insert(name, entry);
            Ok(())
        })
    }

    /// Removes the leaf and any ancestors left empty.
    pub fn delete(&self, actor: ActorId, category: &str, subcategory: &str, name: &str) -> AppResult<()> {
        let not_found = || AppError::NotFound(format!("{} / {} / {}", category, subcategory, name));
        self.mutate(|doc| {
            let tree = doc.templates.get_mut(&actor).ok_or_else(not_found)?;
            let subs = tree.get_mut(category).ok_or_else(not_found)?;
            let names = subs.get_mut(subcategory).ok_or_else(not_found)?;
            names.remove(name).ok_or_else(not_found)?;

            if names.is_empty() {
                subs.remove(subcategory);
            }
            if subs.is_empty() {
                tree.remove(category);
            }
            if tree.is_empty() {
                doc.templates.remove(&actor);
            }
            Ok(())
        })
    }

    pub fn export_all(&self, actor: ActorId) -> TemplateTree {
        self.read(|doc| doc.tree(actor).cloned().unwrap_or_default())
    }

    /// Leaf-by-leaf merge, last write wins. Returns the number of leaves written.
    pub fn import_merge(&self, actor: ActorId, incoming: TemplateTree) -> AppResult<usize> {
        let count = count_leaves(&incoming);
        if count == 0 {
            return Ok(0);
        }
        self.mutate(|doc| {
            let tree = doc.templates.entry(actor).or_default();
            for (category, subs) in incoming {
                for (subcategory, names) in subs {
                    if names.is_empty() {
                        continue;
                    }
                    tree.entry(category.clone())
                        .or_default()
                        .entry(subcategory)
                        .or_default()
                        .extend(names);
                }
            }
            Ok(count)
        })
    }

    /// Imports an untrusted JSON payload. A non-object root rejects the
    /// whole payload; malformed branches below it are skipped.
    pub fn import_json(&self, actor: ActorId, payload: &Value) -> AppResult<ImportReport> {
        if !payload.is_object() {
            return Err(AppError::Import("the file must contain a JSON object".to_string()));
        }
        let parsed = parse_tree(payload);
        let skipped = parsed.skipped;
        let merged = self.import_merge(actor, parsed.tree)?;
        log::info!("Import for {}: {} merged, {} skipped", actor, merged, skipped);
        Ok(ImportReport { merged, skipped })
    }

    pub fn admins(&self) -> Vec<ActorId> {
        self.read(|doc| doc.admins.clone())
    }

    pub fn is_admin(&self, actor: ActorId) -> bool {
        self.store.owner() == Some(actor) || self.read(|doc| doc.admins.binary_search(&actor).is_ok())
    }

    /// Returns `false` when the id was already an admin.
    pub fn add_admin(&self, id: ActorId) -> AppResult<bool> {
        if self.read(|doc| doc.admins.contains(&id)) {
            return Ok(false);
        }
        self.mutate(|doc| {
            doc.admins.push(id);
            normalize_admins(&mut doc.admins, None);
            Ok(true)
        })
    }

    /// Returns `false` when the id was not an admin. The owner cannot be removed.
    pub fn remove_admin(&self, id: ActorId) -> AppResult<bool> {
        if self.store.owner() == Some(id) {
            return Err(AppError::Validation("The owner cannot be removed from admins".to_string()));
        }
        if !self.read(|doc| doc.admins.contains(&id)) {
            return Ok(false);
        }
        self.mutate(|doc| {
            doc.admins.retain(|a| *a != id);
            Ok(true)
        })
    }

    pub fn channel_of(&self, actor: ActorId) -> Option<ChannelRef> {
        self.read(|doc| doc.channels.get(&actor).cloned())
    }

    pub fn bind_channel(&self, actor: ActorId, channel: ChannelRef) -> AppResult<()> {
        self.mutate(|doc| {
            doc.channels.insert(actor, channel);
            Ok(())
        })
    }

    /// Returns `false` when nothing was bound.
    pub fn unbind_channel(&self, actor: ActorId) -> AppResult<bool> {
        if self.channel_of(actor).is_none() {
            return Ok(false);
        }
        self.mutate(|doc| Ok(doc.channels.remove(&actor).is_some()))
    }
}

fn flatten(tree: Option<&TemplateTree>) -> Vec<TemplatePath> {
    let Some(tree) = tree else {
        return Vec::new();
    };
    tree.iter()
        .flat_map(|(category, subs)| {
            subs.iter().flat_map(move |(subcategory, names)| {
                names
                    .keys()
                    .map(move |name| TemplatePath::new(category, subcategory, name))
            })
        })
        .sorted_by(|a, b| {
            a.sort_key()
                .iter()
                .zip(b.sort_key().iter())
                .map(|(x, y)| compare_names(x, y))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        })
        .collect()
}

/// First four bytes (big-endian) of SHA-256 over the ordered paths
pub fn fingerprint_of(paths: &[TemplatePath]) -> u32 {
    let mut hasher = Sha256::new();
    for path in paths {
        hasher.update(path.category.as_bytes());
        hasher.update([0u8]);
        hasher.update(path.subcategory.as_bytes());
        hasher.update([0u8]);
        hasher.update(path.name.as_bytes());
        hasher.update([b'\n']);
    }
    let digest = hasher.finalize();
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}
