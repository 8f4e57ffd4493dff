//! Persisted document model
//!
//! The whole bot state lives in one JSON document:
//!
//! ```json
//! {
//!   "version": 2,
//!   "admins": [111111, 222222],
//!   "channels": { "111111": { "id": -1001234567890, "title": "News" } },
//!   "templates": { "111111": { "Game": { "Cheat": { "Promo": { "text": "...", "photo": null, "buttons": [[{"t": "Buy", "u": "https://..."}]] } } } } }
//! }
//! ```
//!
//! Parsing is lenient: every section is read on its own and malformed
//! branches are skipped instead of failing the whole load.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::{AppError, AppResult};
use crate::core::validation::{is_valid_button_url, normalize_name};

/// Telegram user id of an operator
pub type ActorId = i64;

/// Schema version written by this build
pub const CURRENT_VERSION: u32 = 2;

/// Namespace receiving legacy shared templates when no owner is configured
pub const FALLBACK_NAMESPACE: ActorId = 0;

/// A URL button shown under a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkButton {
    #[serde(rename = "t")]
    pub label: String,
    #[serde(rename = "u")]
    pub url: String,
}

impl LinkButton {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let label = obj.get("t")?.as_str()?.trim();
        let url = obj.get("u")?.as_str()?.trim();
        if label.is_empty() || !is_valid_button_url(url) {
            return None;
        }
        Some(Self::new(label, url))
    }
}

/// A saved post: text, optional photo and a row-major grid of buttons
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEntry {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub buttons: Vec<Vec<LinkButton>>,
}

impl TemplateEntry {
    /// Reads an entry from untrusted JSON. Returns `None` when the value is not an object.
    ///
    /// Buttons that are not `{t, u}` objects with an http(s) url are dropped,
    /// and rows left empty by that are dropped too.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let text = obj.get("text").and_then(Value::as_str).unwrap_or_default().to_string();
        let photo = obj
            .get("photo")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        let buttons = obj
            .get("buttons")
            .and_then(Value::as_array)
            .map(|rows| {
                rows.iter()
                    .filter_map(Value::as_array)
                    .map(|row| row.iter().filter_map(LinkButton::from_value).collect::<Vec<_>>())
                    .filter(|row| !row.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Some(Self { text, photo, buttons })
    }

    /// Brings an entry into its stored shape: labels and urls trimmed,
    /// empty rows dropped, an empty photo treated as none.
    ///
    /// Unlike [`TemplateEntry::from_value`], a bad button is an error here
    /// rather than being skipped, since it comes from a trusted caller.
    pub fn normalized(self) -> AppResult<Self> {
        let mut buttons = Vec::with_capacity(self.buttons.len());
        for row in self.buttons {
            let mut checked = Vec::with_capacity(row.len());
            for button in row {
                let label = button.label.trim();
                let url = button.url.trim();
                if label.is_empty() {
                    return Err(AppError::Validation("Button label must not be empty".to_string()));
                }
                if !is_valid_button_url(url) {
                    return Err(AppError::Validation(format!("Button link must start with http:// or https://: {}", url)));
                }
                checked.push(LinkButton::new(label, url));
            }
            if !checked.is_empty() {
                buttons.push(checked);
            }
        }
        let photo = self.photo.filter(|p| !p.is_empty());
        Ok(Self {
            text: self.text,
            photo,
            buttons,
        })
    }

    pub fn button_count(&self) -> usize {
        self.buttons.iter().map(Vec::len).sum()
    }
}

pub type NameMap = BTreeMap<String, TemplateEntry>;
pub type SubcategoryMap = BTreeMap<String, NameMap>;

/// category → subcategory → name → entry
pub type TemplateTree = BTreeMap<String, SubcategoryMap>;

/// Result of a lenient tree parse
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTree {
    pub tree: TemplateTree,
    /// Branches or leaves ignored because they had the wrong shape
    pub skipped: usize,
}

/// Validates container types at every level, skipping malformed branches.
///
/// Empty names and containers that end up empty are not kept, so the
/// result never carries dangling intermediate maps.
pub fn parse_tree(value: &Value) -> ParsedTree {
    let mut parsed = ParsedTree::default();
    let Some(categories) = value.as_object() else {
        parsed.skipped += 1;
        return parsed;
    };

    for (category, subcategories) in categories {
        let (Some(category), Some(subcategories)) = (normalize_name(category), subcategories.as_object()) else {
            parsed.skipped += 1;
            continue;
        };
        let mut sub_map = SubcategoryMap::new();
        for (subcategory, names) in subcategories {
            let (Some(subcategory), Some(names)) = (normalize_name(subcategory), names.as_object()) else {
                parsed.skipped += 1;
                continue;
            };
            let mut name_map = NameMap::new();
            for (name, payload) in names {
                match (normalize_name(name), TemplateEntry::from_value(payload)) {
                    (Some(name), Some(entry)) => {
                        name_map.insert(name, entry);
                    }
                    _ => parsed.skipped += 1,
                }
            }
            if !name_map.is_empty() {
                sub_map.insert(subcategory, name_map);
            }
        }
        if !sub_map.is_empty() {
            parsed.tree.insert(category, sub_map);
        }
    }
    parsed
}

pub fn count_leaves(tree: &TemplateTree) -> usize {
    tree.values().flat_map(|subs| subs.values()).map(BTreeMap::len).sum()
}

/// The actor's destination channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRef {
    pub id: i64,
    pub title: String,
}

impl ChannelRef {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self { id, title: title.into() }
    }

    /// "Title (id)" as shown on the settings button
    pub fn label(&self) -> String {
        format!("{} ({})", self.title, self.id)
    }
}

/// Root persisted object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub version: u32,
    /// Sorted and deduplicated
    pub admins: Vec<ActorId>,
    pub channels: BTreeMap<ActorId, ChannelRef>,
    pub templates: BTreeMap<ActorId, TemplateTree>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            admins: Vec::new(),
            channels: BTreeMap::new(),
            templates: BTreeMap::new(),
        }
    }
}

/// What `Document::from_value` had to repair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Sections that were missing or had the wrong type and got defaults
    pub backfilled: Vec<&'static str>,
    /// Entries dropped because of bad keys or shapes
    pub skipped: usize,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.backfilled.is_empty() && self.skipped == 0
    }
}

impl Document {
    /// Builds a document from a JSON root, backfilling every missing or
    /// malformed section with its default.
    pub fn from_value(root: &serde_json::Map<String, Value>) -> (Self, LoadReport) {
        let mut report = LoadReport::default();
        let mut doc = Document::default();

        match root.get("version").and_then(Value::as_u64) {
            Some(v) => doc.version = u32::try_from(v).unwrap_or(CURRENT_VERSION),
            None => report.backfilled.push("version"),
        }

        match root.get("admins").and_then(Value::as_array) {
            Some(items) => {
                for item in items {
                    match item.as_i64() {
                        Some(id) => doc.admins.push(id),
                        None => report.skipped += 1,
                    }
                }
            }
            None => report.backfilled.push("admins"),
        }
        normalize_admins(&mut doc.admins, None);

        match root.get("channels").and_then(Value::as_object) {
            Some(channels) => {
                for (key, value) in channels {
                    let actor = parse_actor_key(key);
                    let channel = value.as_object().and_then(|obj| {
                        let id = obj.get("id")?.as_i64()?;
                        let title = obj.get("title").and_then(Value::as_str).unwrap_or("Channel");
                        Some(ChannelRef::new(id, title))
                    });
                    match (actor, channel) {
                        (Some(actor), Some(channel)) => {
                            doc.channels.insert(actor, channel);
                        }
                        _ => report.skipped += 1,
                    }
                }
            }
            None => report.backfilled.push("channels"),
        }

        match root.get("templates").and_then(Value::as_object) {
            Some(namespaces) => {
                for (key, value) in namespaces {
                    let Some(actor) = parse_actor_key(key) else {
                        report.skipped += 1;
                        continue;
                    };
                    let parsed = parse_tree(value);
                    report.skipped += parsed.skipped;
                    if !parsed.tree.is_empty() {
                        doc.templates.insert(actor, parsed.tree);
                    }
                }
            }
            None => report.backfilled.push("templates"),
        }

        (doc, report)
    }

    /// Template tree of one actor, if any
    pub fn tree(&self, actor: ActorId) -> Option<&TemplateTree> {
        self.templates.get(&actor)
    }
}

/// Sorts, deduplicates and optionally adds the owner.
pub fn normalize_admins(admins: &mut Vec<ActorId>, owner: Option<ActorId>) {
    if let Some(owner) = owner {
        admins.push(owner);
    }
    admins.sort_unstable();
    admins.dedup();
}

/// Actor ids are stored as JSON object keys, i.e. strings.
pub fn parse_actor_key(key: &str) -> Option<ActorId> {
    key.trim().parse::<ActorId>().ok()
}
