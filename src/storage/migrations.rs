//! One-time upgrades of the raw storage document
//!
//! Migrations operate on the raw JSON root before it is parsed into a
//! [`Document`](super::document::Document), so legacy shapes that the typed
//! model no longer accepts can still be recognised and rewritten.

use serde_json::{Map, Value};

use super::document::{ActorId, CURRENT_VERSION, FALLBACK_NAMESPACE};

/// Whether a top-level `templates` key is already an actor namespace.
///
/// Telegram user ids have at least five digits; the fallback namespace `0`
/// is reserved and also counts, so a document migrated without an owner is
/// not wrapped a second time.
pub fn looks_like_actor_key(key: &str) -> bool {
    if key == FALLBACK_NAMESPACE.to_string() {
        return true;
    }
    let digits = key.strip_prefix('-').unwrap_or(key);
    digits.len() >= 5 && digits.chars().all(|c| c.is_ascii_digit())
}

/// Wraps a legacy shared `templates` tree under the owner's namespace
/// (or the fallback namespace). Returns `true` when the root was changed.
pub fn migrate_shared_templates(root: &mut Map<String, Value>, owner: Option<ActorId>) -> bool {
    let Some(Value::Object(templates)) = root.get("templates") else {
        return false;
    };
    if templates.is_empty() || templates.keys().all(|k| looks_like_actor_key(k)) {
        return false;
    }

    let namespace = owner.unwrap_or(FALLBACK_NAMESPACE).to_string();
    log::info!(
        "Migrating {} shared template categories into namespace {}",
        templates.len(),
        namespace
    );
    let shared = root.remove("templates").unwrap_or_default();
    let mut wrapped = Map::new();
    wrapped.insert(namespace, shared);
    root.insert("templates".to_string(), Value::Object(wrapped));
    true
}

/// Folds the legacy `channels: {actor: id}` + `channel_titles: {actor: "Title (id)"}`
/// pair into `channels: {actor: {id, title}}`. Returns `true` when the root was changed.
pub fn fold_channel_titles(root: &mut Map<String, Value>) -> bool {
    let titles = match root.remove("channel_titles") {
        Some(Value::Object(titles)) => titles,
        Some(_) => return true,
        None => Map::new(),
    };
    let mut changed = !titles.is_empty();

    if let Some(Value::Object(channels)) = root.get_mut("channels") {
        for (actor, value) in channels.iter_mut() {
            let Some(id) = value.as_i64() else {
                continue;
            };
            let title = titles
                .get(actor)
                .and_then(Value::as_str)
                .map(|label| strip_id_suffix(label, id))
                .unwrap_or_else(|| "Channel".to_string());
            *value = serde_json::json!({ "id": id, "title": title });
            changed = true;
        }
    }
    changed
}

/// "News (-100123)" → "News"
fn strip_id_suffix(label: &str, id: i64) -> String {
    let suffix = format!(" ({})", id);
    label.strip_suffix(&suffix).unwrap_or(label).trim().to_string()
}

/// Runs every migration and stamps the current version.
/// Returns `true` if anything changed and the document must be persisted.
pub fn run(root: &mut Map<String, Value>, owner: Option<ActorId>) -> bool {
    let mut changed = migrate_shared_templates(root, owner);
    changed |= fold_channel_titles(root);

    let version = root.get("version").and_then(Value::as_u64);
    if version != Some(u64::from(CURRENT_VERSION)) {
        root.insert("version".to_string(), Value::from(CURRENT_VERSION));
        changed = true;
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test fixture must be an object"),
        }
    }

    #[test]
    fn test_actor_key_shapes() {
        assert!(looks_like_actor_key("123456789"));
        assert!(looks_like_actor_key("-1001234567"));
        assert!(looks_like_actor_key("0"));
        assert!(!looks_like_actor_key("2024"));
        assert!(!looks_like_actor_key("Dota 2"));
        assert!(!looks_like_actor_key("-"));
    }

    #[test]
    fn test_shared_templates_wrapped_under_owner() {
        let mut root = object(json!({"templates": {"Game": {"Cheat": {"Promo": {"text": "x"}}}}}));
        assert!(migrate_shared_templates(&mut root, Some(555555)));
        assert_eq!(root["templates"]["555555"]["Game"]["Cheat"]["Promo"]["text"], json!("x"));
    }

    #[test]
    fn test_shared_templates_wrapped_under_fallback() {
        let mut root = object(json!({"templates": {"Game": {}}}));
        assert!(migrate_shared_templates(&mut root, None));
        assert!(root["templates"].get("0").is_some());
    }

    #[test]
    fn test_migration_is_idempotent() {
        for owner in [Some(555555), None] {
            let mut root = object(json!({"templates": {"Game": {"Cheat": {"Promo": {"text": "x"}}}}}));
            assert!(run(&mut root, owner));
            let once = root.clone();
            assert!(!run(&mut root, owner));
            assert_eq!(root, once);
        }
    }

    #[test]
    fn test_per_actor_templates_untouched() {
        let mut root = object(json!({"templates": {"123456": {"Game": {}}}}));
        assert!(!migrate_shared_templates(&mut root, Some(555555)));
        assert!(root["templates"].get("123456").is_some());
    }

    #[test]
    fn test_fold_channel_titles() {
        let mut root = object(json!({
            "channels": {"123456": -100777},
            "channel_titles": {"123456": "News (-100777)"}
        }));
        assert!(fold_channel_titles(&mut root));
        assert_eq!(root["channels"]["123456"], json!({"id": -100777, "title": "News"}));
        assert!(root.get("channel_titles").is_none());
        assert!(!fold_channel_titles(&mut root));
    }
}
