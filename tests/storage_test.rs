//! Integration tests for the persisted document: round trips, cascading
//! deletes, crash safety of saves and one-time migrations
//!
//! Run with: cargo test --test storage_test

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;

use chanpost::storage::document::CURRENT_VERSION;
use chanpost::storage::{ActorId, ChannelRef, LinkButton, Repository, Store, TemplateEntry};

const OWNER: ActorId = 100_001;
const ADMIN: ActorId = 200_002;

fn open(dir: &TempDir) -> Repository {
    Repository::open(Store::in_dir(dir.path(), Some(OWNER)), &[])
}

fn entry(text: &str) -> TemplateEntry {
    TemplateEntry {
        text: text.to_string(),
        photo: None,
        buttons: Vec::new(),
    }
}

fn read_json(dir: &TempDir) -> Value {
    let raw = std::fs::read_to_string(dir.path().join("storage.json")).unwrap();
    serde_json::from_str(&raw).unwrap()
}

// ============================================================================
// Round trips
// ============================================================================

#[test]
fn test_put_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let stored = TemplateEntry {
        text: "<b>Hello</b>".to_string(),
        photo: Some("AgACAgIAAx".to_string()),
        buttons: vec![
            vec![LinkButton::new("Buy", "https://shop.example")],
            vec![LinkButton::new("Info", "https://info.example")],
        ],
    };
    open(&dir).put(ADMIN, "Game", "Cheat", "Promo", stored.clone()).unwrap();

    let reopened = open(&dir);
    assert_eq!(reopened.get(ADMIN, "Game", "Cheat", "Promo").unwrap(), stored);
    assert_eq!(reopened.template_count(ADMIN), 1);
    assert_eq!(reopened.template_count(OWNER), 0);
}

#[test]
fn test_button_wire_keys_are_short() {
    let dir = TempDir::new().unwrap();
    let repo = open(&dir);
    let with_button = TemplateEntry {
        buttons: vec![vec![LinkButton::new("Buy", "https://shop.example")]],
        ..entry("Hello")
    };
    repo.put(ADMIN, "Game", "Cheat", "Promo", with_button).unwrap();

    let raw = read_json(&dir);
    let stored = &raw["templates"][ADMIN.to_string()]["Game"]["Cheat"]["Promo"];
    assert_eq!(stored["buttons"], json!([[{"t": "Buy", "u": "https://shop.example"}]]));
    assert_eq!(raw["version"], json!(CURRENT_VERSION));
}

#[test]
fn test_channel_binding_round_trip() {
    let dir = TempDir::new().unwrap();
    open(&dir)
        .bind_channel(ADMIN, ChannelRef::new(-100_123, "News"))
        .unwrap();

    let reopened = open(&dir);
    let channel = reopened.channel_of(ADMIN).unwrap();
    assert_eq!(channel.label(), "News (-100123)");
    assert!(reopened.unbind_channel(ADMIN).unwrap());
    assert!(!reopened.unbind_channel(ADMIN).unwrap());
    assert_eq!(open(&dir).channel_of(ADMIN), None);
}

#[test]
fn test_export_then_import_reproduces_tree() {
    let source_dir = TempDir::new().unwrap();
    let source = open(&source_dir);
    let promo = TemplateEntry {
        text: "<b>Sale</b> today".to_string(),
        photo: Some("AgACAgIAAx".to_string()),
        buttons: vec![
            vec![
                LinkButton::new("Buy", "https://shop.example"),
                LinkButton::new("Docs", "http://docs.example/a?b=c"),
            ],
            vec![LinkButton::new("Info", "https://info.example")],
        ],
    };
    source.put(ADMIN, "Game", "Cheat", "Promo", promo).unwrap();
    source.put(ADMIN, "apps", "Tools", "Zip", entry("plain")).unwrap();
    let loose = TemplateEntry {
        text: "loose".to_string(),
        photo: Some(String::new()),
        buttons: vec![vec![LinkButton::new("Go", " https://go.example ")], Vec::new()],
    };
    source.put(ADMIN, "apps", "Tools", "Loose", loose).unwrap();

    let exported = serde_json::to_value(source.export_all(ADMIN)).unwrap();
    let target_dir = TempDir::new().unwrap();
    let target = open(&target_dir);
    let report = target.import_json(ADMIN, &exported).unwrap();

    assert_eq!(report.merged, 3);
    assert_eq!(report.skipped, 0);
    assert_eq!(target.export_all(ADMIN), source.export_all(ADMIN));
    assert_eq!(open(&target_dir).export_all(ADMIN), source.export_all(ADMIN));
}

// ============================================================================
// Cascading deletes
// ============================================================================

#[test]
fn test_delete_leaves_no_empty_containers() {
    let dir = TempDir::new().unwrap();
    let repo = open(&dir);
    repo.put(ADMIN, "Game", "Cheat", "Promo", entry("a")).unwrap();
    repo.put(ADMIN, "Game", "Cheat", "Other", entry("b")).unwrap();
    repo.put(ADMIN, "Game", "Mods", "Skin", entry("c")).unwrap();

    repo.delete(ADMIN, "Game", "Cheat", "Promo").unwrap();
    assert_eq!(repo.list_names(ADMIN, "Game", "Cheat"), vec!["Other".to_string()]);

    repo.delete(ADMIN, "Game", "Cheat", "Other").unwrap();
    assert_eq!(repo.list_subcategories(ADMIN, "Game"), vec!["Mods".to_string()]);

    repo.delete(ADMIN, "Game", "Mods", "Skin").unwrap();
    assert!(repo.list_categories(ADMIN).is_empty());

    let raw = read_json(&dir);
    assert!(raw["templates"].get(ADMIN.to_string()).is_none());
}

#[test]
fn test_delete_missing_is_not_found() {
    let dir = TempDir::new().unwrap();
    let repo = open(&dir);
    repo.put(ADMIN, "Game", "Cheat", "Promo", entry("a")).unwrap();
    let err = repo.delete(ADMIN, "Game", "Cheat", "Nope").unwrap_err();
    assert_eq!(err.kind(), "not_found");
    assert_eq!(repo.template_count(ADMIN), 1);
}

// ============================================================================
// Crash safety
// ============================================================================

#[test]
fn test_abandoned_write_leaves_previous_document() {
    let dir = TempDir::new().unwrap();
    let repo = open(&dir);
    repo.put(ADMIN, "Game", "Cheat", "Promo", entry("before")).unwrap();
    let before = std::fs::read_to_string(repo.store().path()).unwrap();

    // Simulate a crash between writing the temporary file and the rename
    let mut changed = repo.snapshot();
    changed.admins.push(555_555);
    let staged = repo.store().stage(&changed).unwrap();
    assert!(staged.temp_path().exists());
    let leftover = staged.abandon().unwrap();

    let after = std::fs::read_to_string(repo.store().path()).unwrap();
    assert_eq!(after, before);
    assert!(leftover.exists());

    let reopened = open(&dir);
    assert!(!reopened.admins().contains(&555_555));
    assert_eq!(reopened.get(ADMIN, "Game", "Cheat", "Promo").unwrap().text, "before");
}

#[test]
fn test_committed_write_replaces_document() {
    let dir = TempDir::new().unwrap();
    let repo = open(&dir);
    let mut changed = repo.snapshot();
    changed.admins.push(555_555);
    changed.admins.sort_unstable();
    repo.store().stage(&changed).unwrap().commit().unwrap();

    assert!(open(&dir).admins().contains(&555_555));
}

#[test]
fn test_corrupt_file_is_copied_aside() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("storage.json"), "{ not json").unwrap();

    let repo = open(&dir);
    assert_eq!(repo.template_count(ADMIN), 0);

    let copies: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("storage.json.corrupt-"))
        .collect();
    assert_eq!(copies.len(), 1);
    let preserved = std::fs::read_to_string(dir.path().join(&copies[0])).unwrap();
    assert_eq!(preserved, "{ not json");
}

// ============================================================================
// Migrations
// ============================================================================

#[test]
fn test_legacy_document_migrates_once() {
    let dir = TempDir::new().unwrap();
    let legacy = json!({
        "admins": [ADMIN],
        "channels": { ADMIN.to_string(): -100_555 },
        "channel_titles": { ADMIN.to_string(): "News (-100555)" },
        "templates": {
            "Game": { "Cheat": { "Promo": { "text": "shared", "photo": null, "buttons": [] } } }
        }
    });
    std::fs::write(dir.path().join("storage.json"), legacy.to_string()).unwrap();

    let repo = open(&dir);
    assert_eq!(repo.get(OWNER, "Game", "Cheat", "Promo").unwrap().text, "shared");
    assert_eq!(repo.channel_of(ADMIN), Some(ChannelRef::new(-100_555, "News")));
    drop(repo);

    let first = read_json(&dir);
    assert_eq!(first["version"], json!(CURRENT_VERSION));
    assert!(first.get("channel_titles").is_none());

    let repo = open(&dir);
    assert_eq!(repo.template_count(OWNER), 1);
    drop(repo);
    assert_eq!(read_json(&dir), first);
}

#[test]
fn test_missing_sections_are_backfilled() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("storage.json"), r#"{"version": 2, "admins": []}"#).unwrap();

    let repo = Repository::open(Store::in_dir(dir.path(), Some(OWNER)), &[ADMIN]);
    assert!(repo.is_admin(ADMIN));
    assert!(repo.is_admin(OWNER));

    let raw = read_json(&dir);
    assert!(raw["channels"].is_object());
    assert!(raw["templates"].is_object());
}
