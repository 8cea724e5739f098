// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

fn temp_store() -> (tempfile::TempDir, TokenStore) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = TokenStore::open(dir.path().join("session.json"));
    (dir, store)
}

fn env_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> =
        vars.iter().map(|&(k, v)| (k.to_owned(), v.to_owned())).collect();
    move |name: &str| map.get(name).cloned()
}

#[test]
fn fresh_store_is_logged_out() {
    let (_dir, store) = temp_store();
    let session = store.tokens();
    assert_eq!(session.access_token, None);
    assert_eq!(session.refresh_token, None);
    assert!(!store.is_authenticated());
}

#[test]
fn save_and_read_back_both_tokens() {
    let (_dir, store) = temp_store();
    store.save("A1".into(), Some("R1".into()));

    let session = store.tokens();
    assert_eq!(session.access_token.as_deref(), Some("A1"));
    assert_eq!(session.refresh_token.as_deref(), Some("R1"));
    assert!(store.is_authenticated());
}

#[test]
fn access_only_save_preserves_refresh_token() {
    let (_dir, store) = temp_store();
    store.save("A1".into(), Some("R1".into()));
    store.save("A2".into(), None);

    let session = store.tokens();
    assert_eq!(session.access_token.as_deref(), Some("A2"));
    assert_eq!(session.refresh_token.as_deref(), Some("R1"));
}

#[test]
fn access_token_alone_is_not_authenticated() {
    let (_dir, store) = temp_store();
    store.save("A1".into(), None);
    assert!(!store.is_authenticated());
}

#[test]
fn clear_removes_both_tokens_and_is_idempotent() {
    let (_dir, store) = temp_store();
    store.save("A1".into(), Some("R1".into()));

    store.clear();
    store.clear();

    let session = store.tokens();
    assert_eq!(session.access_token, None);
    assert_eq!(session.refresh_token, None);
    assert!(!store.is_authenticated());
}

#[test]
fn session_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("session.json");

    let store = TokenStore::open(path.clone());
    store.save("A1".into(), Some("R1".into()));
    drop(store);

    let reopened = TokenStore::open(path);
    assert_eq!(reopened.access_token().as_deref(), Some("A1"));
    assert_eq!(reopened.refresh_token().as_deref(), Some("R1"));
}

#[test]
fn corrupt_session_file_loads_as_logged_out() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{not valid json").expect("write");

    let store = TokenStore::open(path);
    assert!(!store.is_authenticated());
    assert_eq!(store.access_token(), None);
}

#[test]
fn clear_removes_the_file_on_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("session.json");

    let store = TokenStore::open(path.clone());
    store.save("A1".into(), Some("R1".into()));
    assert!(path.exists());

    store.clear();
    assert!(!path.exists());
}

#[test]
fn save_user_persists_alongside_tokens() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("session.json");

    let store = TokenStore::open(path.clone());
    store.save("A1".into(), Some("R1".into()));
    store.save_user(AdminUser {
        id: Some(7),
        email: "a@b.com".into(),
        ..AdminUser::default()
    });

    let reopened = TokenStore::open(path);
    let user = reopened.user().expect("user");
    assert_eq!(user.id, Some(7));
    assert_eq!(user.email, "a@b.com");
    // Tokens are untouched by the user write.
    assert!(reopened.is_authenticated());
}

#[test]
fn state_dir_prefers_explicit_override() {
    let dir = state_dir_with(env_from(&[
        ("POMADE_STATE_DIR", "/srv/pomade"),
        ("XDG_STATE_HOME", "/xdg"),
        ("HOME", "/home/admin"),
    ]));
    assert_eq!(dir, PathBuf::from("/srv/pomade"));
}

#[test]
fn state_dir_falls_back_xdg_then_home() {
    let xdg = state_dir_with(env_from(&[("XDG_STATE_HOME", "/xdg"), ("HOME", "/home/admin")]));
    assert_eq!(xdg, PathBuf::from("/xdg/pomade"));

    let home = state_dir_with(env_from(&[("HOME", "/home/admin")]));
    assert_eq!(home, PathBuf::from("/home/admin/.local/state/pomade"));

    let bare = state_dir_with(env_from(&[]));
    assert_eq!(bare, PathBuf::from(".pomade"));
}
