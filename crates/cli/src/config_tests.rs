// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn defaults_parse_and_validate() {
    let config =
        Config::try_parse_from(["pomade", "--api-url", "http://localhost:8000", "status"])
            .expect("parse");
    config.validate().expect("validate");
    assert_eq!(config.base_url(), "http://localhost:8000");
    assert_eq!(config.http_timeout(), Duration::from_millis(10_000));
    assert_eq!(config.refresh_margin(), Duration::from_secs(300));
    assert_eq!(config.fallback_interval(), Duration::from_secs(3_600));
    assert!(matches!(config.command, Command::Status));
}

#[test]
fn base_url_trims_trailing_slash() {
    let mut config = Config::test("http://localhost:8000/", PathBuf::from("/tmp"));
    assert_eq!(config.base_url(), "http://localhost:8000");
    config.api_url = "http://localhost:8000".into();
    assert_eq!(config.base_url(), "http://localhost:8000");
}

#[test]
fn session_file_uses_state_dir_override() {
    let config = Config::test("http://x", PathBuf::from("/srv/pomade"));
    assert_eq!(config.session_file(), PathBuf::from("/srv/pomade/session.json"));
}

#[test]
fn validate_rejects_empty_api_url() {
    let mut config = Config::test("http://x", PathBuf::from("/tmp"));
    config.api_url = "  ".into();
    assert!(config.validate().is_err());
}

#[test]
fn validate_rejects_unknown_log_format() {
    let mut config = Config::test("http://x", PathBuf::from("/tmp"));
    config.log_format = "yaml".into();
    assert!(config.validate().is_err());
}

#[test]
fn validate_rejects_zero_fallback_interval() {
    let mut config = Config::test("http://x", PathBuf::from("/tmp"));
    config.fallback_refresh_secs = 0;
    assert!(config.validate().is_err());
}

#[test]
fn login_subcommand_parses_credentials() {
    let config = Config::try_parse_from([
        "pomade",
        "--api-url",
        "http://localhost:8000",
        "login",
        "--email",
        "a@b.com",
        "--password",
        "x",
    ])
    .expect("parse");
    match config.command {
        Command::Login { ref email, ref password } => {
            assert_eq!(email, "a@b.com");
            assert_eq!(password, "x");
        }
        ref other => panic!("expected Login, got {other:?}"),
    }
}

#[test]
fn profile_update_subcommand_parses_fields() {
    let config = Config::try_parse_from([
        "pomade",
        "--api-url",
        "http://localhost:8000",
        "profile",
        "update",
        "--first-name",
        "Ada",
    ])
    .expect("parse");
    match config.command {
        Command::Profile { command: ProfileCommand::Update { ref first_name, .. } } => {
            assert_eq!(first_name.as_deref(), Some("Ada"));
        }
        ref other => panic!("expected Profile Update, got {other:?}"),
    }
}
