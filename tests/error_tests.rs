//! Error scenario integration tests

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn podscribe(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("podscribe").expect("binary should build");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("PODSCRIBE_LIBRARY_DIR", home.join("library"))
        .env("PODSCRIBE_TRANSCRIPT_DIR", home.join("transcripts"))
        .env_remove("GEMINI_API_KEY");
    cmd
}

#[test]
fn missing_api_key_error() {
    let home = tempfile::tempdir().unwrap();

    podscribe(home.path())
        .args(["transcribe", "podcast_segment", "1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("API key"));
}

#[test]
fn unknown_kind_is_a_usage_error() {
    let home = tempfile::tempdir().unwrap();

    podscribe(home.path())
        .args(["transcribe", "voicemail", "1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown kind").and(predicate::str::contains("attachment")));
}

#[test]
fn invalid_max_payload_is_a_usage_error() {
    let home = tempfile::tempdir().unwrap();

    podscribe(home.path())
        .args(["transcribe", "attachment", "1", "--max-payload", "lots"])
        .assert()
        .code(2);
}

#[test]
fn missing_entity_is_a_usage_error() {
    let home = tempfile::tempdir().unwrap();

    podscribe(home.path())
        .env("GEMINI_API_KEY", "test-key")
        .args(["transcribe", "attachment", "77"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("attachment#77"));
}

#[test]
fn empty_audio_is_rejected_without_a_backend_call() {
    let home = tempfile::tempdir().unwrap();
    let dir = home.path().join("library").join("podcast_segment");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("3.ogg"), b"").unwrap();

    podscribe(home.path())
        .env("GEMINI_API_KEY", "test-key")
        .env("GEMINI_API_BASE_URL", "http://127.0.0.1:9")
        .args(["transcribe", "podcast_segment", "3"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("empty"));
    assert!(!home.path().join("transcripts").exists());
}

#[test]
fn non_numeric_id_is_rejected_by_parser() {
    let home = tempfile::tempdir().unwrap();

    podscribe(home.path())
        .args(["transcribe", "attachment", "abc"])
        .assert()
        .code(2);
}

#[test]
fn plan_reports_unreadable_file() {
    let home = tempfile::tempdir().unwrap();

    podscribe(home.path())
        .args(["plan", "/nonexistent/episode.mp3"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Cannot read"));
}

#[test]
fn config_get_unknown_key() {
    let home = tempfile::tempdir().unwrap();

    podscribe(home.path())
        .args(["config", "get", "unknown_key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Valid keys"));
}

#[test]
fn config_set_invalid_duration() {
    let home = tempfile::tempdir().unwrap();

    podscribe(home.path())
        .args(["config", "set", "call_timeout", "forever"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("call_timeout"));
}

#[test]
fn config_set_invalid_log_format() {
    let home = tempfile::tempdir().unwrap();

    podscribe(home.path())
        .args(["config", "set", "log_format", "xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("pretty"));
}

#[test]
fn config_list_with_no_file() {
    let home = tempfile::tempdir().unwrap();

    podscribe(home.path())
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("api_key").and(predicate::str::contains("(not set)")));
}
