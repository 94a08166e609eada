//! CLI integration tests

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

fn podscribe_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_podscribe"))
}

/// Command isolated from the user's config, library and transcripts
fn isolated(home: &Path) -> Command {
    let mut cmd = podscribe_bin();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("PODSCRIBE_LIBRARY_DIR", home.join("library"))
        .env("PODSCRIBE_TRANSCRIPT_DIR", home.join("transcripts"))
        .env_remove("GEMINI_API_KEY");
    cmd
}

fn home() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn help_output() {
    let output = podscribe_bin()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("transcribe"));
    assert!(stdout.contains("show"));
    assert!(stdout.contains("plan"));
    assert!(stdout.contains("kinds"));
    assert!(stdout.contains("config"));
    assert!(stdout.contains("--verbose"));
}

#[test]
fn transcribe_help_lists_flags() {
    let output = podscribe_bin()
        .args(["transcribe", "--help"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--jobs"));
    assert!(stdout.contains("--max-payload"));
    assert!(stdout.contains("--no-save"));
    assert!(stdout.contains("--library-dir"));
}

#[test]
fn version_output() {
    let output = podscribe_bin()
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("podscribe"));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn config_path_command() {
    let home = home();
    let output = isolated(home.path())
        .args(["config", "path"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("podscribe"));
    assert!(stdout.contains("config.toml"));
}

#[test]
fn config_set_then_get() {
    let home = home();
    let set = isolated(home.path())
        .args(["config", "set", "max_concurrency", "6"])
        .output()
        .expect("Failed to execute command");
    assert!(set.status.success());

    let get = isolated(home.path())
        .args(["config", "get", "max_concurrency"])
        .output()
        .expect("Failed to execute command");
    assert!(get.status.success());
    assert_eq!(String::from_utf8_lossy(&get.stdout).trim(), "6");
}

#[test]
fn kinds_lists_registered_kinds() {
    let home = home();
    let output = isolated(home.path())
        .arg("kinds")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("attachment"));
    assert!(stdout.contains("podcast_segment"));
}

#[test]
fn show_prints_stored_transcript() {
    let home = home();
    let dir = home.path().join("transcripts").join("attachment");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("5.json"),
        r#"{"owner":{"kind":"attachment","id":5},"text":"hello\nworld","created_at":"2026-01-01T00:00:00Z","source_segment_count":2}"#,
    )
    .unwrap();

    let output = isolated(home.path())
        .args(["show", "attachment", "5"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "hello\nworld\n");
}

#[test]
fn show_missing_transcript_fails() {
    let home = home();
    let output = isolated(home.path())
        .args(["show", "podcast_segment", "404"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("No transcript"),
        "Expected missing transcript error, got: {}",
        stderr
    );
}

// Transcribing real audio needs ffmpeg and a backend; the pipeline itself is
// covered by pipeline_tests with in-process doubles
