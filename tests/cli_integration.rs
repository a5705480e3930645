//! Integration tests for CLI commands.
//!
//! These tests verify CLI behavior without requiring a downloaded model,
//! ffmpeg, or a running server.

use assert_cmd::Command;
use predicates::prelude::*;

/// Get a Command for the sttd binary
fn sttd() -> Command {
    Command::cargo_bin("sttd").unwrap()
}

#[test]
fn test_help_command() {
    sttd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Speech-to-text HTTP service"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("model"))
        .stdout(predicate::str::contains("transcribe"));
}

#[test]
fn test_version_command() {
    sttd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sttd"));
}

#[test]
fn test_model_list() {
    let home = tempfile::tempdir().unwrap();
    sttd()
        .args(["model", "list"])
        .env("HOME", home.path())
        .env_remove("XDG_DATA_HOME")
        .assert()
        .success()
        .stdout(predicate::str::contains("tiny"))
        .stdout(predicate::str::contains("base"))
        .stdout(predicate::str::contains("small"))
        .stdout(predicate::str::contains("medium"))
        .stdout(predicate::str::contains("large-v3"));
}

#[test]
fn test_model_download_unknown_tier() {
    sttd()
        .args(["model", "download", "enormous"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown model tier"));
}

#[test]
fn test_serve_without_model_fails() {
    // Fresh HOME means no downloaded model; startup must fail cleanly
    // (either at the ffmpeg probe or at model load) instead of binding.
    let home = tempfile::tempdir().unwrap();
    sttd()
        .arg("serve")
        .env("HOME", home.path())
        .env_remove("XDG_DATA_HOME")
        .env("WHISPER_MODEL", "tiny")
        .timeout(std::time::Duration::from_secs(60))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_serve_with_missing_config_fails() {
    sttd()
        .args(["--config", "/nonexistent/sttd.toml", "serve"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_transcribe_missing_file_fails() {
    sttd()
        .args(["transcribe", "/nonexistent/clip.webm"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_config_file_is_honored() {
    // An unknown model tier in the config file must surface as an error
    // when serving.
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("sttd.toml");
    std::fs::write(&config_path, "model = \"gigantic\"\n").unwrap();

    sttd()
        .arg("--config")
        .arg(&config_path)
        .arg("serve")
        .env_remove("WHISPER_MODEL")
        .timeout(std::time::Duration::from_secs(60))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown model tier"));
}
