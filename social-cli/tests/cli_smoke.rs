//! Smoke tests to verify command wiring

use assert_cmd::Command;
use predicates::prelude::*;

fn social() -> Command {
    let mut cmd = Command::cargo_bin("social").unwrap();
    // Keep the developer's environment out of the tests
    cmd.env_remove("DATABASE_URL")
        .env_remove("DB_ADDR")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_top_level_help_lists_commands() {
    social()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("seed"))
        .stdout(predicate::str::contains("feed"))
        .stdout(predicate::str::contains("health"));
}

#[test]
fn test_seed_help() {
    social()
        .arg("seed")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Number of users"));
}

#[test]
fn test_user_invite_help() {
    social()
        .arg("user")
        .arg("invite")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Unique email address"));
}

#[test]
fn test_feed_help() {
    social()
        .arg("feed")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Comma-separated tags"));
}

#[test]
fn test_post_get_help() {
    social()
        .arg("post")
        .arg("get")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Post ID"));
}

#[test]
fn test_follow_requires_both_ids() {
    social().arg("follow").arg("1").assert().failure();
}

#[test]
fn test_feed_rejects_bad_limit_before_connecting() {
    social()
        .args(["feed", "1", "--limit", "50"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid feed parameters"));
}

#[test]
fn test_missing_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    social()
        .arg("--config")
        .arg(dir.path().join("missing.toml"))
        .arg("health")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}
