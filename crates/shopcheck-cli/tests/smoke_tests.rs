//! Smoke tests for the shopcheck CLI
//!
//! None of these start a browser.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the shopcheck binary
fn shopcheck() -> Command {
    Command::cargo_bin("shopcheck").expect("shopcheck binary should exist")
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    shopcheck()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.4.0"));
}

#[test]
fn test_help_flag() {
    shopcheck()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("credentials"));
}

#[test]
fn test_no_args_shows_help() {
    shopcheck().assert().failure();
}

#[test]
fn test_run_help_mentions_env() {
    shopcheck()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--browser"))
        .stdout(predicate::str::contains("DEFAULT_BROWSER"))
        .stdout(predicate::str::contains("BASE_URL"));
}

#[test]
fn test_run_rejects_unknown_browser() {
    shopcheck()
        .args(["run", "--browser", "safari"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("safari"));
}

// ============================================================================
// List / Credentials
// ============================================================================

#[test]
fn test_list_prints_scenarios() {
    let temp = TempDir::new().unwrap();
    shopcheck()
        .current_dir(temp.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("login::valid_login"))
        .stdout(predicate::str::contains("checkout::two_items_totals"))
        .stdout(predicate::str::contains("login::credentials (skipped"));
}

#[test]
fn test_list_filter() {
    let temp = TempDir::new().unwrap();
    shopcheck()
        .current_dir(temp.path())
        .args(["list", "--filter", "menu::"])
        .assert()
        .success()
        .stdout(predicate::str::contains("menu::open_and_close"))
        .stdout(predicate::str::contains("cart::").not());
}

#[test]
fn test_credentials_writes_file() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("data").join("credentials.csv");

    shopcheck()
        .args(["credentials", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 5 credential cases"));

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.starts_with("case,username,password,expected"));
    assert!(text.contains("locked_out_user,locked_out_user,secret_sauce,locked"));
}

#[test]
fn test_list_picks_up_written_credentials() {
    let temp = TempDir::new().unwrap();

    shopcheck()
        .current_dir(temp.path())
        .arg("credentials")
        .assert()
        .success();

    shopcheck()
        .current_dir(temp.path())
        .args(["list", "--filter", "credentials"])
        .assert()
        .success()
        .stdout(predicate::str::contains("login::credentials[empty_password]"));
}
