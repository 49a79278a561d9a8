#![allow(clippy::unwrap_used)]
#![allow(missing_docs)]

use assert_cmd::cargo_bin_cmd;
use predicates::prelude::predicate;

#[test]
fn test_generate_help() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("gridguide");
    cmd.args(["generate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--lineup"));
}

#[test]
fn test_generate_unknown_provider() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("gridguide");
    cmd.args(["generate", "--provider", "teletext"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--provider"));
}

#[test]
fn test_generate_without_lineup_fails_before_fetch() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();

    // Act & Assert
    let mut cmd = cargo_bin_cmd!("gridguide");
    cmd.arg("--dir")
        .arg(dir.path())
        .arg("generate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("lineup id is required"));
}

#[test]
fn test_config_init_creates_file() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();

    // Act & Assert
    let mut cmd = cargo_bin_cmd!("gridguide");
    cmd.arg("--dir")
        .arg(dir.path())
        .args(["config", "init"])
        .assert()
        .success();
    assert!(dir.path().join("config.toml").exists());
}

#[test]
fn test_config_path_reports_dir_layout() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().display().to_string();

    // Act & Assert
    let mut cmd = cargo_bin_cmd!("gridguide");
    cmd.arg("--dir")
        .arg(dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("{root}/config.toml")))
        .stdout(predicate::str::contains(format!("{root}/cache")));
}

#[test]
fn test_generate_reads_config_from_dir() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "[fetch]\nprovider = \"teletext\"\n",
    )
    .unwrap();

    // Act & Assert
    let mut cmd = cargo_bin_cmd!("gridguide");
    cmd.arg("--dir")
        .arg(dir.path())
        .args(["generate", "--lineup", "USA-OTA10001"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load config"));
}

#[test]
fn test_home_variable_selects_config() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().display().to_string();

    // Act & Assert
    let mut cmd = cargo_bin_cmd!("gridguide");
    cmd.env("GRIDGUIDE_HOME", dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("{root}/config.toml")));
}
