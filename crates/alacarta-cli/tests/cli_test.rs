#![allow(clippy::unwrap_used)]
#![allow(missing_docs)]

use assert_cmd::cargo_bin_cmd;
use predicates::prelude::predicate;

#[test]
fn test_help_lists_subcommands() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("alacarta");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("programs"))
        .stdout(predicate::str::contains("play"))
        .stdout(predicate::str::contains("--cache-dir"));
}

#[test]
fn test_letters_lists_alphabet() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();

    // Act & Assert
    let mut cmd = cargo_bin_cmd!("alacarta");
    cmd.arg("--dir")
        .arg(dir.path())
        .arg("letters")
        .assert()
        .success()
        .stdout(predicate::str::contains("A B C"))
        .stdout(predicate::str::contains("X Y Z"));
}

#[test]
fn test_programs_rejects_invalid_letter() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();

    // Act & Assert
    let mut cmd = cargo_bin_cmd!("alacarta");
    cmd.arg("--dir")
        .arg(dir.path())
        .args(["programs", "--letter", "1", "--no-cache"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid letter"));
}

#[test]
fn test_programs_missing_letter() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("alacarta");
    cmd.args(["programs"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--letter"));
}

#[test]
fn test_play_help() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("alacarta");
    cmd.args(["play", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--video"));
}

#[test]
fn test_play_rejects_non_numeric_id() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("alacarta");
    cmd.args(["play", "--video", "abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--video"));
}

#[test]
fn test_cache_enable_then_show() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let cache_dir = dir.path().join("responses");

    // Act
    let mut enable = cargo_bin_cmd!("alacarta");
    enable
        .arg("--dir")
        .arg(dir.path())
        .args(["cache", "enable", "--path"])
        .arg(&cache_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Cache enabled"));

    // Assert
    let saved = std::fs::read_to_string(dir.path().join("config.toml")).unwrap();
    assert!(saved.contains("enabled = true"));

    let mut show = cargo_bin_cmd!("alacarta");
    show.arg("--dir")
        .arg(dir.path())
        .args(["cache", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Enabled: true"))
        .stdout(predicate::str::contains("responses"));
}

#[test]
fn test_cache_disable_keeps_directory_setting() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "[cache]\nenabled = true\ndir = \"/var/cache/alacarta\"\n",
    )
    .unwrap();

    // Act
    let mut cmd = cargo_bin_cmd!("alacarta");
    cmd.arg("--dir")
        .arg(dir.path())
        .args(["cache", "disable"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cache disabled"));

    // Assert
    let saved = std::fs::read_to_string(dir.path().join("config.toml")).unwrap();
    assert!(saved.contains("enabled = false"));
    assert!(saved.contains("/var/cache/alacarta"));
}

fn saved_cache_dir(config_dir: &std::path::Path) -> String {
    let saved = std::fs::read_to_string(config_dir.join("config.toml")).unwrap();
    saved
        .lines()
        .find_map(|line| line.strip_prefix("dir = "))
        .unwrap()
        .trim_matches(['"', '\''])
        .to_owned()
}

#[test]
fn test_cache_enable_without_path_saves_generated_directory() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();

    // Act
    let mut enable = cargo_bin_cmd!("alacarta");
    enable
        .env("TMPDIR", dir.path())
        .arg("--dir")
        .arg(dir.path())
        .args(["cache", "enable"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cache enabled"));

    // Assert
    let generated = saved_cache_dir(dir.path());
    assert!(generated.contains("alacarta-cache-"));
    assert!(std::path::Path::new(&generated).is_dir());

    let mut show = cargo_bin_cmd!("alacarta");
    show.arg("--dir")
        .arg(dir.path())
        .args(["cache", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains(generated.as_str()));
}

#[test]
fn test_enabled_cache_without_directory_is_reused_across_runs() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("config.toml"), "[cache]\nenabled = true\n").unwrap();

    // Act
    let mut first = cargo_bin_cmd!("alacarta");
    first
        .env("TMPDIR", dir.path())
        .arg("--dir")
        .arg(dir.path())
        .arg("letters")
        .assert()
        .success();
    let after_first = saved_cache_dir(dir.path());

    let mut second = cargo_bin_cmd!("alacarta");
    second
        .env("TMPDIR", dir.path())
        .arg("--dir")
        .arg(dir.path())
        .arg("letters")
        .assert()
        .success();
    let after_second = saved_cache_dir(dir.path());

    // Assert
    assert_eq!(after_first, after_second);
    let generated: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().starts_with("alacarta-cache-"))
        .collect();
    assert_eq!(generated.len(), 1);
}
