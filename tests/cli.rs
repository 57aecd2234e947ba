use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn ksexpire(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ksexpire").expect("bin");
    cmd.env("KSEXPIRE_DATA_DIR", data_dir).env_remove("KSEXPIRE_LOG");
    cmd
}

fn add_tv(data_dir: &Path) {
    ksexpire(data_dir)
        .args([
            "item",
            "add-warranty",
            "Living room TV",
            "--purchased",
            "2024-01-15",
            "--months",
            "24",
            "--price",
            "799.99",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added warranty: Living room TV (ID: 1)"));
}

fn add_streaming(data_dir: &Path) {
    ksexpire(data_dir)
        .args([
            "item",
            "add-subscription",
            "Streaming",
            "--price",
            "12.50",
            "--frequency",
            "monthly",
        ])
        .assert()
        .success();
}

#[test]
fn help_lists_commands() {
    let temp = TempDir::new().unwrap();
    ksexpire(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("item"))
        .stdout(predicate::str::contains("backup"));
}

#[test]
fn add_and_list_items() {
    let temp = TempDir::new().unwrap();
    add_tv(temp.path());
    add_streaming(temp.path());

    ksexpire(temp.path())
        .args(["item", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Living room TV"))
        .stdout(predicate::str::contains("Streaming"))
        .stdout(predicate::str::contains("$12.50"));

    ksexpire(temp.path())
        .args(["item", "show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Warranty ends: 2026-01-15"));
}

#[test]
fn add_warranty_requires_end_date() {
    let temp = TempDir::new().unwrap();
    ksexpire(temp.path())
        .args(["item", "add-warranty", "Blender"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--expires or --months"));
}

#[test]
fn deactivated_items_hidden_from_default_list() {
    let temp = TempDir::new().unwrap();
    add_tv(temp.path());

    ksexpire(temp.path())
        .args(["item", "deactivate", "Living room TV"])
        .assert()
        .success();

    ksexpire(temp.path())
        .args(["item", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No items found."));

    ksexpire(temp.path())
        .args(["item", "list", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Inactive"));
}

#[test]
fn purge_removes_inactive_items() {
    let temp = TempDir::new().unwrap();
    add_tv(temp.path());
    add_streaming(temp.path());

    ksexpire(temp.path())
        .args(["item", "deactivate", "Living room TV"])
        .assert()
        .success();

    ksexpire(temp.path())
        .args(["item", "purge", "--days", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Living room TV (ID: 1)"))
        .stdout(predicate::str::contains("--force"));

    ksexpire(temp.path())
        .args(["item", "purge", "--days", "0", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Purged 1 inactive item(s):"))
        .stdout(predicate::str::contains("Items remaining: 1"));

    ksexpire(temp.path())
        .args(["item", "list", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Streaming"))
        .stdout(predicate::str::contains("Living room TV").not());
}

#[test]
fn backup_create_and_validate() {
    let temp = TempDir::new().unwrap();
    add_tv(temp.path());

    ksexpire(temp.path())
        .args(["backup", "create"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Backup created:"))
        .stdout(predicate::str::contains("Items:  1"));

    let backups: Vec<_> = fs::read_dir(temp.path().join("backups"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(backups.len(), 1);
    assert!(backups[0].starts_with("ks_expire_backup_"));
    assert!(backups[0].ends_with(".zip"));

    ksexpire(temp.path())
        .args(["backup", "validate", "latest"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Status: Valid"));

    ksexpire(temp.path())
        .args(["backup", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 1 backup(s)"));
}

#[test]
fn restore_into_another_data_dir() {
    let source = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    let archive = source.path().join("export.zip");

    add_tv(source.path());
    add_streaming(source.path());
    ksexpire(source.path())
        .args(["backup", "create", "--output"])
        .arg(&archive)
        .assert()
        .success();

    ksexpire(target.path())
        .args(["backup", "restore"])
        .arg(&archive)
        .arg("--force")
        .assert()
        .success()
        .stdout(predicate::str::contains("Items restored: 2"));

    ksexpire(target.path())
        .args(["item", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Living room TV"))
        .stdout(predicate::str::contains("Streaming"));

    ksexpire(target.path())
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("export.zip"));
}

#[test]
fn restore_without_force_changes_nothing() {
    let temp = TempDir::new().unwrap();
    add_tv(temp.path());
    let archive = temp.path().join("one.zip");
    ksexpire(temp.path())
        .args(["backup", "create", "--output"])
        .arg(&archive)
        .assert()
        .success();

    add_streaming(temp.path());

    ksexpire(temp.path())
        .args(["backup", "restore"])
        .arg(&archive)
        .assert()
        .success()
        .stdout(predicate::str::contains("--force"));

    ksexpire(temp.path())
        .args(["item", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Streaming"));
}

#[test]
fn empty_backup_cannot_be_restored() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("empty.zip");

    ksexpire(temp.path())
        .args(["backup", "create", "--output"])
        .arg(&archive)
        .assert()
        .success()
        .stdout(predicate::str::contains("Items:  0"));

    ksexpire(temp.path())
        .args(["backup", "restore"])
        .arg(&archive)
        .arg("--force")
        .assert()
        .success()
        .stdout(predicate::str::contains("Invalid (missing item data)"))
        .stdout(predicate::str::contains("cannot be restored"));
}

#[test]
fn validate_rejects_non_archive() {
    let temp = TempDir::new().unwrap();
    let bogus = temp.path().join("notes.zip");
    fs::write(&bogus, "shopping list ".repeat(20)).unwrap();

    ksexpire(temp.path())
        .args(["backup", "validate"])
        .arg(&bogus)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid backup archive"));
}

#[test]
fn config_shows_paths() {
    let temp = TempDir::new().unwrap();
    ksexpire(temp.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Restore mode:    replace"))
        .stdout(predicate::str::contains("receipts"));
}
