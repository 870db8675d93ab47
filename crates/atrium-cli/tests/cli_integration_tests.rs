use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn atrium(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("atrium").expect("binary");
    cmd.current_dir(dir.path())
        .env("ATRIUM_DATABASE", dir.path().join("atrium.db"))
        .env("ATRIUM_SCHEDULING__TIMEZONE", "UTC")
        .env_remove("TZ");
    cmd
}

// 2030-01-07 is a Monday; 09:00 UTC is inside the default business hours.

#[test]
fn test_add_and_list_standalone() {
    let dir = TempDir::new().unwrap();

    atrium(&dir)
        .args([
            "add",
            "Morning stretch",
            "--from",
            "2030-01-07T09:00:00Z",
            "--to",
            "2030-01-07T10:00:00Z",
            "--location",
            "Activity Room A",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created activity: Morning stretch"));

    atrium(&dir)
        .args([
            "list",
            "--from",
            "2030-01-07T00:00:00Z",
            "--to",
            "2030-01-08T00:00:00Z",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Morning stretch"))
        .stdout(predicate::str::contains("Activity Room A"))
        .stdout(predicate::str::contains("1 activities"));
}

#[test]
fn test_conflict_exits_4_and_override_succeeds() {
    let dir = TempDir::new().unwrap();

    atrium(&dir)
        .args([
            "add",
            "Art class",
            "--from",
            "2030-01-07T09:00:00Z",
            "--to",
            "2030-01-07T10:00:00Z",
        ])
        .assert()
        .success();

    atrium(&dir)
        .args([
            "add",
            "Music hour",
            "--from",
            "2030-01-07T09:30:00Z",
            "--to",
            "2030-01-07T10:30:00Z",
        ])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Scheduling rejected"))
        .stderr(predicate::str::contains("Art class"));

    atrium(&dir)
        .args([
            "add",
            "Music hour",
            "--from",
            "2030-01-07T09:30:00Z",
            "--to",
            "2030-01-07T10:30:00Z",
            "--allow-conflicts",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("despite warnings"));
}

#[test]
fn test_outside_hours_exits_4() {
    let dir = TempDir::new().unwrap();

    // Saturday evening.
    atrium(&dir)
        .args([
            "add",
            "Night owls",
            "--from",
            "2030-01-05T22:00:00Z",
            "--to",
            "2030-01-05T23:00:00Z",
        ])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("outside the facility's business hours"));

    atrium(&dir)
        .args([
            "add",
            "Night owls",
            "--from",
            "2030-01-05T22:00:00Z",
            "--to",
            "2030-01-05T23:00:00Z",
            "--allow-outside-hours",
        ])
        .assert()
        .success();
}

#[test]
fn test_invalid_input_exits_2() {
    let dir = TempDir::new().unwrap();

    atrium(&dir)
        .args([
            "add",
            "Backwards",
            "--from",
            "2030-01-07T10:00:00Z",
            "--to",
            "2030-01-07T09:00:00Z",
        ])
        .assert()
        .code(2);

    atrium(&dir)
        .args([
            "add",
            "Bad zone",
            "--from",
            "2030-01-07T09:00:00Z",
            "--to",
            "2030-01-07T10:00:00Z",
            "--every",
            "weekly",
            "--timezone",
            "Mars/Olympus",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid timezone"));
}

#[test]
fn test_missing_activity_exits_3() {
    let dir = TempDir::new().unwrap();

    atrium(&dir)
        .args([
            "delete",
            "00000000-0000-0000-0000-000000000001",
            "--force",
        ])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_weekly_series_materializes_occurrences() {
    let dir = TempDir::new().unwrap();

    atrium(&dir)
        .args([
            "add",
            "Chair yoga",
            "--from",
            "2030-01-07T09:00:00Z",
            "--to",
            "2030-01-07T10:00:00Z",
            "--every",
            "weekly",
            "--on",
            "mon,wed,fri",
            "--count",
            "6",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created recurring activity"))
        .stdout(predicate::str::contains("6 occurrences"));

    atrium(&dir)
        .args([
            "list",
            "--from",
            "2030-01-07T00:00:00Z",
            "--to",
            "2030-02-07T00:00:00Z",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("6 activities"));
}

#[test]
fn test_edit_series_scope_is_rejected() {
    let dir = TempDir::new().unwrap();

    atrium(&dir)
        .args([
            "edit",
            "00000000-0000-0000-0000-000000000001",
            "--title",
            "Renamed",
            "--scope",
            "series",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("series"));
}
