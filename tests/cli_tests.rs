#![cfg(feature = "cli")]

use assert_cmd::Command;
use predicates::str::contains as str_contains;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[allow(deprecated)]
fn cli(db: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.arg("--db").arg(db).arg("--project").arg("PRJ");
    cmd
}

fn workspace() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("create temp dir");
    let db = dir.path().join("p6.db");
    cli(&db).arg("init").assert().success();
    (dir, db)
}

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write csv");
    path
}

fn count(db: &Path, table: &str) -> i64 {
    let conn = Connection::open(db).unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn cli_imports_activities_and_reminds_to_reschedule() {
    let (dir, db) = workspace();
    let activities = write(
        &dir,
        "activities.csv",
        "Activity_ID,Activity_Name,Duration_Days,Predecessors\n\
         A100,Design,5,\n\
         A200,Build,10,A100[FS+2d]\n",
    );

    cli(&db)
        .arg("activities")
        .arg(&activities)
        .assert()
        .success()
        .stdout(str_contains("SUCCESS"))
        .stdout(str_contains("press F9"));

    assert_eq!(count(&db, "TASK"), 2);
    assert_eq!(count(&db, "TASKPRED"), 1);
}

#[test]
fn cli_fails_before_touching_the_database_when_the_file_is_missing() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("never-created.db");

    cli(&db)
        .arg("activities")
        .arg(dir.path().join("missing.csv"))
        .assert()
        .failure()
        .stderr(str_contains("was not found"));

    assert!(!db.exists());
}

#[test]
fn cli_rejects_files_without_required_columns() {
    let (dir, db) = workspace();
    let wbs = write(&dir, "wbs.csv", "WBS Short Name,WBS Name\nENG,Engineering\n");

    cli(&db)
        .arg("wbs")
        .arg(&wbs)
        .assert()
        .failure()
        .stderr(str_contains("Parent WBS Name"));
}

#[test]
fn cli_rolls_back_when_a_parent_is_out_of_order() {
    let (dir, db) = workspace();
    let wbs = write(
        &dir,
        "wbs.csv",
        "WBS Short Name,WBS Name,Parent WBS Name\n\
         ENG,Engineering,\n\
         MECH.1,Mechanical Design,Mechanical\n\
         MECH,Mechanical,\n",
    );

    cli(&db)
        .arg("wbs")
        .arg(&wbs)
        .assert()
        .failure()
        .stderr(str_contains("rolled back"))
        .stderr(str_contains("Mechanical"));

    assert_eq!(count(&db, "PROJWBS"), 1);
}

#[test]
fn cli_import_runs_hierarchy_and_activities_together() {
    let (dir, db) = workspace();
    let wbs = write(
        &dir,
        "wbs.csv",
        "WBS Short Name,WBS Name,Parent WBS Name\n\
         ENG,Engineering,\n",
    );
    let activities = write(
        &dir,
        "activities.csv",
        "Activity_ID,Activity_Name,Duration_Days,WBS_Name,Predecessors\n\
         A100,Design,5,Engineering,\n\
         A200,Build,10,,\"A100, GHOST\"\n",
    );

    cli(&db)
        .arg("import")
        .arg("--wbs")
        .arg(&wbs)
        .arg("--activities")
        .arg(&activities)
        .assert()
        .success()
        .stdout(str_contains("GHOST"))
        .stdout(str_contains("relationships=1"));

    assert_eq!(count(&db, "PROJWBS"), 2);
    assert_eq!(count(&db, "TASK"), 2);
}
