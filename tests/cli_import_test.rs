//! Integration tests for bulk import via CLI.
//!
//! Covers the upload pipeline behaviors: batch validation (in-file
//! duplicates, date ordering), ID normalization, lenient field
//! coercion, and the skip-or-override duplicate resolution flow.

use predicates::prelude::*;
use std::path::PathBuf;

mod common;
use common::TestEnv;

/// Write a JSON import file into the test data dir and return its path.
fn write_batch(env: &TestEnv, name: &str, contents: &str) -> PathBuf {
    let path = env.data_path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

const BATCH: &str = r#"[
    {
        "studyId": "ct-101",
        "title": "Cardio outcomes",
        "phase": "Phase 2",
        "status": "Recruiting",
        "enrollmentTarget": 100,
        "currentEnrollment": 45,
        "startDate": "2024-01-15",
        "plannedEndDate": "2026-06-30"
    },
    {
        "studyId": "CT-102",
        "title": "Oncology trial",
        "phase": "Phase 3",
        "status": "Not yet recruiting",
        "enrollmentTarget": "250",
        "currentEnrollment": 0,
        "startDate": "2025-09-01T00:00:00Z",
        "plannedEndDate": "2027-03-01"
    }
]"#;

#[test]
fn test_import_adds_records() {
    let env = TestEnv::init();
    let batch = write_batch(&env, "batch.json", BATCH);

    env.ct()
        .args(["import", batch.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"studyId\":\"CT-101\""))
        .stdout(predicate::str::contains("\"duplicates\":[]"));

    // Numeric string target coerced, datetime start date trimmed to a day
    env.ct()
        .args(["study", "show", "CT-102"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"enrollmentTarget\":250"))
        .stdout(predicate::str::contains("\"startDate\":\"2025-09-01\""));
}

#[test]
fn test_import_human_summary() {
    let env = TestEnv::init();
    let batch = write_batch(&env, "batch.json", BATCH);

    env.ct()
        .args(["import", batch.to_str().unwrap(), "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2 studies"))
        .stdout(predicate::str::contains("added CT-101"));
}

#[test]
fn test_import_skips_duplicates_by_default() {
    let env = TestEnv::init();
    env.add_study("CT-101", "Stored title", "Phase 1", "Recruiting");
    let batch = write_batch(&env, "batch.json", BATCH);

    env.ct()
        .args(["import", batch.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"overridden\":false"));

    // Stored record untouched
    env.ct()
        .args(["study", "show", "CT-101"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"title\":\"Stored title\""));
}

#[test]
fn test_import_override_replaces_duplicates() {
    let env = TestEnv::init();
    env.add_study("CT-101", "Stored title", "Phase 1", "Recruiting");
    let batch = write_batch(&env, "batch.json", BATCH);

    env.ct()
        .args(["import", batch.to_str().unwrap(), "--override"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"overridden\":true"));

    env.ct()
        .args(["study", "show", "CT-101"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"title\":\"Cardio outcomes\""))
        .stdout(predicate::str::contains("\"phase\":\"Phase 2\""));
}

#[test]
fn test_import_rejects_in_file_duplicates() {
    let env = TestEnv::init();
    let batch = write_batch(
        &env,
        "batch.json",
        r#"[
            {"studyId": "CT-101", "title": "A", "phase": "Phase 1", "status": "Recruiting"},
            {"studyId": " ct-101 ", "title": "B", "phase": "Phase 2", "status": "Recruiting"}
        ]"#,
    );

    env.ct()
        .args(["import", batch.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate study IDs"))
        .stderr(predicate::str::contains("CT-101"));

    // Nothing was applied
    env.ct()
        .args(["study", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total\":0"));
}

#[test]
fn test_import_rejects_misordered_dates() {
    let env = TestEnv::init();
    let batch = write_batch(
        &env,
        "batch.json",
        r#"[{
            "studyId": "CT-101",
            "title": "A",
            "phase": "Phase 1",
            "status": "Recruiting",
            "startDate": "2026-01-01",
            "plannedEndDate": "2025-01-01"
        }]"#,
    );

    env.ct()
        .args(["import", batch.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("start date is later"));
}

#[test]
fn test_import_rejects_unknown_status() {
    let env = TestEnv::init();
    let batch = write_batch(
        &env,
        "batch.json",
        r#"[{"studyId": "CT-101", "title": "A", "phase": "Phase 1", "status": "Paused"}]"#,
    );

    env.ct()
        .args(["import", batch.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid input"));
}

#[test]
fn test_import_missing_file() {
    let env = TestEnv::init();

    env.ct()
        .args(["import", "no-such-file.json"])
        .assert()
        .failure();
}
