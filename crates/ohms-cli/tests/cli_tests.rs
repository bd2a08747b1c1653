//! CLI integration tests for the offline commands.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn ohms() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("ohms").unwrap();
    cmd.env_remove("OHMS_BASE_URL");
    cmd
}

/// A temp dir populated by `ohms init`.
fn initialized() -> TempDir {
    let dir = TempDir::new().unwrap();
    ohms()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .arg("init")
        .assert()
        .success();
    dir
}

#[test]
fn help_output() {
    ohms()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Online homework"));
}

#[test]
fn version_output() {
    ohms()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ohms"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    ohms()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created ohms.toml"))
        .stdout(predicate::str::contains("Created homework/example.toml"))
        .stdout(predicate::str::contains("Created gradebook.toml"));

    assert!(dir.path().join("ohms.toml").exists());
    assert!(dir.path().join("homework/example.toml").exists());
    assert!(dir.path().join("gradebook.toml").exists());
}

#[test]
fn init_skips_existing() {
    let dir = initialized();

    ohms()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn validate_example_homework() {
    let dir = initialized();

    ohms()
        .current_dir(dir.path())
        .args(["validate", "--homework", "homework/example.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 questions, 10 points"))
        .stdout(predicate::str::contains("All homework files valid"));
}

#[test]
fn validate_directory_reports_warnings() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("broken.toml"),
        r#"
[homework]
id = "hw9"
name = "Broken"

[[questions]]
id = "q1"
points = 1

[[questions.items]]
type = "mc"
options = ["only"]

[[questions]]
id = "q1"
points = 1
"#,
    )
    .unwrap();

    ohms()
        .args(["validate", "--homework"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Homework: Broken"))
        .stdout(predicate::str::contains("[q1] WARNING: duplicate question ID"))
        .stdout(predicate::str::contains("fewer than two options"))
        .stdout(predicate::str::contains("warning(s) found"));
}

#[test]
fn validate_nonexistent_file() {
    ohms()
        .args(["validate", "--homework", "nonexistent.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn stats_table() {
    let dir = initialized();

    ohms()
        .current_dir(dir.path())
        .args(["stats", "--gradebook", "gradebook.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Homework 1"))
        .stdout(predicate::str::contains("8.00"))
        .stdout(predicate::str::contains("1.63"))
        .stdout(predicate::str::contains("Homework 2"));
}

#[test]
fn stats_json_separates_excused_and_missing() {
    let dir = initialized();

    let output = ohms()
        .current_dir(dir.path())
        .args(["stats", "--gradebook", "gradebook.toml", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let columns: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let hw2 = &columns[1];
    assert_eq!(hw2["excused"], serde_json::json!(["S2"]));
    assert_eq!(hw2["missing"], serde_json::json!(["S3"]));
    assert_eq!(hw2["summary"]["count"], 1);
    assert_eq!(hw2["summary"]["std_dev"], 0.0);
}

#[test]
fn stats_unknown_assignment() {
    let dir = initialized();

    ohms()
        .current_dir(dir.path())
        .args(["stats", "--gradebook", "gradebook.toml", "--assignment", "hw9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown assignment: hw9"));
}

#[test]
fn stats_all_excused_reports_no_data() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("book.toml");
    std::fs::write(
        &path,
        r#"
[[assignments]]
id = "quiz"
max_score = 5

[[students]]
id = "S1"
scores = { quiz = "EX" }
"#,
    )
    .unwrap();

    ohms()
        .args(["stats", "--format", "markdown", "--gradebook"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("| quiz | 0 | 0 | 1 | no data |"));
}

#[test]
fn grades_table() {
    let dir = initialized();

    ohms()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .args(["grades", "--gradebook", "gradebook.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("95.0%"))
        .stdout(predicate::str::contains("80.0%"))
        .stdout(predicate::str::contains("B-"))
        .stdout(predicate::str::contains("NP"));
}

#[test]
fn grades_with_custom_cutoffs() {
    let dir = initialized();

    let output = ohms()
        .current_dir(dir.path())
        .args([
            "grades",
            "--gradebook",
            "gradebook.toml",
            "--format",
            "json",
            "--cutoffs",
            "50,45,40,35,30,25,20,15,10,5,2,1",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["grades"][0]["grade"], "A+");
    assert_eq!(report["grades"][2]["grade"], "B");
}

#[test]
fn grades_rejects_bad_cutoffs() {
    let dir = initialized();

    ohms()
        .current_dir(dir.path())
        .args(["grades", "--gradebook", "gradebook.toml", "--cutoffs", "90,80"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected 12 cutoffs"));
}

#[test]
fn grades_saves_report() {
    let dir = initialized();

    ohms()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .args([
            "grades",
            "--gradebook",
            "gradebook.toml",
            "--output",
            "reports/latest.json",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Report saved to"));

    let saved = std::fs::read_to_string(dir.path().join("reports/latest.json")).unwrap();
    let report: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(report["student_count"], 3);
    assert_eq!(report["letters"]["grades"][1]["grade"], "B-");
}

#[test]
fn grades_for_one_assignment() {
    let dir = initialized();

    let output = ohms()
        .current_dir(dir.path())
        .args([
            "grades",
            "--gradebook",
            "gradebook.toml",
            "--assignment",
            "hw1",
            "--format",
            "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["grades"][0]["grade"], "A+");
    assert_eq!(report["grades"][1]["grade"], "B-");
    // 60% sits on the D- cutoff, which is not a pass.
    assert_eq!(report["grades"][2]["grade"], "NP");
    assert_eq!(report["counts"]["NP"], 1);
}
