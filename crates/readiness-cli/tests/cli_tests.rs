//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn readiness() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("readiness").unwrap();
    cmd.env_remove("READINESS_CATALOG")
        .env_remove("READINESS_STATE")
        .env("RUST_LOG", "warn");
    cmd
}

/// A temp dir with `readiness init` already run in it.
fn initialized() -> TempDir {
    let dir = TempDir::new().unwrap();
    readiness()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();
    dir
}

fn student(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = readiness();
    cmd.current_dir(dir)
        .args(args)
        .args(["--learner", "s-1", "--grade", "8"]);
    cmd
}

fn begin_attempt_id(dir: &Path) -> String {
    let output = student(dir, &["begin", "--assessment", "fire-cert", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let begun: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    begun["attempt_id"].as_str().unwrap().to_string()
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    readiness()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created readiness.toml"))
        .stdout(predicate::str::contains("Created catalog/example.toml"));

    assert!(dir.path().join("readiness.toml").exists());
    assert!(dir.path().join("catalog/example.toml").exists());
}

#[test]
fn init_skips_existing() {
    let dir = initialized();

    readiness()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("readiness.toml already exists"))
        .stdout(predicate::str::contains("catalog/example.toml already exists"));
}

#[test]
fn validate_example_catalog() {
    let dir = initialized();

    readiness()
        .current_dir(dir.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 modules, 1 assessments"))
        .stdout(predicate::str::contains("Catalog valid."));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(
        &path,
        r#"
[[assessments]]
id = "orphan"
module_id = "missing"
max_attempts = 0

[[assessments.questions]]
id = "q1"
prompt = "?"
options = ["a", "b"]
correct_answer = "c"
"#,
    )
    .unwrap();

    readiness()
        .arg("validate")
        .arg("--catalog")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[orphan] WARNING"))
        .stdout(predicate::str::contains("unknown module: missing"))
        .stdout(predicate::str::contains("max_attempts is 0"))
        .stdout(predicate::str::contains("not among its options"))
        .stdout(predicate::str::contains("3 warning(s) found."));
}

#[test]
fn validate_nonexistent_file() {
    readiness()
        .arg("validate")
        .arg("--catalog")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn modules_follow_audience() {
    let dir = initialized();

    student(dir.path(), &["modules"])
        .assert()
        .success()
        .stdout(predicate::str::contains("secondary audience"))
        .stdout(predicate::str::contains("fire-basics"))
        .stdout(predicate::str::contains("quake-kids").not());

    readiness()
        .current_dir(dir.path())
        .args(["modules", "--learner", "s-2", "--grade", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("primary audience"))
        .stdout(predicate::str::contains("quake-kids"));
}

#[test]
fn activity_requires_started_module() {
    let dir = initialized();

    student(
        dir.path(),
        &["activity", "--module", "fire-basics", "--percent", "40"],
    )
    .assert()
    .failure()
    .code(1)
    .stderr(predicate::str::contains("invalid state"));

    student(dir.path(), &["start", "--module", "fire-basics"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fire-basics: in_progress"));

    student(
        dir.path(),
        &[
            "activity",
            "--module",
            "fire-basics",
            "--percent",
            "40",
            "--minutes",
            "12",
        ],
    )
    .assert()
    .success()
    .stdout(predicate::str::contains("40% (12 min total)"));
}

#[test]
fn start_unknown_module_fails() {
    let dir = initialized();

    student(dir.path(), &["start", "--module", "tsunami"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("module not found: tsunami"));
}

#[test]
fn passing_certification_certifies_module() {
    let dir = initialized();

    student(dir.path(), &["start", "--module", "fire-basics"])
        .assert()
        .success();

    let attempt = begin_attempt_id(dir.path());
    readiness()
        .current_dir(dir.path())
        .args(["submit", "--attempt", &attempt])
        .args(["--answer", "q1=leave by the nearest exit"])
        .args(["--answer", "q2=False"])
        .args(["--answer", "q3=The assembly point"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 100.0% (passed)"))
        .stdout(predicate::str::contains("Module fire-basics is now certified."));

    student(dir.path(), &["progress", "--module", "fire-basics"])
        .assert()
        .success()
        .stdout(predicate::str::contains("certified"))
        .stdout(predicate::str::contains("100%"));

    // Submitting the same attempt twice is rejected.
    readiness()
        .current_dir(dir.path())
        .args(["submit", "--attempt", &attempt, "--answer", "q1=x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already completed"));
}

#[test]
fn failing_attempt_leaves_progress_alone() {
    let dir = initialized();

    let attempt = begin_attempt_id(dir.path());
    readiness()
        .current_dir(dir.path())
        .args(["submit", "--attempt", &attempt])
        .args(["--answer", "q1=Open the windows"])
        .args(["--answer", "q2=false"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 33.3% (not passed)"))
        .stdout(predicate::str::contains("now certified").not());

    student(dir.path(), &["attempts", "--assessment", "fire-cert"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1/3"))
        .stdout(predicate::str::contains("33.3%"));
}

#[test]
fn exhausted_attempts_exit_with_code_3() {
    let dir = initialized();

    for _ in 0..3 {
        student(dir.path(), &["begin", "--assessment", "fire-cert"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Attempt:"));
    }

    student(dir.path(), &["begin", "--assessment", "fire-cert"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains(
            "no attempts left for assessment fire-cert (3/3 used)",
        ));

    student(dir.path(), &["attempts", "--assessment", "fire-cert"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No attempts left."));
}

#[test]
fn parallel_begins_respect_the_attempt_quota() {
    let dir = initialized();

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let dir = dir.path().to_path_buf();
            std::thread::spawn(move || {
                readiness()
                    .current_dir(&dir)
                    .args(["begin", "--assessment", "fire-cert", "--learner", "racer"])
                    .args(["--grade", "8", "--json"])
                    .output()
                    .unwrap()
            })
        })
        .collect();
    let outputs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let succeeded = outputs.iter().filter(|o| o.status.success()).count();
    let exhausted = outputs.iter().filter(|o| o.status.code() == Some(3)).count();
    assert_eq!(succeeded, 3);
    assert_eq!(exhausted, 3);

    let state = std::fs::read_to_string(dir.path().join("readiness-state.json")).unwrap();
    let state: serde_json::Value = serde_json::from_str(&state).unwrap();
    let attempts = state["attempts"].as_array().unwrap();
    assert_eq!(attempts.len(), 3);
    let mut numbers: Vec<u64> = attempts
        .iter()
        .map(|a| a["attempt_number"].as_u64().unwrap())
        .collect();
    numbers.sort_unstable();
    assert_eq!(numbers, vec![1, 2, 3]);
}

#[test]
fn begin_does_not_reveal_answers() {
    let dir = initialized();

    student(dir.path(), &["begin", "--assessment", "fire-cert", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"attempt_number\": 1"))
        .stdout(predicate::str::contains("correct_answer").not());
}

#[test]
fn alerts_and_retraction() {
    let dir = initialized();

    student(dir.path(), &["alerts"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Evacuation drill this week"));

    student(dir.path(), &["retract", "--alert", "drill-week"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("forbidden"));

    readiness()
        .current_dir(dir.path())
        .args(["retract", "--alert", "drill-week"])
        .args(["--learner", "a-1", "--role", "admin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Alert drill-week retracted."));

    student(dir.path(), &["alerts"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No active alerts for s-1."));
}

#[test]
fn urgent_filter_hides_medium_alerts() {
    let dir = initialized();

    student(dir.path(), &["alerts", "--urgent"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No active alerts"));
}

#[test]
fn protocols_are_listed_in_step_order() {
    let dir = initialized();

    let output = readiness()
        .current_dir(dir.path())
        .arg("protocols")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();

    assert!(stdout.contains("1 protocol(s) for default (school)"));
    assert!(stdout.contains("Fire Evacuation"));
    let first = stdout.find("1. Raise the alarm").unwrap();
    let last = stdout.find("3. Report to your assembly point").unwrap();
    assert!(first < last);
    assert!(stdout.contains("Fire services: 101"));
}

#[test]
fn stats_for_module() {
    let dir = initialized();

    student(dir.path(), &["start", "--module", "fire-basics"])
        .assert()
        .success();

    readiness()
        .current_dir(dir.path())
        .args(["stats", "--module", "fire-basics"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Module fire-basics: 1 learner(s)"))
        .stdout(predicate::str::contains("Attempts: 0"));

    readiness()
        .current_dir(dir.path())
        .args(["stats", "--module", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("module not found: nope"));
}

#[test]
fn report_writes_markdown_and_html() {
    let dir = initialized();

    student(dir.path(), &["start", "--module", "fire-basics"])
        .assert()
        .success();

    student(
        dir.path(),
        &["report", "--format", "markdown", "--output", "out/s-1.md"],
    )
    .assert()
    .success()
    .stdout(predicate::str::contains("Report written to out/s-1.md"));
    let md = std::fs::read_to_string(dir.path().join("out/s-1.md")).unwrap();
    assert!(md.contains("| Fire Safety Basics | in_progress | 0% | - |"));

    student(dir.path(), &["report", "--output", "out/s-1.html"])
        .assert()
        .success();
    let html = std::fs::read_to_string(dir.path().join("out/s-1.html")).unwrap();
    assert!(html.contains("Fire Safety Basics"));

    student(dir.path(), &["report", "--format", "pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown report format: pdf"));
}

#[test]
fn unknown_role_is_rejected() {
    let dir = initialized();

    readiness()
        .current_dir(dir.path())
        .args(["modules", "--learner", "x", "--role", "janitor"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown role: janitor"));
}
