mod common;

use assert_cmd::Command;
use common::{all_docs, sample_project, Fixture};
use std::fs;

fn layoutmap() -> Command {
    Command::new(env!("CARGO_BIN_EXE_layoutmap"))
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "Command failed with status: {:?}\nstdout: {}\nstderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_compare_writes_report_and_scripts() {
    let project = sample_project();
    let documents = all_docs();
    let out = Fixture::new();
    let report = out.path("report.md");
    let scripts = out.path("scripts");

    let stdout = stdout_of(
        layoutmap()
            .env("NO_COLOR", "1")
            .arg("compare")
            .arg("--project-root")
            .arg(project.root())
            .arg("--docs")
            .arg(documents.root())
            .arg("--output")
            .arg(&report)
            .arg("--generate-scripts")
            .arg("--scripts-output")
            .arg(&scripts),
    );

    assert!(stdout.contains("Overall completion: 38.9%"));
    assert!(stdout.contains("Comparison report saved to"));
    let content = fs::read_to_string(&report).unwrap();
    assert!(content.starts_with("# Structure Comparison Report"));
    assert!(scripts.join("backup.sh").exists());
    assert!(scripts.join("rollback.sh").exists());
}

#[test]
fn test_compare_missing_docs_exits_with_suggestion() {
    let project = sample_project();
    let empty = Fixture::new();

    layoutmap()
        .env("NO_COLOR", "1")
        .arg("compare")
        .arg("--project-root")
        .arg(project.root())
        .arg("--docs")
        .arg(empty.root())
        .arg("--output")
        .arg(empty.path("report.md"))
        .assert()
        .failure()
        .code(1);

    let output = layoutmap()
        .env("NO_COLOR", "1")
        .arg("compare")
        .arg("--project-root")
        .arg(project.root())
        .arg("--docs")
        .arg(empty.root())
        .arg("--output")
        .arg(empty.path("report.md"))
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"));
    assert!(stderr.contains("Suggestion:"));
    assert!(stderr.contains("--docs"));
    assert!(!empty.path("report.md").exists());
}

#[test]
fn test_compare_missing_root_fails() {
    let documents = all_docs();

    layoutmap()
        .arg("compare")
        .arg("--project-root")
        .arg(documents.path("no-such-project"))
        .arg("--docs")
        .arg(documents.root())
        .arg("--output")
        .arg(documents.path("report.md"))
        .assert()
        .code(1);
}

#[test]
fn test_status_set_skip_and_list() {
    let dir = Fixture::new();
    let ledger = dir.path("status.json");

    let set = stdout_of(
        layoutmap()
            .env("NO_COLOR", "1")
            .arg("status")
            .arg("--file")
            .arg(&ledger)
            .args(["set", "documentation", "implemented", "--category", "Documentation"]),
    );
    assert!(set.contains("documentation [Documentation] IMPLEMENTED"));

    stdout_of(
        layoutmap()
            .arg("status")
            .arg("--file")
            .arg(&ledger)
            .args(["skip", "ci", "handled by the platform team"]),
    );

    let skipped = stdout_of(
        layoutmap()
            .env("NO_COLOR", "1")
            .arg("status")
            .arg("--file")
            .arg(&ledger)
            .args(["list", "--skipped"]),
    );
    assert!(skipped.contains("ci [ci] INTENTIONALLY_SKIPPED"));
    assert!(skipped.contains("(reason: handled by the platform team)"));
    assert!(!skipped.contains("documentation"));

    layoutmap()
        .arg("status")
        .arg("--file")
        .arg(&ledger)
        .args(["skip", "docs", "   "])
        .assert()
        .code(1);
}

#[test]
fn test_init_refuses_to_overwrite_without_force() {
    let dir = Fixture::new();

    layoutmap().current_dir(dir.root()).arg("init").assert().success();
    let config = dir.path(".layoutmap.toml");
    assert!(fs::read_to_string(&config).unwrap().contains("[scan]"));

    let output = layoutmap()
        .current_dir(dir.root())
        .arg("init")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Use --force to overwrite"));

    layoutmap()
        .current_dir(dir.root())
        .args(["init", "--force"])
        .assert()
        .success();
}
