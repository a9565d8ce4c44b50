mod common;

use common::{all_docs, docs, sample_project, Fixture, STRUCTURE_DOC};
use layoutmap::comparison::InapplicableKind;
use layoutmap::config::LayoutmapConfig;
use layoutmap::engine::{ComparisonEngine, Degradation, RunOptions};
use layoutmap::status::ImplementationStatus;
use layoutmap::{DirectoryStatus, Error, Priority};
use pretty_assertions::assert_eq;

fn engine(project: &Fixture, documents: &Fixture) -> ComparisonEngine {
    ComparisonEngine::new(project.root(), documents.root()).with_config(LayoutmapConfig::default())
}

#[test]
fn test_full_run_produces_every_artifact() {
    let project = sample_project();
    let documents = all_docs();

    let output = engine(&project, &documents)
        .run_comparison(RunOptions::default())
        .unwrap();

    let comparison = &output.comparison;
    assert_eq!(comparison.total(), 9);
    assert_eq!(comparison.implemented_count, 3);
    assert_eq!(comparison.partial_count, 1);
    assert_eq!(comparison.missing_count, 5);
    assert_eq!(comparison.status_of("docs/"), Some(DirectoryStatus::Partial));
    assert_eq!(comparison.status_of("src/core/"), Some(DirectoryStatus::Implemented));
    assert_eq!(comparison.status_of("tests/"), Some(DirectoryStatus::Missing));
    assert!((comparison.completion_percentage - 350.0 / 9.0).abs() < 1e-9);

    assert_eq!(output.gaps.len(), 6);
    let docs_gap = output.gaps.iter().find(|g| g.path == "docs/").unwrap();
    assert_eq!(docs_gap.priority, Priority::Medium);
    assert_eq!(docs_gap.missing_items, vec!["api/"]);

    let conflict_types: Vec<&str> = output
        .conflicts
        .iter()
        .map(|c| c.conflict_type.as_str())
        .collect();
    assert_eq!(conflict_types, vec!["vendored_dependencies"]);

    let mismatched: Vec<&str> = output.mismatches.iter().map(|m| m.path.as_str()).collect();
    assert_eq!(mismatched, vec!["lib", "test"]);

    assert_eq!(output.moves.len(), 1);
    assert_eq!(output.moves[0].source, "test");
    assert_eq!(output.moves[0].destination, "tests");
    assert_eq!(output.import_impacts.len(), 1);
    assert!(output.import_impacts[0].requires_update);

    let validation = output.validation.as_ref().unwrap();
    assert_eq!(validation.superseded.len(), 2);
    assert!(validation
        .superseded
        .iter()
        .all(|s| s.improvement.category == "Testing"));
    assert_eq!(validation.inapplicable.len(), 1);
    assert_eq!(
        validation.inapplicable[0].conflict_type,
        InapplicableKind::PrerequisiteMissing
    );

    assert_eq!(output.tasks.len(), 6);
    let position = |title: &str| output.tasks.iter().position(|t| t.title == title).unwrap();
    assert!(position("Create tests/") < position("Create tests/unit/"));

    assert_eq!(output.checklist.len(), 2);
    assert_eq!(output.config_checks["pyproject.toml"]["project"], true);
    assert_eq!(
        output.config_checks["pyproject.toml"]["tool.pytest.ini_options"],
        false
    );
    assert_eq!(output.config_checks[".gitignore"]["*.pyc"], true);

    assert!(output.migration_scripts.is_empty());
    assert!(output.status.is_none());
    assert!(output.degradations.is_empty());

    assert!(output.report.starts_with("# Structure Comparison Report"));
    assert!(output.report.contains("Overall Completion: 38.9%"));
    assert!(output.report.contains("## Suggestion Validation"));
    assert!(output.report.contains("## Task Plan"));
}

fn quick_wins_section(report: &str) -> &str {
    let start = report.find("## Quick Wins").unwrap();
    let rest = &report[start + 2..];
    let end = rest.find("\n## ").map(|i| start + 2 + i).unwrap_or(report.len());
    &report[start..end]
}

#[test]
fn test_report_quick_wins_follow_planning_threshold() {
    let project = sample_project();
    let documents = all_docs();

    for hours in [1.0, 4.0, 20.0] {
        let mut config = LayoutmapConfig::default();
        config.planning.quick_win_hours = hours;
        let output = ComparisonEngine::new(project.root(), documents.root())
            .with_config(config)
            .run_comparison(RunOptions::default())
            .unwrap();

        let section = quick_wins_section(&output.report);
        let listed = section.lines().filter(|l| l.starts_with("- [ ]")).count();
        assert_eq!(listed, output.quick_wins.len(), "threshold {}", hours);
        for task in &output.quick_wins {
            assert!(section.contains(&task.title), "{} missing", task.title);
        }
        if output.quick_wins.is_empty() {
            assert!(section.contains("None found: no quick wins identified."));
        }
    }

    let mut config = LayoutmapConfig::default();
    config.planning.quick_win_hours = 1.0;
    let strict = ComparisonEngine::new(project.root(), documents.root())
        .with_config(config)
        .run_comparison(RunOptions::default())
        .unwrap();
    assert!(strict.quick_wins.is_empty());
    assert!(strict.report.contains("None found: no quick wins identified."));
}

#[test]
fn test_scripts_are_generated_in_application_order() {
    let project = sample_project();
    let documents = all_docs();

    let output = engine(&project, &documents)
        .run_comparison(RunOptions {
            generate_migration_scripts: true,
            check_validation: true,
        })
        .unwrap();

    let names: Vec<&str> = output
        .migration_scripts
        .iter()
        .map(|s| s.file_name())
        .collect();
    assert_eq!(
        names,
        vec![
            "backup.sh",
            "lib_cleanup.sh",
            "directory_move.sh",
            "import_update.sh",
            "rollback.sh"
        ]
    );
    assert!(output.migration_scripts.iter().all(|s| s.check_backup_order()));
    assert!(output.degradations.is_empty());
}

#[test]
fn test_scripts_skipped_without_vendored_dir_or_moves() {
    let project = Fixture::new();
    project.dir("docs/guides").dir("docs/api");
    let documents = docs(None, Some(STRUCTURE_DOC), None);

    let output = engine(&project, &documents)
        .run_comparison(RunOptions {
            generate_migration_scripts: true,
            check_validation: false,
        })
        .unwrap();

    assert!(output.migration_scripts.is_empty());
    assert!(output.validation.is_none());
    let skipped: Vec<&str> = output
        .degradations
        .iter()
        .filter_map(|d| match d {
            Degradation::ScriptSkipped { script, .. } => Some(script.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(
        skipped,
        vec![
            "backup.sh",
            "lib_cleanup.sh",
            "directory_move.sh",
            "import_update.sh",
            "rollback.sh"
        ]
    );
}

#[test]
fn test_partial_documents_degrade() {
    let project = sample_project();
    let documents = docs(None, Some(STRUCTURE_DOC), None);

    let output = engine(&project, &documents)
        .run_comparison(RunOptions::default())
        .unwrap();

    let partial = output
        .degradations
        .iter()
        .filter(|d| matches!(d, Degradation::PartialDocumentData { .. }))
        .count();
    assert_eq!(partial, 2);
    assert!(output.proposed.improvements.is_empty());
    assert!(output.checklist.is_empty());
    assert_eq!(output.comparison.total(), 9);
    assert!(output.report.contains("## Quick Wins"));
}

#[test]
fn test_no_documents_is_fatal() {
    let project = sample_project();
    let documents = Fixture::new();

    let err = engine(&project, &documents)
        .run_comparison(RunOptions::default())
        .unwrap_err();
    match &err {
        Error::NoParsableDocuments { failures, .. } => assert_eq!(failures.len(), 3),
        other => panic!("unexpected error {:?}", other),
    }
    assert!(err.is_fatal());
    assert!(err.recovery().unwrap().contains("--docs"));
}

#[test]
fn test_missing_root_is_fatal() {
    let documents = all_docs();
    let missing = documents.path("no-such-project");

    let err = ComparisonEngine::new(&missing, documents.root())
        .run_comparison(RunOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRoot { .. }));
    assert!(err.recovery().unwrap().contains("--project-root"));
}

#[test]
fn test_runs_are_deterministic() {
    let project = sample_project();
    let documents = all_docs();
    let engine = engine(&project, &documents);

    let first = engine.run_comparison(RunOptions::default()).unwrap();
    let second = engine.run_comparison(RunOptions::default()).unwrap();
    assert_eq!(first.comparison, second.comparison);
    assert_eq!(first.gaps, second.gaps);
    assert_eq!(first.tasks, second.tasks);
    assert_eq!(first.report, second.report);
}

#[test]
fn test_status_ledger_is_synchronised() {
    let project = sample_project();
    let documents = all_docs();
    let ledger_dir = Fixture::new();
    let ledger = ledger_dir.path("status.json");

    let output = engine(&project, &documents)
        .with_status_file(&ledger)
        .run_comparison(RunOptions::default())
        .unwrap();

    let status = output.status.unwrap();
    assert!(status.last_comparison_date.is_some());
    assert_eq!(status.entries.len(), 3);
    assert_eq!(
        status.entries["documentation"].status,
        ImplementationStatus::Partial
    );
    assert_eq!(
        status.entries["testing"].status,
        ImplementationStatus::NotYetImplemented
    );
    assert!(ledger.exists());
}

#[test]
fn test_save_outputs() {
    let project = sample_project();
    let documents = all_docs();
    let out = Fixture::new();
    let engine = engine(&project, &documents);

    let output = engine
        .run_comparison(RunOptions {
            generate_migration_scripts: true,
            check_validation: true,
        })
        .unwrap();

    let report_path = out.path("reports/comparison.md");
    engine.save_report(&output.report, &report_path).unwrap();
    assert_eq!(std::fs::read_to_string(&report_path).unwrap(), output.report);

    let written = engine
        .save_migration_scripts(&output.migration_scripts, &out.path("scripts"))
        .unwrap();
    assert_eq!(written.len(), 5);
    for path in &written {
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.starts_with("#!/usr/bin/env bash"));
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(path).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }
}
