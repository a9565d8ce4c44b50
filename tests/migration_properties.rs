mod common;

use common::Fixture;
use layoutmap::migration::{
    DirectoryMove, FileMove, MigrationScript, MigrationScriptGenerator, ScriptOperation, StepKind,
};
use layoutmap::LibraryInfo;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::fs;

fn vendored(packages: &[&str]) -> LibraryInfo {
    LibraryInfo {
        exists: true,
        package_count: packages.len(),
        total_size_mb: 1.5,
        packages: packages.iter().map(|p| p.to_string()).collect(),
    }
}

fn all_scripts(generator: &MigrationScriptGenerator) -> Vec<MigrationScript> {
    let moves = vec![
        DirectoryMove::new("test", "tests", "plural test directory"),
        DirectoryMove::new("doc", "docs/reference", ""),
    ];
    let file_moves = vec![DirectoryMove::new("src/utils.py", "src/core/utils.py", "")];

    let mut scripts = vec![
        generator.generate_backup_script(&["test".to_string(), "lib".to_string()]),
        generator.generate_lib_cleanup_script(&vendored(&["requests", "six"])),
        generator.generate_directory_move_script(&moves),
        generator.generate_import_update_script(&file_moves),
    ];
    scripts.push(generator.generate_combined_rollback(&scripts));
    scripts
}

#[test]
fn test_generated_scripts_pass_bash_syntax_check() {
    let generator = MigrationScriptGenerator::new("/tmp/project");

    for script in all_scripts(&generator) {
        let rendered = script.render();
        assert!(rendered.starts_with("#!/usr/bin/env bash\n"));
        assert!(rendered.contains("set -euo pipefail"));
        match common::bash_syntax_ok(&rendered) {
            Some(ok) => assert!(ok, "{} failed bash -n:\n{}", script.file_name(), rendered),
            None => eprintln!("bash not available; skipping syntax check"),
        }
    }
}

#[test]
fn test_backups_precede_destructive_steps() {
    let generator = MigrationScriptGenerator::new("/tmp/project");

    for script in all_scripts(&generator) {
        assert!(script.check_backup_order(), "{}", script.file_name());
    }

    let cleanup = generator.generate_lib_cleanup_script(&vendored(&["requests"]));
    let first_backup = cleanup
        .steps
        .iter()
        .position(|s| s.kind == StepKind::Backup)
        .unwrap();
    let removal = cleanup
        .steps
        .iter()
        .position(|s| s.kind == StepKind::Destructive)
        .unwrap();
    assert!(first_backup < removal);
    assert!(cleanup.render().contains("rm -rf 'lib/'"));
}

#[test]
fn test_empty_inputs_produce_noop_scripts() {
    let generator = MigrationScriptGenerator::new("/tmp/project");

    let cleanup = generator.generate_lib_cleanup_script(&LibraryInfo::absent());
    assert!(cleanup.is_noop());
    assert!(cleanup.render().contains("nothing to clean up"));

    let moves = generator.generate_directory_move_script(&[DirectoryMove::new("docs", "docs/", "")]);
    assert!(moves.is_noop());
    assert!(matches!(
        &moves.operation,
        ScriptOperation::DirectoryMove { moves } if moves.is_empty()
    ));
}

#[test]
fn test_rollback_reverses_in_order() {
    let generator = MigrationScriptGenerator::new("/tmp/project");
    let scripts = all_scripts(&generator);
    let rollback = scripts.last().unwrap().render();

    let undo_order: Vec<usize> = ["import_update.sh", "directory_move.sh", "lib_cleanup.sh"]
        .iter()
        .map(|name| rollback.find(&format!("Undo {}", name)).unwrap())
        .collect();
    let mut sorted = undo_order.clone();
    sorted.sort();
    assert_eq!(undo_order, sorted);
}

fn read(project: &Fixture, relative: &str) -> String {
    fs::read_to_string(project.path(relative)).unwrap()
}

#[test]
fn test_nested_lib_cleanup_runs_and_rolls_back() {
    let project = Fixture::new();
    project
        .file("vendor/lib/requests/__init__.py", "VERSION = '2.31'\n")
        .file("vendor/lib/six.py", "# six\n")
        .file("requirements.txt", "flask\n");
    let generator = MigrationScriptGenerator::new(project.root()).with_lib_dir("vendor/lib");
    let cleanup = generator.generate_lib_cleanup_script(&vendored(&["requests", "six"]));

    if !common::run_script_ok(&cleanup.render()) {
        return;
    }
    assert!(!project.path("vendor/lib").exists());
    let manifest = read(&project, "requirements.txt");
    assert!(manifest.starts_with("flask\n"));
    assert!(manifest.ends_with("requests\nsix\n"));

    let rollback = generator.generate_rollback_script(&cleanup);
    assert!(common::run_script_ok(&rollback.render()));
    assert_eq!(read(&project, "vendor/lib/requests/__init__.py"), "VERSION = '2.31'\n");
    assert_eq!(read(&project, "vendor/lib/six.py"), "# six\n");
    assert_eq!(read(&project, "requirements.txt"), "flask\n");
}

#[test]
fn test_import_update_rewrites_only_import_statements() {
    let original = "import test.helpers\ntest = 1\nprint(\"run the test\")\nfrom test import thing\nimport os, test\n";
    let project = Fixture::new();
    project
        .file("app.py", original)
        .file("test/helpers.py", "import os\n")
        .file("notes.py", "test_value = 'test'\n");
    let generator = MigrationScriptGenerator::new(project.root());
    let script = generator.generate_import_update_script(&[FileMove::new("test", "tests", "")]);

    if !common::run_script_ok(&script.render()) {
        return;
    }
    assert_eq!(
        read(&project, "app.py"),
        "import tests.helpers\ntest = 1\nprint(\"run the test\")\nfrom tests import thing\nimport os, tests\n"
    );
    assert_eq!(read(&project, "notes.py"), "test_value = 'test'\n");
    assert_eq!(read(&project, "test/helpers.py"), "import os\n");

    let rollback = generator.generate_rollback_script(&script);
    assert!(common::run_script_ok(&rollback.render()));
    assert_eq!(read(&project, "app.py"), original);
}

fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_ ']{0,8}".prop_map(|s| s.trim().to_string())
        .prop_filter("non-empty", |s| !s.is_empty())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_move_scripts_quote_arbitrary_names(
        moves in prop::collection::vec((segment(), segment()), 0..4),
    ) {
        let generator = MigrationScriptGenerator::new("/tmp/project");
        let moves: Vec<DirectoryMove> = moves
            .into_iter()
            .map(|(source, destination)| DirectoryMove::new(source, format!("new/{}", destination), ""))
            .collect();

        let script = generator.generate_directory_move_script(&moves);
        prop_assert!(script.check_backup_order());
        let rollback = generator.generate_rollback_script(&script);

        for rendered in [script.render(), rollback.render()] {
            if let Some(ok) = common::bash_syntax_ok(&rendered) {
                prop_assert!(ok, "bash -n failed:\n{}", rendered);
            }
        }
    }
}
