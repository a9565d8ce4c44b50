#![allow(dead_code)]

use indoc::indoc;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const IMPROVEMENTS_FILE: &str = "SDLC_Improvement_Suggestions.md";
pub const STRUCTURE_FILE: &str = "Proposed_Structure.md";
pub const CHECKLIST_FILE: &str = "Quick_Action_Checklist.md";

pub const IMPROVEMENTS_DOC: &str = indoc! {"
    # SDLC Improvement Suggestions

    ## 1. Documentation Layer

    **Category:** Documentation
    **Priority:** Medium
    **Estimated Effort:** 4 hours

    Create docs/api/ next to docs/guides/ for reference material

    ## 2. Test Suite

    **Category:** Testing
    **Priority:** High
    **Estimated Effort:** 1 day

    Add tests/unit/ and tests/integration/ with shared fixtures

    ## 3. Vendored Dependencies

    **Category:** Dependencies
    **Priority:** High
    **Estimated Effort:** 2-4 hours

    Remove lib/ and pin the packages in requirements.txt
"};

pub const STRUCTURE_DOC: &str = indoc! {"
    # Proposed Structure

    ```
    project/
    ├── docs/                # Documentation
    │   ├── guides/
    │   └── api/
    ├── src/
    │   └── core/
    ├── tests/               # Test suite
    │   ├── unit/
    │   └── integration/
    └── config/              # Configuration (new)
    ```
"};

pub const CHECKLIST_DOC: &str = indoc! {"
    # Quick Action Checklist

    ## Priority 1: Critical (This Week)

    ### Clean up lib/ (2 hours)
    - [ ] Back up lib/
    - [x] List vendored packages
"};

/// A scratch directory tree built file by file.
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    pub fn dir(&self, relative: &str) -> &Self {
        fs::create_dir_all(self.path(relative)).expect("create dir");
        self
    }

    pub fn file(&self, relative: &str, content: &str) -> &Self {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(path, content).expect("write file");
        self
    }
}

/// Project matching the fixture documents partway:
/// - `docs/guides/` present, `docs/api/` absent (PARTIAL)
/// - `src/core/` present (IMPLEMENTED)
/// - tests live under `test/` instead of `tests/`
/// - `lib/` vendors `requests` and `six`
pub fn sample_project() -> Fixture {
    let project = Fixture::new();
    project
        .file("docs/guides/index.md", "# Guides\n")
        .file("src/core/__init__.py", "")
        .file("src/main.py", "from src.core import run\n")
        .file("test/unit/test_core.py", "def test_core():\n    pass\n")
        .file("test/integration/test_flow.py", "")
        .file("lib/requests/__init__.py", "")
        .file("lib/six.py", "")
        .file(
            "pyproject.toml",
            "[project]\nname = \"sample\"\n\n[build-system]\nrequires = [\"setuptools\"]\n",
        )
        .file(".gitignore", "__pycache__/\n*.pyc\n");
    project
}

/// Documents directory holding whichever documents are given.
pub fn docs(
    improvements: Option<&str>,
    structure: Option<&str>,
    checklist: Option<&str>,
) -> Fixture {
    let docs = Fixture::new();
    if let Some(content) = improvements {
        docs.file(IMPROVEMENTS_FILE, content);
    }
    if let Some(content) = structure {
        docs.file(STRUCTURE_FILE, content);
    }
    if let Some(content) = checklist {
        docs.file(CHECKLIST_FILE, content);
    }
    docs
}

pub fn all_docs() -> Fixture {
    docs(
        Some(IMPROVEMENTS_DOC),
        Some(STRUCTURE_DOC),
        Some(CHECKLIST_DOC),
    )
}

/// `bash`, when one is installed.
pub fn bash() -> Option<PathBuf> {
    which::which("bash").ok()
}

/// Run `bash -n` over a script; `None` when bash is unavailable.
pub fn bash_syntax_ok(script: &str) -> Option<bool> {
    let bash = bash()?;
    let dir = tempfile::tempdir().ok()?;
    let path = dir.path().join("script.sh");
    fs::write(&path, script).ok()?;
    let status = std::process::Command::new(bash)
        .arg("-n")
        .arg(&path)
        .status()
        .ok()?;
    Some(status.success())
}

/// Run a rendered script with bash; `None` when bash is unavailable.
pub fn run_script(script: &str) -> Option<std::process::Output> {
    let bash = bash()?;
    let dir = tempfile::tempdir().ok()?;
    let path = dir.path().join("script.sh");
    fs::write(&path, script).ok()?;
    std::process::Command::new(bash).arg(&path).output().ok()
}

/// Run a script and fail the test with its stderr unless it succeeds.
/// Returns `false` when bash is unavailable.
pub fn run_script_ok(script: &str) -> bool {
    match run_script(script) {
        Some(output) => {
            assert!(
                output.status.success(),
                "script failed:\n{}\nstderr:\n{}",
                script,
                String::from_utf8_lossy(&output.stderr)
            );
            true
        }
        None => {
            eprintln!("bash not available; skipping script execution");
            false
        }
    }
}
