//! Migration scripts as ordered instruction steps, rendered to bash.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// `# ...` line; never executed.
    Comment,
    /// Variable assignments, `cd`, and informational output.
    Setup,
    /// Precondition check that may warn or abort.
    Guard,
    /// Copies state aside before it is changed.
    Backup,
    /// Changes files or directories in place.
    Modify,
    /// Deletes data that only a backup can restore.
    Destructive,
}

impl StepKind {
    pub fn changes_state(self) -> bool {
        matches!(self, StepKind::Modify | StepKind::Destructive)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub kind: StepKind,
    /// Shell text; may span several lines. For comments, the text without `#`.
    pub command: String,
}

impl ScriptStep {
    fn new(kind: StepKind, command: impl Into<String>) -> Self {
        Self {
            kind,
            command: command.into(),
        }
    }

    pub fn comment(text: impl AsRef<str>) -> Self {
        Self::new(StepKind::Comment, single_line(text.as_ref()))
    }

    pub fn setup(command: impl Into<String>) -> Self {
        Self::new(StepKind::Setup, command)
    }

    pub fn guard(command: impl Into<String>) -> Self {
        Self::new(StepKind::Guard, command)
    }

    pub fn backup(command: impl Into<String>) -> Self {
        Self::new(StepKind::Backup, command)
    }

    pub fn modify(command: impl Into<String>) -> Self {
        Self::new(StepKind::Modify, command)
    }

    pub fn destructive(command: impl Into<String>) -> Self {
        Self::new(StepKind::Destructive, command)
    }

    pub fn render(&self) -> String {
        match self.kind {
            StepKind::Comment if self.command.is_empty() => "#".to_string(),
            StepKind::Comment => format!("# {}", self.command),
            _ => self.command.clone(),
        }
    }
}

/// A single move of a directory from `source` to `destination`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryMove {
    pub source: String,
    pub destination: String,
    #[serde(default)]
    pub reason: String,
}

impl DirectoryMove {
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            reason: reason.into(),
        }
    }
}

/// A single moved source file whose import path changes.
pub type FileMove = DirectoryMove;

/// What a script does, with the data its rollback needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptOperation {
    LibCleanup {
        lib_dir: String,
        manifest_file: String,
        backup_dir: String,
        packages: Vec<String>,
    },
    DirectoryMove {
        moves: Vec<DirectoryMove>,
    },
    ImportUpdate {
        file_moves: Vec<FileMove>,
        backup_dir: String,
    },
    Backup {
        paths: Vec<String>,
        backup_root: String,
    },
    Rollback,
}

impl ScriptOperation {
    /// Default file name the script is saved under.
    pub fn file_name(&self) -> &'static str {
        match self {
            ScriptOperation::LibCleanup { .. } => "lib_cleanup.sh",
            ScriptOperation::DirectoryMove { .. } => "directory_move.sh",
            ScriptOperation::ImportUpdate { .. } => "import_update.sh",
            ScriptOperation::Backup { .. } => "backup.sh",
            ScriptOperation::Rollback => "rollback.sh",
        }
    }

    /// Scripts whose modifications can only be undone from their own backup.
    pub fn requires_backup(&self) -> bool {
        matches!(
            self,
            ScriptOperation::LibCleanup { .. } | ScriptOperation::ImportUpdate { .. }
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MigrationScript {
    pub operation: ScriptOperation,
    pub description: String,
    pub steps: Vec<ScriptStep>,
}

impl MigrationScript {
    pub fn new(operation: ScriptOperation, description: impl Into<String>) -> Self {
        Self {
            operation,
            description: single_line(&description.into()),
            steps: Vec::new(),
        }
    }

    pub fn push(&mut self, step: ScriptStep) -> &mut Self {
        self.steps.push(step);
        self
    }

    pub fn file_name(&self) -> &'static str {
        self.operation.file_name()
    }

    /// True when no step changes anything on disk.
    pub fn is_noop(&self) -> bool {
        !self.steps.iter().any(|step| step.kind.changes_state())
    }

    /// For scripts that need one, a backup step comes before every step
    /// that modifies or destroys data.
    pub fn check_backup_order(&self) -> bool {
        if !self.operation.requires_backup() {
            return true;
        }
        let first_backup = self.steps.iter().position(|s| s.kind == StepKind::Backup);
        let first_change = self.steps.iter().position(|s| s.kind.changes_state());
        match (first_backup, first_change) {
            (_, None) => true,
            (Some(backup), Some(change)) => backup < change,
            (None, Some(_)) => false,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::from("#!/usr/bin/env bash\n");
        out.push_str(&format!("# {}\n", self.description));
        out.push_str("set -euo pipefail\n");
        for step in &self.steps {
            if step.kind == StepKind::Comment {
                out.push('\n');
            }
            out.push_str(&step.render());
            out.push('\n');
        }
        out
    }
}

/// Pure: single-quote a word for bash.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
