use std::path::{Path, PathBuf};

use super::steps::{
    shell_quote, DirectoryMove, FileMove, MigrationScript, ScriptOperation, ScriptStep,
};
use crate::comparison::module_name;
use crate::config::MigrationConfig;
use crate::core::{normalize_dir_path, LibraryInfo};

const AFFECTED_FILES: &str = "affected_files.txt";

/// Builds the migration scripts. Every script `cd`s into the project root
/// first so it can be run from anywhere.
pub struct MigrationScriptGenerator {
    project_root: PathBuf,
    lib_dir: String,
    manifest_file: String,
    backup_dir: String,
}

impl MigrationScriptGenerator {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self::from_config(project_root, &MigrationConfig::default())
    }

    pub fn from_config(project_root: impl Into<PathBuf>, config: &MigrationConfig) -> Self {
        Self {
            project_root: project_root.into(),
            lib_dir: "lib".to_string(),
            manifest_file: config.manifest_file.clone(),
            backup_dir: config.backup_dir.trim_end_matches('/').to_string(),
        }
    }

    pub fn with_lib_dir(mut self, lib_dir: impl Into<String>) -> Self {
        self.lib_dir = normalize_dir_path(&lib_dir.into());
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Replace vendored packages with a manifest. Backs `lib/` and the
    /// existing manifest up before anything is written or removed.
    pub fn generate_lib_cleanup_script(&self, lib_info: &LibraryInfo) -> MigrationScript {
        let backup_dir = format!("{}/lib_cleanup", self.backup_dir);
        let mut script = MigrationScript::new(
            ScriptOperation::LibCleanup {
                lib_dir: self.lib_dir.clone(),
                manifest_file: self.manifest_file.clone(),
                backup_dir: backup_dir.clone(),
                packages: lib_info.packages.clone(),
            },
            format!("Remove vendored dependencies from {}/", self.lib_dir),
        );
        self.enter_project(&mut script);

        if !lib_info.exists || lib_info.package_count == 0 {
            script.push(ScriptStep::setup(format!(
                "echo {}",
                shell_quote(&format!(
                    "No vendored packages found in {}/; nothing to clean up.",
                    self.lib_dir
                ))
            )));
            return script;
        }

        let lib = shell_quote(&format!("{}/", self.lib_dir));
        // Backed up under its full relative path so rollback finds it there
        let lib_path = shell_quote(&self.lib_dir);
        let manifest = shell_quote(&self.manifest_file);

        script
            .push(ScriptStep::comment(format!(
                "{} packages ({:.2} MB) vendored in {}/",
                lib_info.package_count, lib_info.total_size_mb, self.lib_dir
            )))
            .push(ScriptStep::setup(format!(
                "BACKUP_DIR={}",
                shell_quote(&backup_dir)
            )))
            .push(ScriptStep::guard(format!(
                "if [ ! -d {lib} ]; then\n    echo {msg}\n    exit 0\nfi",
                msg = shell_quote(&format!("{}/ not found; nothing to do.", self.lib_dir))
            )))
            .push(ScriptStep::comment("Back up before removing anything"))
            .push(ScriptStep::backup(format!(
                "mkdir -p \"$BACKUP_DIR/$(dirname {lib_path})\""
            )))
            .push(ScriptStep::backup(format!(
                "cp -R {lib_path} \"$BACKUP_DIR\"/{lib_path}"
            )))
            .push(ScriptStep::backup(format!(
                "if [ -f {manifest} ]; then\n    cp {manifest} \"$BACKUP_DIR/manifest.orig\"\nfi"
            )));

        let mut manifest_lines = vec![shell_quote(&format!(
            "# Packages previously vendored in {}/",
            self.lib_dir
        ))];
        manifest_lines.extend(lib_info.packages.iter().map(|p| shell_quote(p)));
        script
            .push(ScriptStep::comment(format!("Record packages in {}", self.manifest_file)))
            .push(ScriptStep::modify(format!(
                "printf '%s\\n' {} >> {manifest}",
                manifest_lines.join(" ")
            )))
            .push(ScriptStep::comment(format!("Remove {}/", self.lib_dir)))
            .push(ScriptStep::destructive(format!("rm -rf {lib}")))
            .push(ScriptStep::setup(format!(
                "echo \"Removed {}/; backup kept in $BACKUP_DIR\"",
                self.lib_dir
            )));
        script
    }

    /// Move directories with `git mv`, falling back to `mv` outside git.
    /// Moves whose source and destination coincide are dropped.
    pub fn generate_directory_move_script(&self, moves: &[DirectoryMove]) -> MigrationScript {
        let moves: Vec<DirectoryMove> = moves
            .iter()
            .filter(|m| {
                let differs = normalize_dir_path(&m.source) != normalize_dir_path(&m.destination);
                if !differs {
                    log::debug!("Dropping no-op move of {}", m.source);
                }
                differs
            })
            .cloned()
            .collect();

        let mut script = MigrationScript::new(
            ScriptOperation::DirectoryMove {
                moves: moves.clone(),
            },
            "Move directories into the proposed layout",
        );
        self.enter_project(&mut script);
        script.push(ScriptStep::guard(
            "if ! git diff-index --quiet HEAD -- 2>/dev/null; then\n    echo \"WARNING: uncommitted changes detected; commit or stash them so the moves can be rolled back\" >&2\nfi",
        ));

        if moves.is_empty() {
            script.push(ScriptStep::setup("echo 'No directory moves to apply.'"));
            return script;
        }

        for m in &moves {
            let source = shell_quote(&normalize_dir_path(&m.source));
            let destination = shell_quote(&normalize_dir_path(&m.destination));
            let parent = crate::core::parent_dir(&m.destination);

            let label = if m.reason.trim().is_empty() {
                format!("{} -> {}", m.source, m.destination)
            } else {
                format!("{} -> {} ({})", m.source, m.destination, m.reason)
            };
            script.push(ScriptStep::comment(label));

            let mkdir = if parent == crate::core::ROOT_KEY {
                String::new()
            } else {
                format!("    mkdir -p {}\n", shell_quote(&parent))
            };
            script.push(ScriptStep::modify(format!(
                "if [ -e {source} ]; then\n{mkdir}    git mv {source} {destination} 2>/dev/null || mv {source} {destination}\nelse\n    printf 'WARNING: %s not found; skipped\\n' {source} >&2\nfi"
            )));
        }
        script
    }

    /// Rewrite imports of moved modules in every `.py` file, after copying
    /// each affected file into the backup directory.
    pub fn generate_import_update_script(&self, file_moves: &[FileMove]) -> MigrationScript {
        let backup_dir = format!("{}/import_update", self.backup_dir);
        let mut script = MigrationScript::new(
            ScriptOperation::ImportUpdate {
                file_moves: file_moves.to_vec(),
                backup_dir: backup_dir.clone(),
            },
            "Update imports for moved modules",
        );
        self.enter_project(&mut script);

        let renames: Vec<(String, String)> = file_moves
            .iter()
            .map(|m| (module_name(&m.source), module_name(&m.destination)))
            .filter(|(old, new)| old != new && !old.is_empty() && old != ".")
            .collect();

        script
            .push(ScriptStep::setup(format!(
                "BACKUP_DIR={}",
                shell_quote(&backup_dir)
            )))
            .push(ScriptStep::setup(format!(
                "AFFECTED_FILES=\"$BACKUP_DIR/{}\"",
                AFFECTED_FILES
            )))
            .push(ScriptStep::comment("Back up every file that imports a moved module"))
            .push(ScriptStep::backup("mkdir -p \"$BACKUP_DIR\""));

        let exclude = shell_quote(self.backup_dir.split('/').next().unwrap_or(".migration_backup"));
        if renames.is_empty() {
            script
                .push(ScriptStep::backup(": > \"$AFFECTED_FILES\""))
                .push(ScriptStep::setup("echo 'No imports need updating.'"));
            return script;
        }

        let patterns: Vec<String> = renames
            .iter()
            .map(|(old, _)| {
                let pattern = format!(
                    "^[[:space:]]*(from|import)[[:space:]].*{}",
                    regex_escape(old)
                );
                format!("-e {}", shell_quote(&pattern))
            })
            .collect();
        script
            .push(ScriptStep::backup(format!(
                "grep -rlE --include='*.py' --exclude-dir={exclude} {} . > \"$AFFECTED_FILES\" || true",
                patterns.join(" ")
            )))
            .push(ScriptStep::backup(
                "while IFS= read -r file; do\n    mkdir -p \"$BACKUP_DIR/$(dirname \"$file\")\"\n    cp \"$file\" \"$BACKUP_DIR/$file\"\ndone < \"$AFFECTED_FILES\"",
            ));

        for (old, new) in &renames {
            let expressions: Vec<String> = import_rewrites(old, new)
                .iter()
                .map(|expression| format!("-e {}", shell_quote(expression)))
                .collect();
            script
                .push(ScriptStep::comment(format!("{} -> {}", old, new)))
                .push(ScriptStep::modify(format!(
                    "while IFS= read -r file; do\n    sed -E -i.bak {} \"$file\" && rm -f \"$file.bak\"\ndone < \"$AFFECTED_FILES\"",
                    expressions.join(" ")
                )));
        }
        script
    }

    /// Copy every listed path into a timestamped backup root.
    pub fn generate_backup_script(&self, paths: &[String]) -> MigrationScript {
        let mut script = MigrationScript::new(
            ScriptOperation::Backup {
                paths: paths.to_vec(),
                backup_root: self.backup_dir.clone(),
            },
            "Back up paths touched by the migration",
        );
        self.enter_project(&mut script);
        script
            .push(ScriptStep::setup(format!(
                "BACKUP_ROOT={}\"/backup_$(date +%Y%m%d_%H%M%S)\"",
                shell_quote(&self.backup_dir)
            )))
            .push(ScriptStep::backup("mkdir -p \"$BACKUP_ROOT\""));

        for path in paths {
            let quoted = shell_quote(path);
            script.push(ScriptStep::backup(format!(
                "if [ -e {quoted} ]; then\n    mkdir -p \"$BACKUP_ROOT/$(dirname {quoted})\"\n    cp -r {quoted} \"$BACKUP_ROOT\"/{quoted}\nelse\n    printf 'WARNING: %s not found; skipped\\n' {quoted} >&2\nfi"
            )));
        }
        script.push(ScriptStep::setup("echo \"Backup written to $BACKUP_ROOT\""));
        script
    }

    /// Script that reverses `migration`.
    pub fn generate_rollback_script(&self, migration: &MigrationScript) -> MigrationScript {
        let mut script = MigrationScript::new(
            ScriptOperation::Rollback,
            format!("Roll back {}", migration.file_name()),
        );
        self.enter_project(&mut script);
        self.push_rollback_steps(&mut script, migration);
        script
    }

    /// One rollback covering several scripts, undone in reverse order.
    pub fn generate_combined_rollback(&self, migrations: &[MigrationScript]) -> MigrationScript {
        let mut script =
            MigrationScript::new(ScriptOperation::Rollback, "Roll back the generated migration");
        self.enter_project(&mut script);
        for migration in migrations.iter().rev() {
            if matches!(migration.operation, ScriptOperation::Rollback) {
                continue;
            }
            script.push(ScriptStep::comment(format!("Undo {}", migration.file_name())));
            self.push_rollback_steps(&mut script, migration);
        }
        script
    }

    fn push_rollback_steps(&self, script: &mut MigrationScript, migration: &MigrationScript) {
        match &migration.operation {
            ScriptOperation::LibCleanup {
                lib_dir,
                manifest_file,
                backup_dir,
                ..
            } => {
                if migration.is_noop() {
                    script.push(ScriptStep::setup(format!(
                        "echo {}",
                        shell_quote(&format!("{}/ was not modified; nothing to restore.", lib_dir))
                    )));
                    return;
                }
                let lib = shell_quote(lib_dir);
                let manifest = shell_quote(manifest_file);
                script
                    .push(ScriptStep::setup(format!(
                        "BACKUP_DIR={}",
                        shell_quote(backup_dir)
                    )))
                    .push(ScriptStep::guard(format!(
                        "if [ ! -d \"$BACKUP_DIR\"/{lib} ]; then\n    echo \"ERROR: no backup of {lib_dir}/ in $BACKUP_DIR\" >&2\n    exit 1\nfi"
                    )))
                    .push(ScriptStep::comment(format!("Restore {}/ from backup", lib_dir)))
                    .push(ScriptStep::destructive(format!("rm -rf {lib}")))
                    .push(ScriptStep::modify(format!(
                        "mkdir -p \"$(dirname {lib})\"\ncp -R \"$BACKUP_DIR\"/{lib} {lib}"
                    )))
                    .push(ScriptStep::comment(format!("Restore {}", manifest_file)))
                    .push(ScriptStep::modify(format!(
                        "if [ -f \"$BACKUP_DIR/manifest.orig\" ]; then\n    cp \"$BACKUP_DIR/manifest.orig\" {manifest}\nelse\n    rm -f {manifest}\nfi"
                    )));
            }
            ScriptOperation::DirectoryMove { moves } => {
                if moves.is_empty() {
                    script.push(ScriptStep::setup("echo 'No directory moves to revert.'"));
                    return;
                }
                let mut touched = Vec::new();
                for m in moves.iter().rev() {
                    let source = shell_quote(&normalize_dir_path(&m.source));
                    let destination = shell_quote(&normalize_dir_path(&m.destination));
                    script
                        .push(ScriptStep::comment(format!("{} -> {}", m.destination, m.source)))
                        .push(ScriptStep::modify(format!(
                            "if [ -e {destination} ]; then\n    git mv {destination} {source} 2>/dev/null || mv {destination} {source}\nfi"
                        )));
                    touched.push(source);
                    touched.push(destination);
                }
                script
                    .push(ScriptStep::comment("Drop staged renames and restore tracked files"))
                    .push(ScriptStep::modify(format!(
                        "git reset --quiet HEAD -- {} 2>/dev/null || true",
                        touched.join(" ")
                    )))
                    .push(ScriptStep::modify(format!(
                        "git checkout -- {} 2>/dev/null || true",
                        touched.iter().step_by(2).cloned().collect::<Vec<_>>().join(" ")
                    )));
            }
            ScriptOperation::ImportUpdate { backup_dir, .. } => {
                script
                    .push(ScriptStep::setup(format!(
                        "BACKUP_DIR={}",
                        shell_quote(backup_dir)
                    )))
                    .push(ScriptStep::guard(format!(
                        "if [ ! -f \"$BACKUP_DIR/{AFFECTED_FILES}\" ]; then\n    echo \"ERROR: no import backup in $BACKUP_DIR\" >&2\n    exit 1\nfi"
                    )))
                    .push(ScriptStep::comment("Restore the original .py files from backup"))
                    .push(ScriptStep::modify(format!(
                        "while IFS= read -r file; do\n    if [ -f \"$BACKUP_DIR/$file\" ]; then\n        cp \"$BACKUP_DIR/$file\" \"$file\"\n    fi\ndone < \"$BACKUP_DIR/{AFFECTED_FILES}\""
                    )));
            }
            ScriptOperation::Backup { paths, backup_root } => {
                script
                    .push(ScriptStep::setup("BACKUP_ROOT=''"))
                    .push(ScriptStep::setup(format!(
                        "for candidate in {}/backup_*; do\n    if [ -d \"$candidate\" ]; then\n        BACKUP_ROOT=\"$candidate\"\n    fi\ndone",
                        shell_quote(backup_root)
                    )))
                    .push(ScriptStep::guard(
                        "if [ -z \"$BACKUP_ROOT\" ]; then\n    echo 'ERROR: no backup found' >&2\n    exit 1\nfi",
                    ));
                for path in paths {
                    let quoted = shell_quote(path);
                    script.push(ScriptStep::modify(format!(
                        "if [ -e \"$BACKUP_ROOT\"/{quoted} ]; then\n    rm -rf {quoted}\n    cp -r \"$BACKUP_ROOT\"/{quoted} {quoted}\nfi"
                    )));
                }
            }
            ScriptOperation::Rollback => {
                script.push(ScriptStep::setup("echo 'Nothing to roll back.'"));
            }
        }
    }

    fn enter_project(&self, script: &mut MigrationScript) {
        script.push(ScriptStep::setup(format!(
            "cd {}",
            shell_quote(&self.project_root.to_string_lossy())
        )));
    }
}

/// `sed -E` expressions renaming `old` only where it is the imported module:
/// `from old ...`, `import old ...` and later names in `import a, old`.
/// Other mentions of the name on the same or other lines are untouched.
fn import_rewrites(old: &str, new: &str) -> [String; 3] {
    let old = regex_escape(old);
    let new = replacement_escape(new);
    [
        format!(r"s/^([[:space:]]*from[[:space:]]+){old}([.[:space:]])/\1{new}\2/"),
        format!(r"s/^([[:space:]]*import[[:space:]]+){old}([.[:space:],]|$)/\1{new}\2/"),
        format!(
            r"s/^([[:space:]]*import[[:space:]][^#]*,[[:space:]]*){old}([.[:space:],]|$)/\1{new}\2/"
        ),
    ]
}

fn regex_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if "\\.^$*+?()[]{}|/".contains(ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn replacement_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if "\\&/".contains(ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
