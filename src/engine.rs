//! End-to-end comparison run.
//!
//! [`ComparisonEngine::run_comparison`] drives every stage in order: scan,
//! parse, compare, gaps, conflicts, validation, planning, scripts, status and
//! report. Only a missing project root or the absence of every suggestion
//! document aborts a run; everything else degrades into a [`Degradation`]
//! recorded on the output.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::comparison::{
    are_aliases, ConfigurationVerifier, ConflictDetector, GapAnalyzer, InapplicableSuggestion,
    StructureComparator, SupersededSuggestion, ValidationChecker, CASE_MISMATCH,
};
use crate::config::{load_config_from, LayoutmapConfig};
use crate::core::{
    leaf_name, normalize_dir_path, parent_dir, ChecklistEntry, ComparisonResult, Conflict,
    DirectoryMismatch, DirectoryStatus, Gap, ImportImpact, Improvement, ProjectStructure,
    ProposedStructure,
};
use crate::errors::{Error, Result};
use crate::io;
use crate::migration::{DirectoryMove, MigrationScript, MigrationScriptGenerator};
use crate::parser::{DocumentKind, ParsedDocument, SuggestionParser};
use crate::planning::{quick_wins, PriorityMatrix, Task, TaskGenerator, WorkPackage};
use crate::report::{ComparisonReporter, ReportExtras};
use crate::scanner::DirectoryScanner;
use crate::status::{StatusFile, StatusTracker};

pub const PYPROJECT_FILE: &str = "pyproject.toml";
pub const GITIGNORE_FILE: &str = ".gitignore";

/// Switches for the optional stages of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub generate_migration_scripts: bool,
    pub check_validation: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            generate_migration_scripts: false,
            check_validation: true,
        }
    }
}

/// A stage that produced less than it could, without failing the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// A suggestion document was absent or unparsable.
    PartialDocumentData {
        document: String,
        path: PathBuf,
        reason: String,
    },
    /// A migration script had nothing to do and was not generated.
    ScriptSkipped { script: String, reason: String },
    /// The status ledger could not be read or written.
    StatusUnavailable { path: PathBuf, reason: String },
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degradation::PartialDocumentData {
                document,
                path,
                reason,
            } => write!(f, "{} ({}): {}", document, path.display(), reason),
            Degradation::ScriptSkipped { script, reason } => {
                write!(f, "{} skipped: {}", script, reason)
            }
            Degradation::StatusUnavailable { path, reason } => {
                write!(f, "status ledger {} unavailable: {}", path.display(), reason)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResults {
    pub superseded: Vec<SupersededSuggestion>,
    pub inapplicable: Vec<InapplicableSuggestion>,
}

/// Every artifact of one run, including the rendered report.
#[derive(Debug, Clone)]
pub struct ComparisonOutput {
    pub current: ProjectStructure,
    pub proposed: ProposedStructure,
    pub checklist: Vec<ChecklistEntry>,
    pub comparison: ComparisonResult,
    pub gaps: Vec<Gap>,
    pub conflicts: Vec<Conflict>,
    pub mismatches: Vec<DirectoryMismatch>,
    pub moves: Vec<DirectoryMove>,
    pub import_impacts: Vec<ImportImpact>,
    /// `None` when validation was switched off.
    pub validation: Option<ValidationResults>,
    pub tasks: Vec<Task>,
    pub work_packages: Vec<WorkPackage>,
    pub quick_wins: Vec<Task>,
    /// File name to checked item to presence.
    pub config_checks: BTreeMap<String, BTreeMap<String, bool>>,
    pub migration_scripts: Vec<MigrationScript>,
    /// Ledger after synchronisation, when a status file was configured.
    pub status: Option<StatusFile>,
    pub degradations: Vec<Degradation>,
    pub report: String,
}

/// Documents that parsed, plus what went wrong with the rest.
struct ParsedInputs {
    improvements: Vec<Improvement>,
    structure: ProposedStructure,
    checklist: Vec<ChecklistEntry>,
    degradations: Vec<Degradation>,
}

pub struct ComparisonEngine {
    project_root: PathBuf,
    docs_path: PathBuf,
    config: LayoutmapConfig,
    status_path: Option<PathBuf>,
}

impl ComparisonEngine {
    /// Engine with default configuration.
    pub fn new(project_root: impl Into<PathBuf>, docs_path: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            docs_path: docs_path.into(),
            config: LayoutmapConfig::default(),
            status_path: None,
        }
    }

    /// Engine configured from the nearest `.layoutmap.toml` above the root.
    pub fn from_project(project_root: impl Into<PathBuf>, docs_path: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let config = load_config_from(&project_root);
        Self::new(project_root, docs_path).with_config(config)
    }

    pub fn with_config(mut self, mut config: LayoutmapConfig) -> Self {
        for reset in config.sanitize() {
            log::warn!("Invalid configuration, using default: {}", reset);
        }
        self.config = config;
        self
    }

    pub fn with_status_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.status_path = Some(path.into());
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn docs_path(&self) -> &Path {
        &self.docs_path
    }

    pub fn config(&self) -> &LayoutmapConfig {
        &self.config
    }

    pub fn run_comparison(&self, options: RunOptions) -> Result<ComparisonOutput> {
        log::info!(
            "Comparing {} against documents in {}",
            self.project_root.display(),
            self.docs_path.display()
        );

        let current = self.scan()?;
        let ParsedInputs {
            improvements,
            structure,
            checklist,
            mut degradations,
        } = self.parse_documents()?;
        let proposed = ProposedStructure {
            improvements,
            ..structure
        };
        if proposed.directories.is_empty() {
            log::warn!("No proposed directories found; the comparison will be empty");
        }

        let comparison = StructureComparator::new().compare_structures(&current, &proposed);

        let matrix = PriorityMatrix::from_config(&self.config.planning);
        let mut gaps =
            GapAnalyzer::new().identify_gaps_with_context(&comparison, &current, &proposed);
        matrix.apply(&mut gaps);
        log::debug!("Identified {} gaps", gaps.len());

        let detector = ConflictDetector::new();
        let conflicts = detector.detect_conflicts(&current, &proposed);
        let mismatches = detector.detect_mismatches(&current, &proposed);
        let moves = derive_moves(&comparison, &conflicts, &mismatches);
        let move_pairs: Vec<(String, String)> = moves
            .iter()
            .map(|m| (m.source.clone(), m.destination.clone()))
            .collect();
        let import_impacts = detector.check_import_impacts(&move_pairs);

        let validation = options.check_validation.then(|| {
            let checker = ValidationChecker::new();
            ValidationResults {
                superseded: checker.identify_superseded_suggestions(&current, &proposed),
                inapplicable: checker.flag_inapplicable_suggestions(&current, &proposed),
            }
        });

        let generator = TaskGenerator::new(matrix);
        let tasks = generator.prioritize_tasks(&generator.generate_tasks(&gaps))?;
        let work_packages = generator.group_related_tasks(&tasks);
        let quick_wins = quick_wins(&tasks, self.config.planning.quick_win_hours);
        log::debug!(
            "Planned {} tasks in {} work packages ({} quick wins)",
            tasks.len(),
            work_packages.len(),
            quick_wins.len()
        );

        let config_checks = self.check_configuration();

        let migration_scripts = if options.generate_migration_scripts {
            self.generate_scripts(&current, &moves, &mut degradations)
        } else {
            Vec::new()
        };

        let status = self.sync_status(&proposed.improvements, &comparison, &mut degradations);

        for degradation in &degradations {
            match degradation {
                Degradation::ScriptSkipped { .. } => log::info!("{}", degradation),
                _ => log::warn!("{}", degradation),
            }
        }

        let (superseded, inapplicable) = validation
            .as_ref()
            .map(|v| (v.superseded.as_slice(), v.inapplicable.as_slice()))
            .unwrap_or_default();
        let reporter =
            ComparisonReporter::new().with_quick_win_hours(self.config.planning.quick_win_hours);
        let report = reporter.generate_detailed_report(
            &comparison,
            &gaps,
            &conflicts,
            ReportExtras {
                mismatches: &mismatches,
                superseded,
                inapplicable,
                tasks: &tasks,
                quick_wins: Some(&quick_wins),
                work_packages: &work_packages,
                config_checks: Some(&config_checks),
            },
        );

        log::info!(
            "Comparison complete: {:.1}% of {} proposed directories",
            comparison.completion_percentage,
            comparison.total()
        );

        Ok(ComparisonOutput {
            current,
            proposed,
            checklist,
            comparison,
            gaps,
            conflicts,
            mismatches,
            moves,
            import_impacts,
            validation,
            tasks,
            work_packages,
            quick_wins,
            config_checks,
            migration_scripts,
            status,
            degradations,
            report,
        })
    }

    /// I/O: write the report, creating parent directories.
    pub fn save_report(&self, report: &str, path: &Path) -> Result<()> {
        io::write_file(path, report)?;
        log::info!("Report written to {}", path.display());
        Ok(())
    }

    /// I/O: write each script into `dir` with execute permission.
    pub fn save_migration_scripts(
        &self,
        scripts: &[MigrationScript],
        dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        io::ensure_dir(dir)?;
        let mut written = Vec::with_capacity(scripts.len());
        for script in scripts {
            let path = dir.join(script.file_name());
            io::write_executable(&path, &script.render())?;
            written.push(path);
        }
        log::info!("Wrote {} migration scripts to {}", written.len(), dir.display());
        Ok(written)
    }

    fn scan(&self) -> Result<ProjectStructure> {
        let scan = &self.config.scan;
        DirectoryScanner::new(&self.project_root)
            .with_ignored_dirs(scan.ignore_dirs.clone())
            .with_config_files(scan.config_files.clone())
            .with_lib_dir(scan.lib_dir.clone())
            .scan(scan.max_depth)
    }

    fn document_path(&self, kind: DocumentKind) -> PathBuf {
        let documents = &self.config.documents;
        let name = match kind {
            DocumentKind::Improvements => &documents.improvements,
            DocumentKind::Structure => &documents.structure,
            DocumentKind::Checklist => &documents.checklist,
        };
        self.docs_path.join(name)
    }

    fn parse_documents(&self) -> Result<ParsedInputs> {
        let parser = SuggestionParser::new();
        let mut inputs = ParsedInputs {
            improvements: Vec::new(),
            structure: ProposedStructure::default(),
            checklist: Vec::new(),
            degradations: Vec::new(),
        };
        let mut failures = Vec::new();

        for kind in DocumentKind::ALL {
            let path = self.document_path(kind);
            let parsed = if io::file_exists(&path) {
                parser.parse_document(kind, &path).map_err(|e| e.to_string())
            } else {
                Err("document not found".to_string())
            };

            match parsed {
                Ok(ParsedDocument::Improvements(improvements)) => {
                    inputs.improvements = improvements
                }
                Ok(ParsedDocument::Structure(structure)) => inputs.structure = structure,
                Ok(ParsedDocument::Checklist(checklist)) => inputs.checklist = checklist,
                Err(reason) => {
                    failures.push(format!("{}: {}", path.display(), reason));
                    inputs.degradations.push(Degradation::PartialDocumentData {
                        document: kind.label().to_string(),
                        path,
                        reason,
                    });
                }
            }
        }

        if failures.len() == DocumentKind::ALL.len() {
            return Err(Error::NoParsableDocuments {
                docs_path: self.docs_path.clone(),
                failures,
            });
        }
        log::debug!(
            "Parsed documents: {} improvements, {} proposed directories, {} checklist items",
            inputs.improvements.len(),
            inputs.structure.directories.len(),
            inputs.checklist.len()
        );
        Ok(inputs)
    }

    fn check_configuration(&self) -> BTreeMap<String, BTreeMap<String, bool>> {
        let verifier = ConfigurationVerifier::new();
        let verify = &self.config.verify;
        let mut checks = BTreeMap::new();
        checks.insert(
            PYPROJECT_FILE.to_string(),
            verifier.check_pyproject_sections(
                &self.project_root.join(PYPROJECT_FILE),
                &verify.pyproject_sections,
            ),
        );
        checks.insert(
            GITIGNORE_FILE.to_string(),
            verifier.check_gitignore_excludes(
                &self.project_root.join(GITIGNORE_FILE),
                &verify.gitignore_patterns,
            ),
        );
        checks
    }

    /// Backup first, then cleanup, moves and import rewrites, then one
    /// rollback undoing all of them.
    fn generate_scripts(
        &self,
        current: &ProjectStructure,
        moves: &[DirectoryMove],
        degradations: &mut Vec<Degradation>,
    ) -> Vec<MigrationScript> {
        let generator =
            MigrationScriptGenerator::from_config(&self.project_root, &self.config.migration)
                .with_lib_dir(self.config.scan.lib_dir.clone());
        let vendored = current.lib_info.as_ref().filter(|lib| lib.has_packages());
        let mut skipped = |script: &str, reason: &str| {
            degradations.push(Degradation::ScriptSkipped {
                script: script.to_string(),
                reason: reason.to_string(),
            })
        };

        let mut backup_paths: Vec<String> = moves.iter().map(|m| m.source.clone()).collect();
        if vendored.is_some() {
            backup_paths.push(normalize_dir_path(&self.config.scan.lib_dir));
        }

        let mut scripts = Vec::new();
        if backup_paths.is_empty() {
            skipped("backup.sh", "no directories are moved or removed");
        } else {
            scripts.push(generator.generate_backup_script(&backup_paths));
        }

        match vendored {
            Some(lib) => scripts.push(generator.generate_lib_cleanup_script(lib)),
            None => skipped("lib_cleanup.sh", "no vendored dependency directory found"),
        }

        if moves.is_empty() {
            skipped("directory_move.sh", "no directory moves derived");
            skipped("import_update.sh", "no directory moves derived");
        } else {
            scripts.push(generator.generate_directory_move_script(moves));
            scripts.push(generator.generate_import_update_script(moves));
        }

        if scripts.is_empty() {
            skipped("rollback.sh", "no migration scripts generated");
        } else {
            let rollback = generator.generate_combined_rollback(&scripts);
            scripts.push(rollback);
        }
        log::debug!("Generated {} migration scripts", scripts.len());
        scripts
    }

    fn sync_status(
        &self,
        improvements: &[Improvement],
        comparison: &ComparisonResult,
        degradations: &mut Vec<Degradation>,
    ) -> Option<StatusFile> {
        let path = self.status_path.as_ref()?;
        let synced = StatusTracker::new(path).and_then(|mut tracker| {
            tracker.sync_from_comparison(improvements, comparison)?;
            Ok(tracker.status_file().clone())
        });
        match synced {
            Ok(status) => Some(status),
            Err(err) => {
                degradations.push(Degradation::StatusUnavailable {
                    path: path.clone(),
                    reason: err.to_string(),
                });
                None
            }
        }
    }
}

/// Pure: moves implied by the comparison.
///
/// A case-mismatched directory is renamed to the proposed spelling. A missing
/// proposed directory is filled by an unmatched sibling that is one of its
/// aliases (`documentation/` for `docs/`). Each source moves at most once.
pub fn derive_moves(
    comparison: &ComparisonResult,
    conflicts: &[Conflict],
    mismatches: &[DirectoryMismatch],
) -> Vec<DirectoryMove> {
    let mut moves = Vec::new();
    let mut sources = BTreeSet::new();

    for conflict in conflicts.iter().filter(|c| c.conflict_type == CASE_MISMATCH) {
        if let [found, wanted] = conflict.affected_paths.as_slice() {
            let source = normalize_dir_path(found);
            if sources.insert(source.clone()) {
                moves.push(DirectoryMove::new(
                    source,
                    normalize_dir_path(wanted),
                    "Match the proposed capitalization",
                ));
            }
        }
    }

    for (path, status) in &comparison.directory_statuses {
        if *status != DirectoryStatus::Missing {
            continue;
        }
        let wanted = normalize_dir_path(path);
        let parent = parent_dir(&wanted);
        let leaf = leaf_name(&wanted).to_lowercase();

        let alias = mismatches.iter().find(|m| {
            parent_dir(&m.path) == parent
                && !sources.contains(&m.path)
                && are_aliases(&leaf_name(&m.path).to_lowercase(), &leaf)
        });
        if let Some(mismatch) = alias {
            sources.insert(mismatch.path.clone());
            moves.push(DirectoryMove::new(
                mismatch.path.clone(),
                wanted.clone(),
                format!("{}/ holds what the proposal calls {}/", mismatch.path, wanted),
            ));
        }
    }

    moves
}
