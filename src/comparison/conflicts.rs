use std::collections::BTreeSet;

use super::comparator::{locate, StructureComparator};
use crate::core::{
    normalize_dir_path, parent_dir, Conflict, DirectoryMismatch, DirectoryStatus, ImportImpact,
    ProjectStructure, ProposedStructure, Severity, ROOT_KEY,
};

/// Loose files in a directory before restructuring it counts as a conflict.
pub const LOOSE_FILE_THRESHOLD: usize = 10;

pub const PATH_OCCUPIED: &str = "path_occupied";
pub const CASE_MISMATCH: &str = "case_mismatch";
pub const CONTENT_RESTRUCTURE: &str = "content_restructure";
pub const VENDORED_DEPENDENCIES: &str = "vendored_dependencies";

#[derive(Debug, Default, Clone, Copy)]
pub struct ConflictDetector;

impl ConflictDetector {
    pub fn new() -> Self {
        Self
    }

    /// Directories that structurally disagree with the proposal.
    pub fn detect_conflicts(
        &self,
        current: &ProjectStructure,
        proposed: &ProposedStructure,
    ) -> Vec<Conflict> {
        let comparator = StructureComparator::new();
        let mut conflicts = Vec::new();

        for (path, dir) in &proposed.directories {
            let Some((found, info)) = locate(current, path) else {
                continue;
            };
            let expected = normalize_dir_path(path);

            if comparator.check_directory_status(path, current, dir) == DirectoryStatus::Conflict {
                conflicts.push(Conflict {
                    conflict_type: PATH_OCCUPIED.to_string(),
                    description: format!(
                        "{} is proposed as a new directory but already exists with unrelated subdirectories: {}",
                        path,
                        info.subdirectories.join(", ")
                    ),
                    affected_paths: vec![path.clone()],
                    severity: Severity::High,
                    mitigation: format!(
                        "Move the existing contents of {} elsewhere or rename the proposed directory",
                        path
                    ),
                });
                continue;
            }

            if found != expected {
                conflicts.push(Conflict {
                    conflict_type: CASE_MISMATCH.to_string(),
                    description: format!(
                        "{} exists as {}/ with different capitalization",
                        path, found
                    ),
                    affected_paths: vec![format!("{}/", found), path.clone()],
                    severity: Severity::Low,
                    mitigation: format!("Rename {}/ to {} with git mv", found, path),
                });
            }

            let none_present = !dir.subdirectories.is_empty()
                && !dir
                    .subdirectories
                    .iter()
                    .any(|sub| info.has_subdirectory(sub.trim_end_matches('/')));
            if none_present && info.file_count >= LOOSE_FILE_THRESHOLD {
                conflicts.push(Conflict {
                    conflict_type: CONTENT_RESTRUCTURE.to_string(),
                    description: format!(
                        "{} holds {} loose files but the proposal expects them grouped into {}",
                        path,
                        info.file_count,
                        dir.subdirectories.join(", ")
                    ),
                    affected_paths: vec![path.clone()],
                    severity: Severity::Medium,
                    mitigation: "Move files into the proposed subdirectories and update imports"
                        .to_string(),
                });
            }
        }

        if let Some(lib) = current.lib_info.as_ref().filter(|lib| lib.has_packages()) {
            let lib_proposed = proposed
                .directories
                .keys()
                .any(|path| normalize_dir_path(path) == "lib");
            if !lib_proposed {
                conflicts.push(Conflict {
                    conflict_type: VENDORED_DEPENDENCIES.to_string(),
                    description: format!(
                        "lib/ vendors {} packages ({:.1} MB) that the proposal manages as declared dependencies",
                        lib.package_count, lib.total_size_mb
                    ),
                    affected_paths: vec!["lib/".to_string()],
                    severity: Severity::Medium,
                    mitigation: "Record the packages in requirements.txt and remove lib/ with the generated cleanup script"
                        .to_string(),
                });
            }
        }

        log::debug!("Detected {} conflicts", conflicts.len());
        conflicts
    }

    /// Import-module rename implied by each `(old, new)` file move.
    pub fn check_import_impacts(&self, file_moves: &[(String, String)]) -> Vec<ImportImpact> {
        file_moves
            .iter()
            .map(|(old, new)| {
                let old_module = module_name(old);
                let new_module = module_name(new);
                ImportImpact {
                    old_path: old.clone(),
                    new_path: new.clone(),
                    requires_update: old_module != new_module,
                    old_module,
                    new_module,
                }
            })
            .collect()
    }

    /// Existing directories with no counterpart in the proposal.
    ///
    /// Only directories directly under the root or under a proposed directory
    /// are considered, so unrelated deep trees are reported once at their top.
    pub fn detect_mismatches(
        &self,
        current: &ProjectStructure,
        proposed: &ProposedStructure,
    ) -> Vec<DirectoryMismatch> {
        let proposed_paths: BTreeSet<String> = proposed
            .directories
            .keys()
            .map(|p| normalize_dir_path(p).to_lowercase())
            .collect();

        let listed_children: BTreeSet<String> = proposed
            .directories
            .iter()
            .flat_map(|(path, dir)| {
                let parent = normalize_dir_path(path);
                dir.subdirectories
                    .iter()
                    .map(move |sub| join(&parent, sub.trim_end_matches('/')).to_lowercase())
            })
            .collect();

        let mismatches: Vec<DirectoryMismatch> = current
            .non_root_directories()
            .filter_map(|(key, info)| {
                let lowered = key.to_lowercase();
                if proposed_paths.contains(&lowered) || listed_children.contains(&lowered) {
                    return None;
                }
                let is_ancestor = proposed_paths
                    .iter()
                    .any(|p| p.starts_with(&format!("{}/", lowered)));
                if is_ancestor {
                    return None;
                }

                let parent = parent_dir(key);
                let reason = if parent == ROOT_KEY {
                    "Top-level directory not present in the proposed structure".to_string()
                } else if proposed_paths.contains(&parent.to_lowercase()) {
                    format!("Not listed under proposed directory {}/", parent)
                } else {
                    return None;
                };

                Some(DirectoryMismatch {
                    path: key.clone(),
                    reason,
                    file_count: info.file_count,
                    subdirectories: info.subdirectories.clone(),
                })
            })
            .collect();

        log::debug!("Detected {} directory mismatches", mismatches.len());
        mismatches
    }
}

fn join(parent: &str, child: &str) -> String {
    if parent == ROOT_KEY {
        child.to_string()
    } else {
        format!("{}/{}", parent, child)
    }
}

/// Pure: dotted import module for a file path, `pkg/__init__.py` -> `pkg`.
pub fn module_name(path: &str) -> String {
    let normalized = normalize_dir_path(path);
    let without_ext = match normalized.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.contains('/') => stem,
        _ => normalized.as_str(),
    };
    let without_init = without_ext
        .strip_suffix("/__init__")
        .unwrap_or(without_ext);
    without_init.replace('/', ".")
}
