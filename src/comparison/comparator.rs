use std::collections::BTreeMap;

use crate::core::{
    normalize_dir_path, ComparisonResult, DirectoryInfo, DirectoryStatus, ProjectStructure,
    ProposedDirectory, ProposedStructure,
};

/// Assigns one [`DirectoryStatus`] to every proposed directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructureComparator;

impl StructureComparator {
    pub fn new() -> Self {
        Self
    }

    /// Fold [`Self::check_directory_status`] over every proposed path.
    pub fn compare_structures(
        &self,
        current: &ProjectStructure,
        proposed: &ProposedStructure,
    ) -> ComparisonResult {
        let statuses: BTreeMap<String, DirectoryStatus> = proposed
            .directories
            .iter()
            .map(|(path, dir)| (path.clone(), self.check_directory_status(path, current, dir)))
            .collect();

        let result = ComparisonResult::from_statuses(statuses);
        log::debug!(
            "Compared {} proposed directories: {} implemented, {} partial, {} missing",
            result.total(),
            result.implemented_count,
            result.partial_count,
            result.missing_count
        );
        result
    }

    /// Status of one proposed directory.
    ///
    /// A directory the proposal marks as new that already exists with its own
    /// subdirectories, none of which the proposal expects, is a CONFLICT: the
    /// path is taken by something else. Everything else present is either
    /// IMPLEMENTED or PARTIAL.
    pub fn check_directory_status(
        &self,
        path: &str,
        current: &ProjectStructure,
        proposed: &ProposedDirectory,
    ) -> DirectoryStatus {
        let Some((_, info)) = locate(current, path) else {
            return DirectoryStatus::Missing;
        };

        if is_occupied_by_other_content(info, proposed) {
            return DirectoryStatus::Conflict;
        }

        let subdirs_present = proposed
            .subdirectories
            .iter()
            .all(|sub| has_child_dir(info, sub));
        let files_present = proposed
            .required_files
            .iter()
            .all(|file| has_child_file(info, file));

        if subdirs_present && files_present {
            DirectoryStatus::Implemented
        } else {
            DirectoryStatus::Partial
        }
    }

    /// Expected subdirectory name to presence under `parent`; keys equal
    /// `expected` exactly.
    pub fn verify_subdirectories(
        &self,
        parent: &str,
        expected: &[String],
        current: &ProjectStructure,
    ) -> BTreeMap<String, bool> {
        let info = locate(current, parent).map(|(_, info)| info);
        expected
            .iter()
            .map(|name| {
                let present = info.is_some_and(|info| has_child_dir(info, name));
                (name.clone(), present)
            })
            .collect()
    }

    /// Expected children of `proposed` not found on disk. Subdirectories keep
    /// a trailing `/`.
    pub fn missing_items(
        &self,
        path: &str,
        current: &ProjectStructure,
        proposed: &ProposedDirectory,
    ) -> Vec<String> {
        let info = locate(current, path).map(|(_, info)| info);
        let missing_dirs = proposed
            .subdirectories
            .iter()
            .filter(|sub| !info.is_some_and(|info| has_child_dir(info, sub)))
            .map(|sub| format!("{}/", sub.trim_end_matches('/')));
        let missing_files = proposed
            .required_files
            .iter()
            .filter(|file| !info.is_some_and(|info| has_child_file(info, file)))
            .cloned();
        missing_dirs.chain(missing_files).collect()
    }
}

/// Look up a directory exactly, then case-insensitively.
pub fn locate<'a>(current: &'a ProjectStructure, path: &str) -> Option<(String, &'a DirectoryInfo)> {
    let key = normalize_dir_path(path);
    if let Some(info) = current.get(&key) {
        return Some((key, info));
    }
    current
        .find_case_insensitive(&key)
        .map(|(found, info)| (found.to_string(), info))
}

fn has_child_dir(info: &DirectoryInfo, name: &str) -> bool {
    let name = name.trim_matches('/');
    info.subdirectories
        .iter()
        .any(|sub| sub == name || sub.eq_ignore_ascii_case(name))
}

fn has_child_file(info: &DirectoryInfo, name: &str) -> bool {
    info.files.iter().any(|file| file == name)
}

fn is_occupied_by_other_content(info: &DirectoryInfo, proposed: &ProposedDirectory) -> bool {
    proposed.is_new
        && !info.subdirectories.is_empty()
        && !proposed.subdirectories.is_empty()
        && !proposed
            .subdirectories
            .iter()
            .any(|sub| has_child_dir(info, sub))
        && !proposed
            .required_files
            .iter()
            .any(|file| has_child_file(info, file))
}
