//! Snapshot of a scanned project tree.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Key used for the project root in [`ProjectStructure::directories`].
pub const ROOT_KEY: &str = ".";

/// One directory visited by the scanner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryInfo {
    pub path: String,
    pub exists: bool,
    /// Immediate subdirectory names, sorted.
    #[serde(default)]
    pub subdirectories: Vec<String>,
    /// Files directly inside the directory (not recursive).
    #[serde(default)]
    pub file_count: usize,
    /// Names of those files, sorted.
    #[serde(default)]
    pub files: Vec<String>,
}

impl DirectoryInfo {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            exists: true,
            subdirectories: Vec::new(),
            file_count: 0,
            files: Vec::new(),
        }
    }

    pub fn with_subdirectories<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subdirectories = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_file_count(mut self, count: usize) -> Self {
        self.file_count = count;
        self
    }

    /// Record file names; the file count follows the list.
    pub fn with_files<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files = names.into_iter().map(Into::into).collect();
        self.file_count = self.files.len();
        self
    }

    pub fn has_file(&self, name: &str) -> bool {
        self.files.iter().any(|f| f == name)
    }

    pub fn has_subdirectory(&self, name: &str) -> bool {
        self.subdirectories.iter().any(|s| s == name)
    }

    pub fn is_empty(&self) -> bool {
        self.file_count == 0 && self.subdirectories.is_empty()
    }
}

/// Summary of a vendored-dependency directory such as `lib/`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryInfo {
    pub exists: bool,
    #[serde(default)]
    pub package_count: usize,
    #[serde(default)]
    pub total_size_mb: f64,
    #[serde(default)]
    pub packages: Vec<String>,
}

impl LibraryInfo {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn has_packages(&self) -> bool {
        self.exists && self.package_count > 0
    }
}

/// Immutable result of one scan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectStructure {
    pub root_path: PathBuf,
    /// Relative path (forward slashes, no trailing slash) to directory info.
    #[serde(default)]
    pub directories: BTreeMap<String, DirectoryInfo>,
    /// Known configuration file name to presence at the root.
    #[serde(default)]
    pub config_files: BTreeMap<String, bool>,
    #[serde(default)]
    pub lib_info: Option<LibraryInfo>,
}

impl ProjectStructure {
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            directories: BTreeMap::new(),
            config_files: BTreeMap::new(),
            lib_info: None,
        }
    }

    /// Insert a directory keyed by its normalized path.
    pub fn insert(&mut self, info: DirectoryInfo) {
        self.directories.insert(normalize_dir_path(&info.path), info);
    }

    /// Exact lookup after normalizing `path`. Entries recorded as not
    /// existing are treated as absent.
    pub fn get(&self, path: &str) -> Option<&DirectoryInfo> {
        self.directories
            .get(&normalize_dir_path(path))
            .filter(|info| info.exists)
    }

    /// Case-insensitive lookup, returning the key as recorded by the scan.
    pub fn find_case_insensitive(&self, path: &str) -> Option<(&str, &DirectoryInfo)> {
        let wanted = normalize_dir_path(path).to_lowercase();
        self.directories
            .iter()
            .filter(|(_, info)| info.exists)
            .find(|(key, _)| key.to_lowercase() == wanted)
            .map(|(key, info)| (key.as_str(), info))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Existing directories excluding the root entry.
    pub fn non_root_directories(&self) -> impl Iterator<Item = (&String, &DirectoryInfo)> {
        self.directories
            .iter()
            .filter(|(key, info)| key.as_str() != ROOT_KEY && info.exists)
    }
}

/// Normalize a directory path to the scanner's key format: forward slashes,
/// no `./` prefix, no trailing slash, and `.` for the root.
pub fn normalize_dir_path(path: &str) -> String {
    let unified = path.trim().replace('\\', "/");
    let mut trimmed = unified.as_str();
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest;
    }
    let trimmed = trimmed.trim_end_matches('/');
    if trimmed.is_empty() || trimmed == "." {
        ROOT_KEY.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parent key of a normalized path (`.` for top-level entries).
pub fn parent_dir(path: &str) -> String {
    let normalized = normalize_dir_path(path);
    match normalized.rsplit_once('/') {
        Some((parent, _)) => parent.to_string(),
        None => ROOT_KEY.to_string(),
    }
}

/// Last segment of a normalized path.
pub fn leaf_name(path: &str) -> String {
    let normalized = normalize_dir_path(path);
    normalized
        .rsplit('/')
        .next()
        .unwrap_or(normalized.as_str())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_dir_path() {
        assert_eq!(normalize_dir_path("docs/"), "docs");
        assert_eq!(normalize_dir_path("./docs/api/"), "docs/api");
        assert_eq!(normalize_dir_path("docs\\api"), "docs/api");
        assert_eq!(normalize_dir_path(""), ".");
        assert_eq!(normalize_dir_path("./"), ".");
        assert_eq!(normalize_dir_path("."), ".");
    }

    #[test]
    fn test_parent_and_leaf() {
        assert_eq!(parent_dir("docs/api/"), "docs");
        assert_eq!(parent_dir("docs/"), ".");
        assert_eq!(leaf_name("docs/api/"), "api");
        assert_eq!(leaf_name("docs"), "docs");
    }

    #[test]
    fn test_lookup_ignores_trailing_slash_and_missing_entries() {
        let mut structure = ProjectStructure::new("/project");
        structure.insert(DirectoryInfo::new("docs"));
        let mut ghost = DirectoryInfo::new("ghost");
        ghost.exists = false;
        structure.insert(ghost);

        assert!(structure.contains("docs/"));
        assert!(structure.contains("./docs"));
        assert!(!structure.contains("ghost"));
        assert!(structure.find_case_insensitive("DOCS/").is_some());
    }
}
