//! Bounded directory walk producing a [`ProjectStructure`] snapshot.

pub mod library;

pub use library::{package_name, LibraryAnalyzer};

use crate::core::{DirectoryInfo, ProjectStructure, ROOT_KEY};
use crate::errors::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directories never descended into: VCS metadata, caches, virtualenvs,
/// dependency trees and build output.
pub const DEFAULT_IGNORED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
    ".ruff_cache",
    ".tox",
    ".venv",
    "venv",
    "node_modules",
    "target",
    ".eggs",
];

/// Configuration files whose presence at the root is reported.
pub const DEFAULT_CONFIG_FILES: &[&str] = &[
    "pyproject.toml",
    "requirements.txt",
    "requirements-dev.txt",
    "setup.py",
    "setup.cfg",
    "Dockerfile",
    "docker-compose.yml",
    ".gitignore",
    ".env.example",
    "Makefile",
    "README.md",
    "Cargo.toml",
    "package.json",
];

pub struct DirectoryScanner {
    root: PathBuf,
    ignored_dirs: Vec<String>,
    config_files: Vec<String>,
    lib_dir: String,
}

impl DirectoryScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ignored_dirs: DEFAULT_IGNORED_DIRS.iter().map(|s| s.to_string()).collect(),
            config_files: DEFAULT_CONFIG_FILES.iter().map(|s| s.to_string()).collect(),
            lib_dir: "lib".to_string(),
        }
    }

    pub fn with_ignored_dirs(mut self, dirs: Vec<String>) -> Self {
        self.ignored_dirs = dirs;
        self
    }

    pub fn with_config_files(mut self, files: Vec<String>) -> Self {
        self.config_files = files;
        self
    }

    pub fn with_lib_dir(mut self, lib_dir: impl Into<String>) -> Self {
        self.lib_dir = lib_dir.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the root up to `max_depth` levels (0 records the root only).
    pub fn scan(&self, max_depth: usize) -> Result<ProjectStructure> {
        self.validate_root()?;

        let mut structure = ProjectStructure::new(self.root.clone());
        let walker = WalkDir::new(&self.root)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_ignored_entry(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    log::debug!("Skipping unreadable entry: {}", err);
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            let key = self.relative_key(entry.path());
            structure.insert(self.describe_directory(entry.path(), key));
        }

        structure.config_files = self.find_config_files();

        let lib_path = self.root.join(&self.lib_dir);
        if lib_path.is_dir() {
            structure.lib_info = Some(LibraryAnalyzer::new().analyze_lib_directory(&lib_path));
        }

        log::debug!(
            "Scanned {}: {} directories (max depth {})",
            self.root.display(),
            structure.directories.len(),
            max_depth
        );
        Ok(structure)
    }

    /// Presence of every configured file name at the root; no name is omitted.
    pub fn find_config_files(&self) -> BTreeMap<String, bool> {
        self.config_files
            .iter()
            .map(|name| (name.clone(), self.root.join(name).is_file()))
            .collect()
    }

    pub fn check_directory_exists(&self, relative: &str) -> bool {
        self.root.join(relative.trim_start_matches("./")).is_dir()
    }

    /// Sorted immediate subdirectory names of `relative`, noise excluded.
    /// A missing path or a file yields an empty list.
    pub fn get_subdirectories(&self, relative: &str) -> Vec<String> {
        let path = self.root.join(relative.trim_start_matches("./"));
        self.list_children(&path).0
    }

    fn validate_root(&self) -> Result<()> {
        if !self.root.exists() {
            return Err(Error::InvalidRoot {
                path: self.root.clone(),
                reason: "path does not exist".to_string(),
            });
        }
        if !self.root.is_dir() {
            return Err(Error::InvalidRoot {
                path: self.root.clone(),
                reason: "path is not a directory".to_string(),
            });
        }
        Ok(())
    }

    fn is_ignored_entry(&self, entry: &DirEntry) -> bool {
        entry.file_type().is_dir() && self.is_ignored_name(&entry.file_name().to_string_lossy())
    }

    fn is_ignored_name(&self, name: &str) -> bool {
        name.ends_with(".egg-info") || self.ignored_dirs.iter().any(|ignored| ignored == name)
    }

    fn relative_key(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(rel) if rel.as_os_str().is_empty() => ROOT_KEY.to_string(),
            Ok(rel) => rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => path.to_string_lossy().into_owned(),
        }
    }

    fn describe_directory(&self, path: &Path, key: String) -> DirectoryInfo {
        let (subdirectories, files) = self.list_children(path);
        DirectoryInfo::new(key)
            .with_subdirectories(subdirectories)
            .with_files(files)
    }

    /// Sorted subdirectory names and sorted direct file names.
    fn list_children(&self, path: &Path) -> (Vec<String>, Vec<String>) {
        let entries = match fs::read_dir(path) {
            Ok(entries) => entries,
            Err(_) => return (Vec::new(), Vec::new()),
        };

        let mut subdirectories = Vec::new();
        let mut files = Vec::new();
        for entry in entries.filter_map(|e| e.ok()) {
            let child = entry.path();
            if child.is_dir() {
                let name = entry.file_name().to_string_lossy().into_owned();
                if !self.is_ignored_name(&name) {
                    subdirectories.push(name);
                }
            } else if child.is_file() {
                files.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        subdirectories.sort();
        files.sort();
        (subdirectories, files)
    }
}

/// Scan `root` with default settings.
pub fn scan(root: &Path, max_depth: usize) -> Result<ProjectStructure> {
    DirectoryScanner::new(root).scan(max_depth)
}
