//! Vendored-dependency directory analysis (`lib/` and friends).

use crate::core::LibraryInfo;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Suffixes removed from entry names before version stripping, longest first.
const PACKAGE_SUFFIXES: &[&str] = &[
    ".dist-info",
    ".egg-info",
    ".tar.gz",
    ".egg",
    ".whl",
    ".zip",
    ".py",
];

/// File entries treated as packages; other loose files are ignored.
const PACKAGE_FILE_SUFFIXES: &[&str] = &[".egg", ".whl", ".tar.gz", ".zip", ".py"];

/// `name-1.2.3...` and `name-v1...`: everything from the version onwards.
static VERSION_TAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>.+?)-v?\d").expect("version regex is valid")
});

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Default, Clone, Copy)]
pub struct LibraryAnalyzer;

impl LibraryAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Summarize a vendored directory. A missing path yields `exists == false`.
    pub fn analyze_lib_directory(&self, lib_path: &Path) -> LibraryInfo {
        if !lib_path.is_dir() {
            return LibraryInfo::absent();
        }

        let packages = self.extract_dependencies(lib_path);
        let total_bytes = directory_size(lib_path);
        log::debug!(
            "Analyzed {}: {} packages, {} bytes",
            lib_path.display(),
            packages.len(),
            total_bytes
        );

        LibraryInfo {
            exists: true,
            package_count: packages.len(),
            total_size_mb: round_mb(total_bytes as f64 / BYTES_PER_MB),
            packages,
        }
    }

    /// Sorted, deduplicated package names inferred from top-level entries.
    pub fn extract_dependencies(&self, lib_path: &Path) -> Vec<String> {
        let entries = match fs::read_dir(lib_path) {
            Ok(entries) => entries,
            Err(e) => {
                log::debug!("Cannot read {}: {}", lib_path.display(), e);
                return Vec::new();
            }
        };

        let names: BTreeSet<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                let is_dir = entry.path().is_dir();
                if should_skip_entry(&name) || (!is_dir && !is_package_file(&name)) {
                    return None;
                }
                package_name(&name)
            })
            .collect();

        names.into_iter().collect()
    }
}

fn should_skip_entry(name: &str) -> bool {
    name.starts_with('.') || name.starts_with("__")
}

fn is_package_file(name: &str) -> bool {
    PACKAGE_FILE_SUFFIXES
        .iter()
        .any(|suffix| name.ends_with(suffix))
}

/// Pure: infer the package name of one `lib/` entry.
pub fn package_name(entry_name: &str) -> Option<String> {
    let mut name = entry_name.trim();
    for suffix in PACKAGE_SUFFIXES {
        if let Some(stripped) = name.strip_suffix(suffix) {
            name = stripped;
            break;
        }
    }

    let name = match VERSION_TAIL.captures(name) {
        Some(caps) => caps.name("name").map(|m| m.as_str()).unwrap_or(name),
        None => name,
    };

    let name = name.trim_end_matches(['-', '_', '.']);
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Recursive size in bytes; unreadable entries are skipped.
fn directory_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

fn round_mb(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
