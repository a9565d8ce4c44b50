use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::scanner::{DEFAULT_CONFIG_FILES, DEFAULT_IGNORED_DIRS};

/// Upper bound accepted for `[scan] max_depth`.
pub const MAX_SCAN_DEPTH: usize = 32;

/// Default `[planning] quick_win_hours`.
pub const DEFAULT_QUICK_WIN_HOURS: f64 = 4.0;

/// Root configuration structure for layoutmap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LayoutmapConfig {
    /// Directory walk settings
    #[serde(default)]
    pub scan: ScanConfig,

    /// File names of the three suggestion documents
    #[serde(default)]
    pub documents: DocumentsConfig,

    /// Expectations for pyproject.toml and .gitignore
    #[serde(default)]
    pub verify: VerifyConfig,

    /// Task planning thresholds and weights
    #[serde(default)]
    pub planning: PlanningConfig,

    /// Script generation settings
    #[serde(default)]
    pub migration: MigrationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default = "default_lib_dir")]
    pub lib_dir: String,

    #[serde(default = "default_ignore_dirs")]
    pub ignore_dirs: Vec<String>,

    #[serde(default = "default_config_files")]
    pub config_files: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            lib_dir: default_lib_dir(),
            ignore_dirs: default_ignore_dirs(),
            config_files: default_config_files(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentsConfig {
    #[serde(default = "default_improvements_doc")]
    pub improvements: String,

    #[serde(default = "default_structure_doc")]
    pub structure: String,

    #[serde(default = "default_checklist_doc")]
    pub checklist: String,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            improvements: default_improvements_doc(),
            structure: default_structure_doc(),
            checklist: default_checklist_doc(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyConfig {
    #[serde(default = "default_pyproject_sections")]
    pub pyproject_sections: Vec<String>,

    #[serde(default = "default_gitignore_patterns")]
    pub gitignore_patterns: Vec<String>,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            pyproject_sections: default_pyproject_sections(),
            gitignore_patterns: default_gitignore_patterns(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningConfig {
    /// Tasks at or under this many hours count as quick wins
    #[serde(default = "default_quick_win_hours")]
    pub quick_win_hours: f64,

    /// Category name to priority weight; unknown categories weigh 1
    #[serde(default = "default_category_weights")]
    pub category_weights: BTreeMap<String, u32>,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            quick_win_hours: default_quick_win_hours(),
            category_weights: default_category_weights(),
        }
    }
}

impl PlanningConfig {
    pub fn category_weight(&self, category: &str) -> u32 {
        self.category_weights.get(category).copied().unwrap_or(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Manifest written by the lib cleanup script
    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,

    /// Root for timestamped backups, relative to the project
    #[serde(default = "default_backup_dir")]
    pub backup_dir: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            manifest_file: default_manifest_file(),
            backup_dir: default_backup_dir(),
        }
    }
}

impl LayoutmapConfig {
    /// Pure function: collect every invalid setting as a message
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.scan.max_depth > MAX_SCAN_DEPTH {
            errors.push(format!(
                "scan.max_depth must be at most {}, got {}",
                MAX_SCAN_DEPTH, self.scan.max_depth
            ));
        }
        if !(self.planning.quick_win_hours > 0.0) || !self.planning.quick_win_hours.is_finite() {
            errors.push(format!(
                "planning.quick_win_hours must be positive, got {}",
                self.planning.quick_win_hours
            ));
        }
        if self.scan.lib_dir.trim().is_empty() {
            errors.push("scan.lib_dir must not be empty".to_string());
        }
        if self.migration.backup_dir.trim().is_empty() {
            errors.push("migration.backup_dir must not be empty".to_string());
        }
        errors
    }

    /// Replace invalid settings with their defaults, returning what was reset
    pub fn sanitize(&mut self) -> Vec<String> {
        let errors = self.validation_errors();
        if self.scan.max_depth > MAX_SCAN_DEPTH {
            self.scan.max_depth = default_max_depth();
        }
        if !(self.planning.quick_win_hours > 0.0) || !self.planning.quick_win_hours.is_finite() {
            self.planning.quick_win_hours = default_quick_win_hours();
        }
        if self.scan.lib_dir.trim().is_empty() {
            self.scan.lib_dir = default_lib_dir();
        }
        if self.migration.backup_dir.trim().is_empty() {
            self.migration.backup_dir = default_backup_dir();
        }
        errors
    }
}

fn default_max_depth() -> usize {
    3
}
fn default_lib_dir() -> String {
    "lib".to_string()
}
fn default_ignore_dirs() -> Vec<String> {
    DEFAULT_IGNORED_DIRS.iter().map(|s| s.to_string()).collect()
}
fn default_config_files() -> Vec<String> {
    DEFAULT_CONFIG_FILES.iter().map(|s| s.to_string()).collect()
}
fn default_improvements_doc() -> String {
    "SDLC_Improvement_Suggestions.md".to_string()
}
fn default_structure_doc() -> String {
    "Proposed_Structure.md".to_string()
}
fn default_checklist_doc() -> String {
    "Quick_Action_Checklist.md".to_string()
}
fn default_pyproject_sections() -> Vec<String> {
    ["project", "build-system", "tool.pytest.ini_options"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_gitignore_patterns() -> Vec<String> {
    ["__pycache__/", "*.pyc", ".venv/", ".env"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_quick_win_hours() -> f64 {
    DEFAULT_QUICK_WIN_HOURS
}
fn default_category_weights() -> BTreeMap<String, u32> {
    [
        ("Testing", 3),
        ("Configuration", 3),
        ("CI/CD", 2),
        ("Documentation", 2),
        ("Source Code", 2),
        ("Tooling", 1),
        ("Directory Structure", 1),
    ]
    .into_iter()
    .map(|(name, weight)| (name.to_string(), weight))
    .collect()
}
fn default_manifest_file() -> String {
    "requirements.txt".to_string()
}
fn default_backup_dir() -> String {
    ".migration_backup".to_string()
}
