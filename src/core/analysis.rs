//! Comparison outcomes: per-directory status, gaps, conflicts and tiers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Priority tier shared by improvements, gaps and tasks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Higher rank sorts first.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a conflict or an inapplicable suggestion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::High, Severity::Medium, Severity::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effort tier of a gap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effort {
    #[serde(rename = "Quick Win")]
    QuickWin,
    Medium,
    Large,
}

impl Effort {
    pub fn as_str(self) -> &'static str {
        match self {
            Effort::QuickWin => "Quick Win",
            Effort::Medium => "Medium",
            Effort::Large => "Large",
        }
    }

    /// Hours a task of this tier is planned at.
    pub fn hours(self) -> f64 {
        match self {
            Effort::QuickWin => 2.0,
            Effort::Medium => 6.0,
            Effort::Large => 16.0,
        }
    }
}

impl fmt::Display for Effort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of one proposed directory against the scanned tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DirectoryStatus {
    Implemented,
    Partial,
    Missing,
    Conflict,
}

impl DirectoryStatus {
    pub const ALL: [DirectoryStatus; 4] = [
        DirectoryStatus::Implemented,
        DirectoryStatus::Partial,
        DirectoryStatus::Missing,
        DirectoryStatus::Conflict,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DirectoryStatus::Implemented => "IMPLEMENTED",
            DirectoryStatus::Partial => "PARTIAL",
            DirectoryStatus::Missing => "MISSING",
            DirectoryStatus::Conflict => "CONFLICT",
        }
    }

    /// Title-case label for charts and tables.
    pub fn title(self) -> &'static str {
        match self {
            DirectoryStatus::Implemented => "Implemented",
            DirectoryStatus::Partial => "Partial",
            DirectoryStatus::Missing => "Missing",
            DirectoryStatus::Conflict => "Conflict",
        }
    }
}

impl fmt::Display for DirectoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of comparing every proposed directory.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub directory_statuses: BTreeMap<String, DirectoryStatus>,
    pub completion_percentage: f64,
    pub implemented_count: usize,
    pub partial_count: usize,
    pub missing_count: usize,
}

impl ComparisonResult {
    /// Build a result whose counts and percentage are derived from `statuses`.
    pub fn from_statuses(directory_statuses: BTreeMap<String, DirectoryStatus>) -> Self {
        let count = |wanted: DirectoryStatus| {
            directory_statuses
                .values()
                .filter(|status| **status == wanted)
                .count()
        };
        let implemented_count = count(DirectoryStatus::Implemented);
        let partial_count = count(DirectoryStatus::Partial);
        let missing_count = count(DirectoryStatus::Missing);
        let completion_percentage =
            completion_percentage(implemented_count, partial_count, directory_statuses.len());

        Self {
            directory_statuses,
            completion_percentage,
            implemented_count,
            partial_count,
            missing_count,
        }
    }

    pub fn conflict_count(&self) -> usize {
        self.directory_statuses
            .values()
            .filter(|status| **status == DirectoryStatus::Conflict)
            .count()
    }

    pub fn total(&self) -> usize {
        self.directory_statuses.len()
    }

    pub fn status_of(&self, path: &str) -> Option<DirectoryStatus> {
        self.directory_statuses.get(path).copied()
    }
}

/// Pure: `(implemented*100 + partial*50) / total`, or 0 for an empty set.
pub fn completion_percentage(implemented: usize, partial: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (implemented as f64 * 100.0 + partial as f64 * 50.0) / total as f64
}

/// What kind of discrepancy produced a gap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapKind {
    Missing,
    Partial,
    Conflict,
}

/// An actionable discrepancy between the scanned and proposed layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    pub category: String,
    pub description: String,
    pub priority: Priority,
    pub effort: Effort,
    pub related_requirement: String,
    pub proposed_action: String,
    pub kind: GapKind,
    /// Proposed directory the gap refers to (trailing slash as in the proposal).
    pub path: String,
    /// Expected children not found on disk.
    #[serde(default)]
    pub missing_items: Vec<String>,
}

impl Gap {
    /// Same rule the planner applies to tasks: planned hours within the
    /// threshold and High or Medium priority.
    pub fn is_quick_win(&self, threshold_hours: f64) -> bool {
        self.effort.hours() <= threshold_hours
            && matches!(self.priority, Priority::High | Priority::Medium)
    }
}

/// A structural disagreement that adding directories will not fix.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub conflict_type: String,
    pub description: String,
    pub affected_paths: Vec<String>,
    pub severity: Severity,
    #[serde(default)]
    pub mitigation: String,
}

/// An existing directory with no place in the proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryMismatch {
    pub path: String,
    pub reason: String,
    pub file_count: usize,
    pub subdirectories: Vec<String>,
}

/// Import-module rename implied by moving one file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportImpact {
    pub old_path: String,
    pub new_path: String,
    pub old_module: String,
    pub new_module: String,
    pub requires_update: bool,
}
