use std::collections::BTreeMap;

use super::comparator::StructureComparator;
use crate::core::{
    completion_percentage, normalize_dir_path, ComparisonResult, DirectoryStatus, Effort, Gap,
    GapKind, Priority, ProjectStructure, ProposedStructure,
};

/// Turns non-implemented directories into [`Gap`] records.
#[derive(Debug, Default, Clone, Copy)]
pub struct GapAnalyzer;

impl GapAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// One gap per non-IMPLEMENTED directory, from the comparison alone.
    pub fn identify_gaps(&self, comparison: &ComparisonResult) -> Vec<Gap> {
        comparison
            .directory_statuses
            .iter()
            .filter_map(|(path, status)| base_gap(path, *status))
            .collect()
    }

    /// Like [`Self::identify_gaps`], with missing children, purposes and the
    /// improvement each gap belongs to filled in.
    pub fn identify_gaps_with_context(
        &self,
        comparison: &ComparisonResult,
        current: &ProjectStructure,
        proposed: &ProposedStructure,
    ) -> Vec<Gap> {
        let comparator = StructureComparator::new();

        let gaps: Vec<Gap> = comparison
            .directory_statuses
            .iter()
            .filter_map(|(path, status)| {
                let mut gap = base_gap(path, *status)?;
                if let Some(dir) = proposed.directories.get(path) {
                    gap.missing_items = match gap.kind {
                        GapKind::Partial => comparator.missing_items(path, current, dir),
                        GapKind::Missing => dir
                            .subdirectories
                            .iter()
                            .map(|s| format!("{}/", s.trim_end_matches('/')))
                            .chain(dir.required_files.iter().cloned())
                            .collect(),
                        GapKind::Conflict => Vec::new(),
                    };
                    describe(&mut gap, &dir.purpose);
                }
                if let Some(id) = owning_improvement(path, proposed) {
                    gap.related_requirement = id;
                }
                Some(gap)
            })
            .collect();

        log::debug!("Identified {} gaps", gaps.len());
        gaps
    }

    /// Group gaps by category; every gap lands in exactly one group.
    pub fn categorize_gaps(&self, gaps: &[Gap]) -> BTreeMap<String, Vec<Gap>> {
        let mut groups: BTreeMap<String, Vec<Gap>> = BTreeMap::new();
        for gap in gaps {
            groups
                .entry(gap.category.clone())
                .or_default()
                .push(gap.clone());
        }
        groups
    }

    /// Pure: re-derive the completion percentage from the statuses alone.
    pub fn calculate_completion_percentage(&self, comparison: &ComparisonResult) -> f64 {
        let statuses = &comparison.directory_statuses;
        let implemented = statuses
            .values()
            .filter(|s| **s == DirectoryStatus::Implemented)
            .count();
        let partial = statuses
            .values()
            .filter(|s| **s == DirectoryStatus::Partial)
            .count();
        completion_percentage(implemented, partial, statuses.len())
    }
}

fn base_gap(path: &str, status: DirectoryStatus) -> Option<Gap> {
    let (kind, priority, effort, description, action) = match status {
        DirectoryStatus::Implemented => return None,
        DirectoryStatus::Partial => (
            GapKind::Partial,
            Priority::Medium,
            Effort::QuickWin,
            format!("Directory {} exists but is missing expected contents", path),
            format!("Add the missing subdirectories and files to {}", path),
        ),
        DirectoryStatus::Missing => (
            GapKind::Missing,
            Priority::High,
            Effort::QuickWin,
            format!("Directory {} does not exist", path),
            format!("Create {}", path),
        ),
        DirectoryStatus::Conflict => (
            GapKind::Conflict,
            Priority::High,
            Effort::Medium,
            format!(
                "Directory {} already exists with contents that do not match the proposal",
                path
            ),
            format!(
                "Review the existing contents of {} and move them aside before adopting the proposed layout",
                path
            ),
        ),
    };

    Some(Gap {
        category: gap_category(path),
        description,
        priority,
        effort,
        related_requirement: format!("structure:{}", path),
        proposed_action: action,
        kind,
        path: path.to_string(),
        missing_items: Vec::new(),
    })
}

fn describe(gap: &mut Gap, purpose: &str) {
    let purpose = purpose.trim();
    let items = gap.missing_items.join(", ");
    match gap.kind {
        GapKind::Partial if !items.is_empty() => {
            gap.description = format!("Directory {} exists but is missing {}", gap.path, items);
            gap.proposed_action = format!("Add {} to {}", items, gap.path);
        }
        GapKind::Missing => {
            if !purpose.is_empty() {
                gap.description = format!("Directory {} ({}) does not exist", gap.path, purpose);
            }
            if !items.is_empty() {
                gap.proposed_action = format!("Create {} with {}", gap.path, items);
            }
        }
        _ => {}
    }
}

/// Improvement whose related directories cover `path`.
fn owning_improvement(path: &str, proposed: &ProposedStructure) -> Option<String> {
    let target = normalize_dir_path(path);
    proposed
        .improvements
        .iter()
        .find(|imp| {
            imp.related_directories.iter().any(|dir| {
                let dir = normalize_dir_path(dir);
                target == dir || target.starts_with(&format!("{}/", dir))
            })
        })
        .map(|imp| imp.id())
}

/// Pure: category name for a proposed path, from its top-level segment.
pub fn gap_category(path: &str) -> String {
    let normalized = normalize_dir_path(path).to_lowercase();
    let top = normalized.split('/').next().unwrap_or("");
    let category = match top {
        "docs" | "doc" | "documentation" => "Documentation",
        "tests" | "test" | "spec" | "testing" => "Testing",
        "config" | "configs" | "conf" | "settings" => "Configuration",
        "src" | "lib" | "app" | "core" | "models" | "cli" | "utils" => "Source Code",
        "scripts" | "bin" | "tools" => "Tooling",
        ".github" | "ci" | ".gitlab" | ".circleci" => "CI/CD",
        _ => "Directory Structure",
    };
    category.to_string()
}
