//! Checks whether suggested improvements still apply to the project as it is.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::comparator::StructureComparator;
use crate::core::{
    leaf_name, normalize_dir_path, parent_dir, DirectoryStatus, Improvement, ProjectStructure,
    ProposedStructure, Severity, ROOT_KEY,
};

/// Directory names treated as interchangeable.
const ALIAS_GROUPS: &[&[&str]] = &[
    &["docs", "documentation", "doc"],
    &["tests", "test", "spec"],
    &["config", "configs", "conf", "settings"],
    &["scripts", "bin", "tools"],
    &["utils", "helpers", "common"],
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InapplicableKind {
    DecisionConflict,
    StructureDivergence,
    Outdated,
    PrerequisiteMissing,
}

impl InapplicableKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InapplicableKind::DecisionConflict => "decision_conflict",
            InapplicableKind::StructureDivergence => "structure_divergence",
            InapplicableKind::Outdated => "outdated",
            InapplicableKind::PrerequisiteMissing => "prerequisite_missing",
        }
    }
}

impl fmt::Display for InapplicableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An improvement already achieved under a different existing path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SupersededSuggestion {
    pub improvement: Improvement,
    /// Related directory as written in the improvement.
    pub proposed_directory: String,
    /// Existing directory key that fulfils it.
    pub superseded_by: String,
    pub reason: String,
    pub confidence: Confidence,
}

/// An improvement that conflicts with how the project is organized today.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InapplicableSuggestion {
    pub improvement: Improvement,
    pub reason: String,
    pub conflict_type: InapplicableKind,
    pub evidence: String,
    pub severity: Severity,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ValidationChecker;

impl ValidationChecker {
    pub fn new() -> Self {
        Self
    }

    /// One record per related directory of an improvement whose missing
    /// directories all have an equivalent existing counterpart.
    pub fn identify_superseded_suggestions(
        &self,
        current: &ProjectStructure,
        proposed: &ProposedStructure,
    ) -> Vec<SupersededSuggestion> {
        let mut superseded = Vec::new();

        for improvement in &proposed.improvements {
            let missing: Vec<&String> = improvement
                .related_directories
                .iter()
                .filter(|dir| !current.contains(dir))
                .collect();
            if missing.is_empty() {
                continue;
            }

            let matches: Vec<(&String, String, Confidence)> = missing
                .iter()
                .filter_map(|dir| {
                    find_equivalent(current, dir).map(|(found, confidence)| (*dir, found, confidence))
                })
                .collect();
            if matches.len() != missing.len() {
                continue;
            }

            for (dir, found, confidence) in matches {
                superseded.push(SupersededSuggestion {
                    improvement: improvement.clone(),
                    proposed_directory: dir.clone(),
                    reason: format!(
                        "{} is not present but {}/ already serves the same purpose",
                        dir, found
                    ),
                    superseded_by: found,
                    confidence,
                });
            }
        }

        log::debug!("Identified {} superseded suggestions", superseded.len());
        superseded
    }

    /// At most one record per improvement, first matching rule wins:
    /// decision conflict, structure divergence, missing prerequisite, outdated.
    pub fn flag_inapplicable_suggestions(
        &self,
        current: &ProjectStructure,
        proposed: &ProposedStructure,
    ) -> Vec<InapplicableSuggestion> {
        let flagged: Vec<InapplicableSuggestion> = proposed
            .improvements
            .iter()
            .filter_map(|improvement| check_applicability(improvement, current, proposed))
            .collect();

        log::debug!("Flagged {} inapplicable suggestions", flagged.len());
        flagged
    }
}

fn check_applicability(
    improvement: &Improvement,
    current: &ProjectStructure,
    proposed: &ProposedStructure,
) -> Option<InapplicableSuggestion> {
    let comparator = StructureComparator::new();
    let flag = |conflict_type, reason: String, evidence: String, severity| InapplicableSuggestion {
        improvement: improvement.clone(),
        reason,
        conflict_type,
        evidence,
        severity,
    };

    for dir in &improvement.related_directories {
        let Some(info) = current.get(dir) else {
            continue;
        };
        let Some(proposed_dir) = find_proposed(proposed, dir) else {
            continue;
        };

        if comparator.check_directory_status(dir, current, proposed_dir) == DirectoryStatus::Conflict {
            return Some(flag(
                InapplicableKind::DecisionConflict,
                format!(
                    "{} proposes creating {} but the project already uses it for other content",
                    improvement.title, dir
                ),
                format!("existing subdirectories: {}", info.subdirectories.join(", ")),
                Severity::High,
            ));
        }

        let diverges = !proposed_dir.subdirectories.is_empty()
            && !info.subdirectories.is_empty()
            && !proposed_dir
                .subdirectories
                .iter()
                .any(|sub| info.has_subdirectory(sub.trim_end_matches('/')));
        if diverges {
            return Some(flag(
                InapplicableKind::StructureDivergence,
                format!(
                    "{} is organized differently than {} proposes",
                    dir, improvement.title
                ),
                format!(
                    "expected {}; found {}",
                    proposed_dir.subdirectories.join(", "),
                    info.subdirectories.join(", ")
                ),
                Severity::Medium,
            ));
        }
    }

    for dir in &improvement.related_directories {
        if current.contains(dir) {
            continue;
        }
        let parent = parent_dir(dir);
        if parent != ROOT_KEY && !current.contains(&parent) {
            return Some(flag(
                InapplicableKind::PrerequisiteMissing,
                format!("{} depends on {}/ which does not exist yet", dir, parent),
                format!("{}/ not found under the project root", parent),
                Severity::Low,
            ));
        }
    }

    for dir in &improvement.related_directories {
        if !current.contains(dir) && find_proposed(proposed, dir).is_none() {
            return Some(flag(
                InapplicableKind::Outdated,
                format!(
                    "{} refers to {} which is neither in the project nor in the proposed structure",
                    improvement.title, dir
                ),
                format!("{} absent from both layouts", dir),
                Severity::Low,
            ));
        }
    }

    None
}

fn find_proposed<'a>(
    proposed: &'a ProposedStructure,
    dir: &str,
) -> Option<&'a crate::core::ProposedDirectory> {
    let wanted = normalize_dir_path(dir);
    proposed
        .directories
        .iter()
        .find(|(path, _)| normalize_dir_path(path) == wanted)
        .map(|(_, dir)| dir)
}

/// Best existing counterpart for a missing directory, scanning keys in order.
fn find_equivalent(current: &ProjectStructure, dir: &str) -> Option<(String, Confidence)> {
    let wanted = normalize_dir_path(dir);
    let leaf = leaf_name(&wanted).to_lowercase();
    let parent = parent_dir(&wanted);

    let mut best: Option<(String, Confidence)> = None;
    for (key, _) in current.non_root_directories() {
        let key_leaf = leaf_name(key).to_lowercase();
        let key_parent = parent_dir(key);
        let confidence = if key_leaf == leaf && key_parent != parent {
            Confidence::High
        } else if key_leaf != leaf && are_aliases(&key_leaf, &leaf) {
            if key_parent == parent {
                Confidence::Medium
            } else {
                Confidence::Low
            }
        } else {
            continue;
        };
        if best.as_ref().is_none_or(|(_, current_best)| confidence < *current_best) {
            best = Some((key.clone(), confidence));
        }
    }
    best
}

/// Pure: whether two lowercase directory names are interchangeable.
pub fn are_aliases(a: &str, b: &str) -> bool {
    ALIAS_GROUPS
        .iter()
        .any(|group| group.contains(&a) && group.contains(&b))
}
