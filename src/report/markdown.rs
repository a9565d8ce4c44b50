//! Markdown comparison report.

use std::collections::BTreeMap;
use std::fmt::Write;

use super::progress::{create_category_chart, create_progress_bar, DEFAULT_BAR_WIDTH};
use crate::comparison::{InapplicableSuggestion, SupersededSuggestion};
use crate::config::DEFAULT_QUICK_WIN_HOURS;
use crate::core::{ComparisonResult, Conflict, DirectoryMismatch, Gap, Priority, Severity};
use crate::planning::{Task, WorkPackage};

pub const REPORT_TITLE: &str = "# Structure Comparison Report";

/// Optional findings appended after the core sections.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReportExtras<'a> {
    pub mismatches: &'a [DirectoryMismatch],
    pub superseded: &'a [SupersededSuggestion],
    pub inapplicable: &'a [InapplicableSuggestion],
    pub tasks: &'a [Task],
    /// Planner quick wins; when set they replace the gap-based section.
    pub quick_wins: Option<&'a [Task]>,
    pub work_packages: &'a [WorkPackage],
    pub config_checks: Option<&'a BTreeMap<String, BTreeMap<String, bool>>>,
}

#[derive(Debug, Clone, Copy)]
pub struct ComparisonReporter {
    quick_win_hours: f64,
}

impl Default for ComparisonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ComparisonReporter {
    pub fn new() -> Self {
        Self {
            quick_win_hours: DEFAULT_QUICK_WIN_HOURS,
        }
    }

    /// Threshold used when quick wins are derived from gaps.
    pub fn with_quick_win_hours(mut self, hours: f64) -> Self {
        self.quick_win_hours = hours;
        self
    }

    /// Title plus the five core sections, each exactly once, each present
    /// even when its input is empty.
    pub fn generate_report(
        &self,
        comparison: &ComparisonResult,
        gaps: &[Gap],
        conflicts: &[Conflict],
    ) -> String {
        let quick_wins = self.generate_quick_wins_section(gaps);
        self.core_sections(comparison, gaps, conflicts, &quick_wins)
    }

    fn core_sections(
        &self,
        comparison: &ComparisonResult,
        gaps: &[Gap],
        conflicts: &[Conflict],
        quick_wins: &str,
    ) -> String {
        let mut report = String::new();
        writeln!(report, "{}\n", REPORT_TITLE).unwrap();
        report.push_str(&self.generate_summary(comparison));
        report.push('\n');
        report.push_str(&self.generate_category_breakdown(comparison));
        report.push('\n');
        report.push_str(&self.generate_gaps_section(gaps));
        report.push('\n');
        report.push_str(&self.generate_conflicts_section(conflicts));
        report.push('\n');
        report.push_str(quick_wins);
        report
    }

    /// [`Self::generate_report`] followed by whatever extra findings are
    /// non-empty. Quick wins come from `extras.quick_wins` when given.
    pub fn generate_detailed_report(
        &self,
        comparison: &ComparisonResult,
        gaps: &[Gap],
        conflicts: &[Conflict],
        extras: ReportExtras<'_>,
    ) -> String {
        let quick_wins = match extras.quick_wins {
            Some(tasks) => self.generate_task_quick_wins_section(tasks),
            None => self.generate_quick_wins_section(gaps),
        };
        let mut report = self.core_sections(comparison, gaps, conflicts, &quick_wins);
        if !extras.mismatches.is_empty() {
            report.push('\n');
            report.push_str(&mismatch_section(extras.mismatches));
        }
        if !extras.superseded.is_empty() || !extras.inapplicable.is_empty() {
            report.push('\n');
            report.push_str(&validation_section(extras.superseded, extras.inapplicable));
        }
        if !extras.tasks.is_empty() {
            report.push('\n');
            report.push_str(&task_section(extras.tasks, extras.work_packages));
        }
        if let Some(checks) = extras.config_checks.filter(|c| !c.is_empty()) {
            report.push('\n');
            report.push_str(&config_section(checks));
        }
        report
    }

    pub fn generate_summary(&self, comparison: &ComparisonResult) -> String {
        let mut out = String::from("## Summary\n\n");
        writeln!(
            out,
            "Overall Completion: {:.1}%",
            comparison.completion_percentage
        )
        .unwrap();
        writeln!(
            out,
            "\n`{}`\n",
            create_progress_bar(comparison.completion_percentage, DEFAULT_BAR_WIDTH)
        )
        .unwrap();
        writeln!(out, "- Implemented: {}", comparison.implemented_count).unwrap();
        writeln!(out, "- Partially Implemented: {}", comparison.partial_count).unwrap();
        writeln!(out, "- Missing: {}", comparison.missing_count).unwrap();
        writeln!(out, "- Conflicts: {}", comparison.conflict_count()).unwrap();
        writeln!(out, "- Total proposed directories: {}", comparison.total()).unwrap();
        out
    }

    pub fn generate_category_breakdown(&self, comparison: &ComparisonResult) -> String {
        let mut out = String::from("## Category Breakdown\n\n");
        if comparison.directory_statuses.is_empty() {
            out.push_str("None found: no proposed directories were compared.\n");
            return out;
        }

        out.push_str("| Directory | Status |\n");
        out.push_str("|-----------|--------|\n");
        for (path, status) in &comparison.directory_statuses {
            writeln!(out, "| {} | {} |", escape_cell(path), status.label()).unwrap();
        }
        writeln!(
            out,
            "\n```text\n{}```",
            create_category_chart(&comparison.directory_statuses)
        )
        .unwrap();
        out
    }

    pub fn generate_gaps_section(&self, gaps: &[Gap]) -> String {
        let mut out = String::from("## Identified Gaps\n\n");
        if gaps.is_empty() {
            out.push_str("None found: no gaps identified.\n");
            return out;
        }

        writeln!(out, "Total gaps identified: {}", gaps.len()).unwrap();
        for tier in Priority::ALL {
            let in_tier: Vec<&Gap> = gaps.iter().filter(|g| g.priority == tier).collect();
            if in_tier.is_empty() {
                continue;
            }
            writeln!(out, "\n### {} Priority\n", tier).unwrap();
            for gap in in_tier {
                writeln!(
                    out,
                    "- **{}** [{}] ({}): {}",
                    gap.path, gap.category, gap.effort, gap.description
                )
                .unwrap();
                writeln!(out, "  - Action: {}", gap.proposed_action).unwrap();
                if !gap.missing_items.is_empty() {
                    writeln!(out, "  - Missing: {}", gap.missing_items.join(", ")).unwrap();
                }
            }
        }
        out
    }

    pub fn generate_conflicts_section(&self, conflicts: &[Conflict]) -> String {
        let mut out = String::from("## Potential Conflicts\n\n");
        if conflicts.is_empty() {
            out.push_str("None found: no conflicts detected.\n");
            return out;
        }

        writeln!(out, "Total conflicts detected: {}", conflicts.len()).unwrap();
        for tier in Severity::ALL {
            let in_tier: Vec<&Conflict> = conflicts.iter().filter(|c| c.severity == tier).collect();
            if in_tier.is_empty() {
                continue;
            }
            writeln!(out, "\n### {} Severity\n", tier).unwrap();
            for conflict in in_tier {
                writeln!(
                    out,
                    "- **{}**: {}",
                    conflict.conflict_type, conflict.description
                )
                .unwrap();
                if !conflict.affected_paths.is_empty() {
                    writeln!(out, "  - Affected: {}", conflict.affected_paths.join(", ")).unwrap();
                }
                if !conflict.mitigation.is_empty() {
                    writeln!(out, "  - Mitigation: {}", conflict.mitigation).unwrap();
                }
            }
        }
        out
    }

    /// Gaps within the quick-win threshold with High or Medium priority.
    pub fn generate_quick_wins_section(&self, gaps: &[Gap]) -> String {
        let quick_wins: Vec<&Gap> = gaps
            .iter()
            .filter(|g| g.is_quick_win(self.quick_win_hours))
            .collect();
        let mut out = quick_wins_header(quick_wins.len());
        for gap in quick_wins {
            writeln!(
                out,
                "- [ ] {} ({} priority): {}",
                gap.category, gap.priority, gap.proposed_action
            )
            .unwrap();
        }
        out
    }

    /// Quick wins as selected by the planner, in task order.
    pub fn generate_task_quick_wins_section(&self, quick_wins: &[Task]) -> String {
        let mut out = quick_wins_header(quick_wins.len());
        for task in quick_wins {
            writeln!(
                out,
                "- [ ] {} ({} priority): {} ({:.1}h)",
                task.category, task.priority, task.title, task.effort_hours
            )
            .unwrap();
        }
        out
    }
}

fn quick_wins_header(count: usize) -> String {
    let mut out = String::from("## Quick Wins\n\n");
    if count == 0 {
        out.push_str("None found: no quick wins identified.\n");
    } else {
        writeln!(
            out,
            "{} improvements can be completed with little effort:\n",
            count
        )
        .unwrap();
    }
    out
}

fn mismatch_section(mismatches: &[DirectoryMismatch]) -> String {
    let mut out = String::from("## Directory Mismatches\n\n");
    for mismatch in mismatches {
        writeln!(
            out,
            "- `{}/`: {} ({} files, {} subdirectories)",
            mismatch.path,
            mismatch.reason,
            mismatch.file_count,
            mismatch.subdirectories.len()
        )
        .unwrap();
    }
    out
}

fn validation_section(
    superseded: &[SupersededSuggestion],
    inapplicable: &[InapplicableSuggestion],
) -> String {
    let mut out = String::from("## Suggestion Validation\n");
    if !superseded.is_empty() {
        out.push_str("\n### Superseded\n\n");
        for item in superseded {
            writeln!(
                out,
                "- {} ({} confidence): {}",
                item.improvement.title, item.confidence, item.reason
            )
            .unwrap();
        }
    }
    if !inapplicable.is_empty() {
        out.push_str("\n### Possibly Not Applicable\n\n");
        for item in inapplicable {
            writeln!(
                out,
                "- {} [{}, {}]: {}",
                item.improvement.title, item.conflict_type, item.severity, item.reason
            )
            .unwrap();
            writeln!(out, "  - Evidence: {}", item.evidence).unwrap();
        }
    }
    out
}

fn task_section(tasks: &[Task], packages: &[WorkPackage]) -> String {
    let mut out = String::from("## Task Plan\n\n");
    out.push_str("| ID | Task | Priority | Hours | Depends On |\n");
    out.push_str("|----|------|----------|-------|------------|\n");
    for task in tasks {
        let deps = if task.dependencies.is_empty() {
            "-".to_string()
        } else {
            task.dependencies.join(", ")
        };
        writeln!(
            out,
            "| {} | {} | {} | {:.1} | {} |",
            task.id,
            escape_cell(&task.title),
            task.priority,
            task.effort_hours,
            deps
        )
        .unwrap();
    }
    if !packages.is_empty() {
        out.push_str("\n### Work Packages\n\n");
        for package in packages {
            writeln!(
                out,
                "- {}: {} tasks, {:.1} hours",
                package.category,
                package.tasks.len(),
                package.total_hours
            )
            .unwrap();
        }
    }
    out
}

fn config_section(checks: &BTreeMap<String, BTreeMap<String, bool>>) -> String {
    let mut out = String::from("## Configuration Checks\n");
    for (file, items) in checks {
        writeln!(out, "\n### {}\n", file).unwrap();
        if items.is_empty() {
            out.push_str("Nothing to check.\n");
        }
        for (item, present) in items {
            let mark = if *present { "x" } else { " " };
            writeln!(out, "- [{}] `{}`", mark, item).unwrap();
        }
    }
    out
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
