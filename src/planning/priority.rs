use std::collections::BTreeMap;

use crate::config::PlanningConfig;
use crate::core::{Effort, Gap, GapKind, Priority};

/// Score at or above which a gap is High priority.
pub const HIGH_PRIORITY_SCORE: u32 = 5;
/// Score at or above which a gap is Medium priority.
pub const MEDIUM_PRIORITY_SCORE: u32 = 3;

/// Missing children a Quick Win may still cover.
pub const QUICK_WIN_SCOPE: usize = 2;
/// Missing children a Medium effort may still cover.
pub const MEDIUM_SCOPE: usize = 5;

/// Assigns priority and effort tiers to gaps from their own fields.
#[derive(Debug, Clone)]
pub struct PriorityMatrix {
    category_weights: BTreeMap<String, u32>,
}

impl Default for PriorityMatrix {
    fn default() -> Self {
        Self::from_config(&PlanningConfig::default())
    }
}

impl PriorityMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &PlanningConfig) -> Self {
        Self {
            category_weights: config.category_weights.clone(),
        }
    }

    pub fn with_category_weights(mut self, weights: BTreeMap<String, u32>) -> Self {
        self.category_weights = weights;
        self
    }

    /// Pure: weight of a gap category, 1 when unknown.
    pub fn category_weight(&self, category: &str) -> u32 {
        self.category_weights.get(category).copied().unwrap_or(1)
    }

    /// Pure: severity of the gap kind plus its category weight.
    pub fn score(&self, gap: &Gap) -> u32 {
        kind_weight(gap.kind) + self.category_weight(&gap.category)
    }

    /// Pure: exactly one priority tier per gap.
    pub fn categorize_priority(&self, gap: &Gap) -> Priority {
        match self.score(gap) {
            s if s >= HIGH_PRIORITY_SCORE => Priority::High,
            s if s >= MEDIUM_PRIORITY_SCORE => Priority::Medium,
            _ => Priority::Low,
        }
    }

    /// Pure: effort tier from the number of missing children. Conflicts need
    /// at least a Medium effort since existing content has to move.
    pub fn estimate_effort(&self, gap: &Gap) -> Effort {
        let by_scope = match scope_size(gap) {
            n if n <= QUICK_WIN_SCOPE => Effort::QuickWin,
            n if n <= MEDIUM_SCOPE => Effort::Medium,
            _ => Effort::Large,
        };
        match (gap.kind, by_scope) {
            (GapKind::Conflict, Effort::QuickWin) => Effort::Medium,
            (_, effort) => effort,
        }
    }

    /// Rewrite each gap's tiers in place with the matrix's verdict.
    pub fn apply(&self, gaps: &mut [Gap]) {
        for gap in gaps.iter_mut() {
            gap.priority = self.categorize_priority(gap);
            gap.effort = self.estimate_effort(gap);
        }
    }
}

fn kind_weight(kind: GapKind) -> u32 {
    match kind {
        GapKind::Missing => 3,
        GapKind::Partial => 1,
        GapKind::Conflict => 3,
    }
}

/// A directory with nothing listed still needs creating: scope of one.
fn scope_size(gap: &Gap) -> usize {
    gap.missing_items.len().max(1)
}
