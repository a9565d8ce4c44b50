//! Comparison of the scanned project against the proposed layout.

pub mod comparator;
pub mod config_check;
pub mod conflicts;
pub mod gaps;
pub mod validation;

pub use comparator::{locate, StructureComparator};
pub use config_check::ConfigurationVerifier;
pub use conflicts::{module_name, ConflictDetector, CASE_MISMATCH, VENDORED_DEPENDENCIES};
pub use gaps::{gap_category, GapAnalyzer};
pub use validation::{
    are_aliases, Confidence, InapplicableKind, InapplicableSuggestion, SupersededSuggestion,
    ValidationChecker,
};
