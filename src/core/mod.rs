pub mod analysis;
pub mod proposal;
pub mod structure;

pub use analysis::{
    completion_percentage, ComparisonResult, Conflict, DirectoryMismatch, DirectoryStatus, Effort,
    Gap, GapKind, ImportImpact, Priority, Severity,
};
pub use proposal::{slugify, ChecklistEntry, Improvement, ProposedDirectory, ProposedStructure};
pub use structure::{
    leaf_name, normalize_dir_path, parent_dir, DirectoryInfo, LibraryInfo, ProjectStructure,
    ROOT_KEY,
};
