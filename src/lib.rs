// Export modules for library usage
pub mod cli;
pub mod commands;
pub mod comparison;
pub mod config;
pub mod core;
pub mod engine;
pub mod errors;
pub mod io;
pub mod migration;
pub mod parser;
pub mod planning;
pub mod report;
pub mod scanner;
pub mod status;

// Re-export commonly used types
pub use crate::core::{
    ChecklistEntry, ComparisonResult, Conflict, DirectoryInfo, DirectoryMismatch, DirectoryStatus,
    Effort, Gap, GapKind, ImportImpact, Improvement, LibraryInfo, Priority, ProjectStructure,
    ProposedDirectory, ProposedStructure, Severity,
};

pub use crate::engine::{ComparisonEngine, ComparisonOutput, Degradation, RunOptions};
pub use crate::errors::{Error, Result};

pub use crate::comparison::{
    ConfigurationVerifier, ConflictDetector, GapAnalyzer, StructureComparator, ValidationChecker,
};
pub use crate::migration::{MigrationScript, MigrationScriptGenerator};
pub use crate::parser::{MarkdownParser, SuggestionParser};
pub use crate::planning::{PriorityMatrix, Task, TaskGenerator, WorkPackage};
pub use crate::report::{ComparisonReporter, ProgressVisualizer};
pub use crate::scanner::{DirectoryScanner, LibraryAnalyzer};
pub use crate::status::{ImplementationStatus, StatusEntry, StatusFile, StatusTracker};
