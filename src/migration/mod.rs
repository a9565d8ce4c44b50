//! Shell scripts that move a project toward the proposed layout, and back.

pub mod generator;
pub mod steps;

pub use generator::MigrationScriptGenerator;
pub use steps::{
    shell_quote, DirectoryMove, FileMove, MigrationScript, ScriptOperation, ScriptStep, StepKind,
};
