use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::status::ImplementationStatus;

pub const DEFAULT_STATUS_FILE: &str = ".layoutmap_status.json";

#[derive(Parser, Debug)]
#[command(name = "layoutmap")]
#[command(
    about = "Compare a project's directory layout against a proposed structure",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Increase verbosity level (can be repeated: -v, -vv)
    /// -v: Show per-stage progress
    /// -vv: Show debug output
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare the project against the suggestion documents and write a report
    Compare {
        /// Project root to scan
        #[arg(long = "project-root", default_value = ".")]
        project_root: PathBuf,

        /// Directory holding the suggestion documents
        #[arg(long = "docs", default_value = "suggestions")]
        docs: PathBuf,

        /// Report output file
        #[arg(short, long, default_value = "comparison_report.md")]
        output: PathBuf,

        /// Status ledger to synchronise with the comparison
        #[arg(long = "status-file")]
        status_file: Option<PathBuf>,

        /// Generate migration scripts
        #[arg(long = "generate-scripts")]
        generate_scripts: bool,

        /// Directory the migration scripts are written to
        #[arg(long = "scripts-output", default_value = "migration_scripts")]
        scripts_output: PathBuf,

        /// Skip superseded and inapplicable suggestion checks
        #[arg(long = "no-validation")]
        no_validation: bool,
    },

    /// Inspect or edit the implementation status ledger
    Status {
        /// Status ledger file
        #[arg(long = "file", default_value = DEFAULT_STATUS_FILE)]
        file: PathBuf,

        #[command(subcommand)]
        action: StatusAction,
    },

    /// Initialize a layoutmap configuration file
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum StatusAction {
    /// List ledger entries
    List {
        /// Only show intentionally skipped improvements
        #[arg(long)]
        skipped: bool,
    },

    /// Set the status of an improvement
    Set {
        /// Improvement id
        id: String,

        /// New status
        #[arg(value_enum)]
        status: StatusArg,

        /// Category recorded for a new entry (defaults to the id)
        #[arg(long)]
        category: Option<String>,

        /// Reason, required when the status is skipped
        #[arg(long)]
        reason: Option<String>,
    },

    /// Mark an improvement as intentionally skipped
    Skip {
        /// Improvement id
        id: String,

        /// Why the improvement is skipped
        reason: String,

        /// Category recorded for a new entry (defaults to the id)
        #[arg(long)]
        category: Option<String>,
    },

    /// Replace the reason of a skipped improvement
    Reason {
        /// Improvement id
        id: String,

        /// New reason
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Implemented,
    Partial,
    #[value(alias = "pending")]
    NotYetImplemented,
    #[value(alias = "skipped")]
    IntentionallySkipped,
}

impl From<StatusArg> for ImplementationStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Implemented => ImplementationStatus::Implemented,
            StatusArg::Partial => ImplementationStatus::Partial,
            StatusArg::NotYetImplemented => ImplementationStatus::NotYetImplemented,
            StatusArg::IntentionallySkipped => ImplementationStatus::IntentionallySkipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_defaults() {
        let cli = Cli::parse_from(["layoutmap", "compare"]);
        match cli.command {
            Commands::Compare {
                project_root,
                docs,
                output,
                status_file,
                generate_scripts,
                no_validation,
                ..
            } => {
                assert_eq!(project_root, PathBuf::from("."));
                assert_eq!(docs, PathBuf::from("suggestions"));
                assert_eq!(output, PathBuf::from("comparison_report.md"));
                assert!(status_file.is_none());
                assert!(!generate_scripts);
                assert!(!no_validation);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_verbosity_is_global() {
        let cli = Cli::parse_from(["layoutmap", "compare", "-vv"]);
        assert_eq!(cli.verbosity, 2);
    }

    #[test]
    fn test_status_set_aliases() {
        let cli = Cli::parse_from(["layoutmap", "status", "set", "testing", "skipped", "--reason", "later"]);
        match cli.command {
            Commands::Status {
                action: StatusAction::Set { status, reason, .. },
                ..
            } => {
                assert_eq!(
                    ImplementationStatus::from(status),
                    ImplementationStatus::IntentionallySkipped
                );
                assert_eq!(reason.as_deref(), Some("later"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
