//! Shared error types for layoutmap.
//!
//! Fatal conditions (no project, no documents) carry a recovery hint that the
//! CLI prints next to the message. Conditions the pipeline can degrade around
//! are not errors; see [`crate::engine::Degradation`].

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for layoutmap operations
#[derive(Debug, Error)]
pub enum Error {
    /// Project root is missing or is not a directory
    #[error("Invalid project directory {}: {reason}", path.display())]
    InvalidRoot { path: PathBuf, reason: String },

    /// None of the suggestion documents could be read or parsed
    #[error("No suggestion documents could be parsed in {}", docs_path.display())]
    NoParsableDocuments {
        docs_path: PathBuf,
        failures: Vec<String>,
    },

    /// A single suggestion document is malformed
    #[error("Failed to parse {}: {message}", path.display())]
    DocumentParse { path: PathBuf, message: String },

    /// Invalid input to a status or planning operation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Task dependencies form a cycle
    #[error("Dependency cycle detected among tasks: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    /// File system related errors
    #[error("File system error: {message}")]
    FileSystem {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a file system error with path context
    pub fn file_system(
        message: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            message: message.into(),
            path: Some(path.into()),
            source: Some(source),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Actionable suggestion for errors that abort a run
    pub fn recovery(&self) -> Option<String> {
        match self {
            Self::InvalidRoot { path, .. } => Some(format!(
                "Check that {} exists and is a directory, or pass --project-root",
                path.display()
            )),
            Self::NoParsableDocuments { docs_path, .. } => Some(format!(
                "Place at least one of the suggestion documents in {} or pass --docs",
                docs_path.display()
            )),
            Self::FileSystem { path: Some(path), .. } => Some(format!(
                "Check permissions and free space for {}",
                path.display()
            )),
            Self::DependencyCycle(_) => {
                Some("Remove one of the listed task dependencies to break the cycle".into())
            }
            _ => None,
        }
    }

    /// Whether the error aborts a comparison run
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Validation(_) | Self::DocumentParse { .. })
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors_carry_recovery_hint() {
        let err = Error::InvalidRoot {
            path: PathBuf::from("/nowhere"),
            reason: "does not exist".into(),
        };
        assert!(err.to_string().contains("Invalid project directory"));
        assert!(err.recovery().unwrap().contains("/nowhere"));

        let err = Error::NoParsableDocuments {
            docs_path: PathBuf::from("docs/v2"),
            failures: vec![],
        };
        assert!(err.to_string().contains("No suggestion documents could be parsed"));
        assert!(err.recovery().is_some());
        assert!(err.is_fatal());
    }

    #[test]
    fn test_validation_error_is_local() {
        let err = Error::validation("reason must be provided");
        assert!(err.recovery().is_none());
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "Validation error: reason must be provided");
    }

    #[test]
    fn test_cycle_message_lists_ids() {
        let err = Error::DependencyCycle(vec!["A".into(), "C".into(), "B".into()]);
        assert_eq!(
            err.to_string(),
            "Dependency cycle detected among tasks: A -> C -> B"
        );
    }
}
