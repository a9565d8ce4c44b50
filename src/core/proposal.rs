//! Target layout and improvement records parsed from the suggestion documents.

use super::analysis::Priority;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One directory of the target layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedDirectory {
    /// Relative path with a trailing slash, e.g. `docs/api/`.
    pub path: String,
    pub purpose: String,
    #[serde(default)]
    pub subdirectories: Vec<String>,
    #[serde(default)]
    pub required_files: Vec<String>,
    #[serde(default)]
    pub is_new: bool,
}

impl ProposedDirectory {
    pub fn new(path: impl Into<String>, purpose: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            purpose: purpose.into(),
            subdirectories: Vec::new(),
            required_files: Vec::new(),
            is_new: false,
        }
    }

    pub fn with_subdirectories<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subdirectories = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_required_files<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_files = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn marked_new(mut self) -> Self {
        self.is_new = true;
        self
    }

    /// Number of children the proposal expects inside this directory.
    pub fn expected_children(&self) -> usize {
        self.subdirectories.len() + self.required_files.len()
    }
}

/// A proposed improvement category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Improvement {
    pub category: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub estimated_hours: f64,
    #[serde(default)]
    pub related_directories: Vec<String>,
}

impl Improvement {
    /// Stable identifier used by the status ledger.
    pub fn id(&self) -> String {
        slugify(&self.category)
    }
}

/// Target layout plus the ordered improvement list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProposedStructure {
    #[serde(default)]
    pub directories: BTreeMap<String, ProposedDirectory>,
    #[serde(default)]
    pub improvements: Vec<Improvement>,
}

impl ProposedStructure {
    pub fn add_directory(&mut self, directory: ProposedDirectory) {
        self.directories.insert(directory.path.clone(), directory);
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.improvements.is_empty()
    }
}

/// A checkbox item from the quick-action checklist with its context headings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChecklistEntry {
    pub text: String,
    pub checked: bool,
    pub priority: String,
    pub category: String,
    pub estimated_hours: f64,
    pub line_number: usize,
}

/// Lowercase, hyphen-separated identifier made of ASCII alphanumerics.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "improvement".to_string()
    } else {
        slug
    }
}
