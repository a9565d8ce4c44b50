use std::collections::BTreeMap;
use std::path::Path;

use crate::io;

/// Literal presence checks against project configuration files.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigurationVerifier;

impl ConfigurationVerifier {
    pub fn new() -> Self {
        Self
    }

    /// I/O: section headers present in a `pyproject.toml`.
    pub fn check_pyproject_sections(
        &self,
        path: &Path,
        expected_sections: &[String],
    ) -> BTreeMap<String, bool> {
        let content = read_optional(path);
        expected_sections
            .iter()
            .map(|section| {
                let present = content
                    .as_deref()
                    .is_some_and(|text| has_section(text, section));
                (section.clone(), present)
            })
            .collect()
    }

    /// I/O: patterns listed in a `.gitignore`.
    pub fn check_gitignore_excludes(
        &self,
        path: &Path,
        expected_patterns: &[String],
    ) -> BTreeMap<String, bool> {
        let content = read_optional(path);
        expected_patterns
            .iter()
            .map(|pattern| {
                let present = content
                    .as_deref()
                    .is_some_and(|text| has_pattern(text, pattern));
                (pattern.clone(), present)
            })
            .collect()
    }
}

/// I/O: file contents, or `None` when the file is absent or unreadable.
fn read_optional(path: &Path) -> Option<String> {
    if !io::file_exists(path) {
        log::debug!("{} not found", path.display());
        return None;
    }
    match io::read_file(path) {
        Ok(content) => Some(content),
        Err(err) => {
            log::debug!("Cannot read {}: {}", path.display(), err);
            None
        }
    }
}

/// Pure: `[section]` or `[[section]]` appears in the text.
pub fn has_section(content: &str, section: &str) -> bool {
    let section = section.trim().trim_start_matches('[').trim_end_matches(']');
    content.contains(&format!("[{}]", section)) || content.contains(&format!("[[{}]]", section))
}

/// Pure: the pattern appears literally, or as a line that differs only by a
/// trailing slash.
pub fn has_pattern(content: &str, pattern: &str) -> bool {
    let pattern = pattern.trim();
    if content.contains(pattern) {
        return true;
    }
    let bare = pattern.trim_end_matches('/');
    content
        .lines()
        .map(|line| line.trim().trim_end_matches('/'))
        .any(|line| !line.is_empty() && line == bare)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use std::fs;
    use tempfile::TempDir;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pyproject_sections() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pyproject.toml");
        fs::write(
            &path,
            indoc! {r#"
                [project]
                name = "demo"

                [tool.pytest.ini_options]
                testpaths = ["tests"]
            "#},
        )
        .unwrap();

        let expected = names(&["project", "build-system", "tool.pytest.ini_options"]);
        let result = ConfigurationVerifier::new().check_pyproject_sections(&path, &expected);
        assert_eq!(result.len(), 3);
        assert!(result["project"]);
        assert!(!result["build-system"]);
        assert!(result["tool.pytest.ini_options"]);
    }

    #[test]
    fn test_gitignore_patterns() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".gitignore");
        fs::write(&path, "__pycache__\n*.pyc\n.venv/\n").unwrap();

        let expected = names(&["__pycache__/", "*.pyc", ".venv/", ".env"]);
        let result = ConfigurationVerifier::new().check_gitignore_excludes(&path, &expected);
        assert!(result["__pycache__/"]);
        assert!(result["*.pyc"]);
        assert!(result[".venv/"]);
        assert!(!result[".env"]);
    }

    #[test]
    fn test_missing_file_is_all_false() {
        let temp = TempDir::new().unwrap();
        let verifier = ConfigurationVerifier::new();
        let expected = names(&["project", "project"]);
        let result = verifier.check_pyproject_sections(&temp.path().join("nope.toml"), &expected);
        assert_eq!(result.len(), 1);
        assert!(result.values().all(|present| !present));

        let result = verifier.check_gitignore_excludes(&temp.path().join(".gitignore"), &[]);
        assert!(result.is_empty());
    }

    #[test]
    fn test_directory_in_place_of_file_is_absent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".gitignore");
        fs::create_dir(&path).unwrap();

        let expected = names(&["*.pyc"]);
        let result = ConfigurationVerifier::new().check_gitignore_excludes(&path, &expected);
        assert!(!result["*.pyc"]);
        assert_eq!(read_optional(&path), None);
    }
}
