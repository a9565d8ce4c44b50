use crate::config::CONFIG_FILE_NAME;
use crate::io;
use anyhow::Result;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = r#"# Layoutmap Configuration

[scan]
# Directory levels below the project root to walk (at most 32)
max_depth = 3
# Vendored dependency directory analysed for cleanup
lib_dir = "lib"

[documents]
improvements = "SDLC_Improvement_Suggestions.md"
structure = "Proposed_Structure.md"
checklist = "Quick_Action_Checklist.md"

[verify]
pyproject_sections = ["project", "build-system", "tool.pytest.ini_options"]
gitignore_patterns = ["__pycache__/", "*.pyc", ".venv/", ".env"]

[planning]
# Tasks at or under this many hours count as quick wins
quick_win_hours = 4.0

[planning.category_weights]
"Testing" = 3
"Configuration" = 3
"CI/CD" = 2
"Documentation" = 2
"Source Code" = 2
"Tooling" = 1
"Directory Structure" = 1

[migration]
manifest_file = "requirements.txt"
backup_dir = ".migration_backup"
"#;

pub fn init_config(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);
    init_config_at(&config_path, force)?;
    println!("Created {} configuration file", CONFIG_FILE_NAME);
    Ok(())
}

pub fn init_config_at(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }
    io::write_file(config_path, DEFAULT_CONFIG)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse_and_validate_config, LayoutmapConfig};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config_matches_defaults() {
        let parsed = parse_and_validate_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(parsed, LayoutmapConfig::default());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        init_config_at(&path, false).unwrap();
        assert!(init_config_at(&path, false).is_err());
        init_config_at(&path, true).unwrap();
    }
}
