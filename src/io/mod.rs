//! Thin file helpers shared by the engine, status ledger and commands.

use crate::errors::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

pub fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::file_system("Failed to read file", path, e))
}

pub fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    fs::write(path, content).map_err(|e| Error::file_system("Failed to write file", path, e))
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .map_err(|e| Error::file_system("Failed to create directory", path, e))?;
    }
    Ok(())
}

pub fn file_exists(path: &Path) -> bool {
    path.exists() && path.is_file()
}

pub fn dir_exists(path: &Path) -> bool {
    path.exists() && path.is_dir()
}

/// Write `content` to a temporary sibling and rename it over `path`.
///
/// Readers observe either the previous file or the complete new one.
pub fn write_file_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "layoutmap".to_string());
    let temp_path = path.with_file_name(format!(".{}.tmp.{}", file_name, std::process::id()));

    let write_result = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        Ok(())
    })();
    if let Err(e) = write_result {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::file_system("Failed to write temporary file", &temp_path, e));
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        Error::file_system("Failed to move file into place", path, e)
    })
}

/// Write a file and mark it executable (0o755 on unix).
pub fn write_executable(path: &Path, content: &str) -> Result<()> {
    write_file(path, content)?;
    set_executable(path)
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .map_err(|e| Error::file_system("Failed to set permissions", path, e))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_file_creates_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a").join("b").join("report.md");
        write_file(&path, "# Report").unwrap();
        assert_eq!(read_file(&path).unwrap(), "# Report");
    }

    #[test]
    fn test_atomic_write_replaces_and_leaves_no_temp() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("status.json");
        write_file_atomic(&path, "{}").unwrap();
        write_file_atomic(&path, "{\"v\":1}").unwrap();

        assert_eq!(read_file(&path).unwrap(), "{\"v\":1}");
        let leftovers: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp."))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_read_missing_file_is_file_system_error() {
        let err = read_file(Path::new("/definitely/not/here.md")).unwrap_err();
        assert!(matches!(err, Error::FileSystem { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_write_executable_sets_mode() {
        use std::os::unix::fs::PermissionsExt;
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("backup.sh");
        write_executable(&path, "#!/usr/bin/env bash\n").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
