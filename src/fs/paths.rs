//! Path and directory management.

use std::path::{Path, PathBuf};

use crate::error::Result;

/// `root/<year>`, the destination of one year-batch.
pub fn year_directory(root: &Path, year: i32) -> PathBuf {
    root.join(year.to_string())
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
        tracing::debug!("Created directory {}", path.display());
    }
    Ok(())
}

/// Create `root/<year>` and return it.
pub fn create_year_directory(root: &Path, year: i32) -> Result<PathBuf> {
    let path = year_directory(root, year);
    ensure_dir(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_year_directory() {
        assert_eq!(
            year_directory(Path::new("images"), 2023),
            PathBuf::from("images/2023")
        );
    }

    #[test]
    fn test_create_year_directory() {
        let root = TempDir::new().unwrap();
        let path = create_year_directory(root.path(), 2020).unwrap();
        assert!(path.is_dir());
        assert_eq!(path, root.path().join("2020"));

        // Existing directory is fine
        create_year_directory(root.path(), 2020).unwrap();
    }
}
