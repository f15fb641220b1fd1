//! Target filenames for downloaded items.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Make a provider-supplied filename safe to join onto a directory.
///
/// Separators and characters that are invalid on common filesystems are
/// replaced, so an item is still downloaded under a recognisable name. Names
/// that cannot be made safe (empty, `.` or `..`) are rejected.
pub fn sanitize_filename(name: &str) -> Result<String> {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    // Windows drops trailing dots and spaces, which would alias two names
    let sanitized = sanitized.trim_end_matches(['.', ' ']).trim_start();

    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        return Err(Error::InvalidFilename(format!(
            "'{}' cannot be used as a filename",
            name
        )));
    }

    if sanitized != name {
        tracing::debug!("Sanitized filename '{}' -> '{}'", name, sanitized);
    }

    Ok(sanitized.to_string())
}

/// `directory/filename` for an item, with the filename sanitized.
pub fn target_path(directory: &Path, filename: &str) -> Result<PathBuf> {
    Ok(directory.join(sanitize_filename(filename)?))
}
