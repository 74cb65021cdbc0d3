//! Path utilities for safe and robust file path handling.
//!
//! This module provides small helpers shared by the scanner, the planner and the
//! cover pipeline: lossy file-name extraction, hidden/junk detection, extension
//! matching and resolution of the user-supplied series directory.

use crate::error::{Error, Result};

use std::path::{Component, Path, PathBuf};

/// Name of the resource-fork directory macOS adds to archives.
const MACOS_METADATA_DIR: &str = "__MACOSX";

/// Gets the file name from a path with fallback to lossy conversion.
///
/// # Arguments
///
/// * `path` - The path to extract the file name from
///
/// # Returns
///
/// * `String` - The file name, using lossy conversion if necessary
pub fn get_file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Splits a file name into its stem and its extension (with the leading dot).
///
/// `"Series v1.cbz"` becomes `("Series v1", ".cbz")`; a name without extension
/// yields an empty extension.
pub fn split_extension(file_name: &str) -> (String, String) {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| file_name.to_string());
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (stem, ext)
}

/// Checks if a name is hidden (starts with a dot) or an AppleDouble `._` file.
pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.')
}

/// Checks if a filename starts with a dot (hidden file) using safe conversion.
///
/// # Arguments
///
/// * `path` - The path to check
///
/// # Returns
///
/// * `bool` - True if the file is hidden (starts with a dot)
pub fn is_hidden_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| is_hidden_name(&name.to_string_lossy()))
        .unwrap_or(false)
}

/// Checks whether any component of an archive entry path is hidden or macOS metadata.
pub fn has_junk_component(entry_name: &str) -> bool {
    Path::new(entry_name).components().any(|component| match component {
        Component::Normal(part) => {
            let part = part.to_string_lossy();
            part == MACOS_METADATA_DIR || is_hidden_name(&part)
        }
        _ => false,
    })
}

/// Case-insensitive check of a name against a list of extensions (with dots).
pub fn has_extension(name: &str, extensions: &[&str]) -> bool {
    let lower = name.to_ascii_lowercase();
    extensions.iter().any(|ext| lower.ends_with(ext))
}

/// Expands a leading `~` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            let suffix = path.strip_prefix("~/").unwrap_or("");
            return PathBuf::from(home).join(suffix);
        }
    }
    PathBuf::from(path)
}

/// Resolves a user-supplied series directory to a canonical, existing directory.
///
/// # Arguments
///
/// * `raw` - The path as typed by the user, `~` allowed
///
/// # Returns
///
/// * `Result<PathBuf>` - The canonical directory path
pub fn resolve_series_dir(raw: &str) -> Result<PathBuf> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidPath(
            PathBuf::new(),
            "Folder path is empty".to_string(),
        ));
    }

    let expanded = expand_tilde(trimmed);
    let resolved = expanded.canonicalize().map_err(|e| {
        Error::InvalidPath(expanded.clone(), format!("Cannot resolve path: {}", e))
    })?;

    if !resolved.is_dir() {
        return Err(Error::InvalidPath(
            resolved,
            "Not a directory".to_string(),
        ));
    }
    Ok(resolved)
}
