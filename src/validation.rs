//! Asset name and archive path validation

use std::path::{Component, Path};

/// Maximum accepted asset name length in bytes.
pub const MAX_ASSET_NAME_BYTES: usize = 255;

/// Asset name validation errors with helpful messages
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AssetNameError {
    #[error("File name is empty")]
    Empty,

    #[error("File name is too long (maximum {max} bytes)")]
    TooLong { max: usize },

    #[error("File name cannot start or end with whitespace")]
    InvalidWhitespace,

    #[error("File name contains path separators (/ or \\)")]
    PathTraversal,

    #[error("File name contains control characters: {chars}")]
    ControlCharacters { chars: String },

    #[error("File name is reserved: {name}")]
    Reserved { name: String },
}

/// Validate a file name used as a record key. Returns the name unchanged when valid.
pub fn validate_asset_name(name: &str) -> Result<&str, AssetNameError> {
    if name.trim().is_empty() {
        return Err(AssetNameError::Empty);
    }
    if name.len() > MAX_ASSET_NAME_BYTES {
        return Err(AssetNameError::TooLong {
            max: MAX_ASSET_NAME_BYTES,
        });
    }
    if name.trim() != name {
        return Err(AssetNameError::InvalidWhitespace);
    }
    if name.contains('/') || name.contains('\\') {
        return Err(AssetNameError::PathTraversal);
    }
    if name == "." || name == ".." {
        return Err(AssetNameError::Reserved {
            name: name.to_string(),
        });
    }
    if name.chars().any(|c| c.is_control()) {
        let chars = name
            .chars()
            .filter(|c| c.is_control())
            .map(|c| format!("\\u{{{:04x}}}", c as u32))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(AssetNameError::ControlCharacters { chars });
    }
    Ok(name)
}

/// Check if an archive entry path is safe (no path traversal or absolute paths).
pub fn is_safe_archive_path(path: &str) -> bool {
    if path.starts_with('/') || path.starts_with('\\') || Path::new(path).is_absolute() {
        return false;
    }
    Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Hidden entries (`.DS_Store`, `._foo.png`) are never imported.
pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.')
}

/// Return the file name of an archive entry that sits directly inside `folder`.
///
/// `folder/file.png` yields `file.png`; directory entries, nested paths,
/// hidden files and unsafe paths yield `None`.
pub fn archive_child_name<'a>(entry_path: &'a str, folder: &str) -> Option<&'a str> {
    if !is_safe_archive_path(entry_path) {
        return None;
    }
    let rest = entry_path.strip_prefix(folder)?.strip_prefix('/')?;
    if rest.is_empty() || rest.contains('/') || is_hidden_name(rest) {
        return None;
    }
    validate_asset_name(rest).ok()
}

/// Validate file size against limits
pub fn validate_file_size(size: u64, max_size: u64) -> Result<(), String> {
    if size > max_size {
        return Err(format!(
            "{} MB uncompressed exceeds the {} MB limit",
            size / (1024 * 1024),
            max_size / (1024 * 1024)
        ));
    }
    Ok(())
}
