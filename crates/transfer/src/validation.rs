use std::path::{Component, Path, PathBuf};

use crate::TransferError;

/// Validates that a relative file path does not escape its base directory.
///
/// Rejects:
/// - Empty paths
/// - Absolute paths (Unix `/` or Windows `C:\`)
/// - Parent directory traversal (`..`)
/// - Windows prefix components (`C:`, `\\server`)
/// - Paths that name no file at all (`.`, `./`)
pub fn validate_upload_path(file_path: &str) -> Result<(), TransferError> {
    if file_path.is_empty() {
        return Err(TransferError::InvalidPath("empty path".into()));
    }

    let path = Path::new(file_path);

    if path.is_absolute() {
        return Err(TransferError::InvalidPath(format!(
            "absolute path not allowed: {file_path}"
        )));
    }

    let mut normal = 0usize;
    for component in path.components() {
        match component {
            Component::ParentDir => {
                return Err(TransferError::InvalidPath(format!(
                    "parent directory traversal not allowed: {file_path}"
                )));
            }
            Component::Prefix(_) => {
                return Err(TransferError::InvalidPath(format!(
                    "path prefix not allowed: {file_path}"
                )));
            }
            Component::RootDir => {
                return Err(TransferError::InvalidPath(format!(
                    "absolute path not allowed: {file_path}"
                )));
            }
            Component::CurDir => {}
            Component::Normal(_) => normal += 1,
        }
    }

    if normal == 0 {
        return Err(TransferError::InvalidPath(format!(
            "path names no file: {file_path}"
        )));
    }

    Ok(())
}

/// Joins `file_path` onto `root` and returns the normalized result.
///
/// The result is guaranteed to be a strict descendant of `root`.
pub fn resolve_within_root(root: &Path, file_path: &str) -> Result<PathBuf, TransferError> {
    validate_upload_path(file_path)?;

    let mut resolved = root.to_path_buf();
    for component in Path::new(file_path).components() {
        if let Component::Normal(part) = component {
            resolved.push(part);
        }
    }

    if !resolved.starts_with(root) || resolved == root {
        return Err(TransferError::InvalidPath(format!(
            "path escapes deployment root: {file_path}"
        )));
    }

    Ok(resolved)
}

/// Validates `file_path` and returns it as a `/`-joined object key with
/// `.` segments and repeated separators removed.
pub fn normalize_key(file_path: &str) -> Result<String, TransferError> {
    validate_upload_path(file_path)?;

    let parts: Vec<&str> = Path::new(file_path)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();
    Ok(parts.join("/"))
}

/// Validates a single file name taken from a download URL.
///
/// The name must be one path segment: no `..`, no separators.
pub fn validate_download_name(name: &str) -> Result<(), TransferError> {
    if name.is_empty() || name.contains("..") || name.contains('/') || name.contains('\\') {
        return Err(TransferError::InvalidFilename(name.to_string()));
    }
    Ok(())
}
