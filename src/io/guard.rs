//! Overwrite protection for save targets.

use crate::{Error, Result};
use std::fs;
use std::path::Path;

/// Prepares `path` for writing.
///
/// Creates the parent directory (and any missing ancestors), then refuses to
/// proceed if a file already exists at `path` unless `overwrite` is set.
///
/// # Errors
///
/// Returns [`Error::AlreadyExists`] if the target exists and `overwrite` is
/// false, or [`Error::OperationFailed`] if the directory cannot be created.
pub fn check_writable(path: &Path, overwrite: bool) -> Result<()> {
    ensure_parent_dir(path)?;
    if path.exists() && !overwrite {
        return Err(Error::AlreadyExists {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Creates the parent directory of `path` if needed. Idempotent.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| {
                Error::failed("create_parent_dir", format!("{}: {e}", parent.display()))
            })
        },
        _ => Ok(()),
    }
}
