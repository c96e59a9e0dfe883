//! Path helpers for allowlist confinement
//!
//! The allowlist check must compare whole path components, never raw string
//! prefixes, so `/projects-evil` can not spoof `/projects`.

use std::path::{Component, Path, PathBuf};

use crate::{Error, Result};

/// Make `path` absolute (against the current directory) and resolve `.` and
/// `..` components lexically, without touching the filesystem.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| Error::Environment(format!("cannot resolve current directory: {e}")))?
            .join(path)
    };

    let mut cleaned = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    Ok(cleaned)
}

/// Check whether `path`, once absolutized, lies inside `root`.
///
/// Comparison is component-wise via `Path::starts_with`.
pub fn is_within(path: &Path, root: &Path) -> Result<bool> {
    let cleaned = absolutize(path)?;
    Ok(cleaned.starts_with(root))
}
