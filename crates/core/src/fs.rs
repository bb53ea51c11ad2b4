//! Filesystem helpers shared by the build pipeline and the editor session.
//!
//! Name and path validation, glob-based file discovery, recursive copies and
//! modification stamps. Every fallible operation returns [`crate::Result`].

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use tracing::debug;

use crate::error::Error;
use crate::result::Result;

/// Characters that may never appear in a file or folder name.
const INVALID_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Characters that may never appear anywhere in a path.
const INVALID_PATH_CHARS: &[char] = &['<', '>', '"', '|', '?', '*'];

/// Check whether `name` can be used verbatim as a single file name.
#[must_use]
pub fn is_valid_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.ends_with(' ')
        && !name.ends_with('.')
        && !name
            .chars()
            .any(|c| c.is_control() || INVALID_NAME_CHARS.contains(&c))
}

/// Check whether `path` is well formed.
///
/// A colon is only accepted as a drive separator (`C:`), at the second
/// character.
#[must_use]
pub fn is_path_valid(path: &Path) -> bool {
    let Some(text) = path.to_str() else {
        return false;
    };
    if text.trim().is_empty() {
        return false;
    }
    text.char_indices().all(|(index, c)| {
        !c.is_control() && !INVALID_PATH_CHARS.contains(&c) && (c != ':' || index == 1)
    })
}

/// Find files under `dir` whose names match `pattern` (e.g. `*.dll`).
///
/// Returns an empty list when `dir` does not exist.
///
/// # Errors
///
/// Returns [`Error::InvalidPattern`] if the glob pattern cannot be compiled.
pub fn find_files(dir: &Path, pattern: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let base = glob::Pattern::escape(&dir.to_string_lossy());
    let full = if recursive {
        format!("{base}/**/{pattern}")
    } else {
        format!("{base}/{pattern}")
    };
    let paths = glob::glob(&full).map_err(|e| Error::InvalidPattern {
        pattern: full.clone(),
        reason: e.to_string(),
    })?;
    Ok(paths
        .filter_map(std::result::Result::ok)
        .filter(|p| p.is_file())
        .collect())
}

/// Modification time of `path` in milliseconds since the Unix epoch.
///
/// # Errors
///
/// Returns an error if the file metadata cannot be read.
pub fn modify_stamp(path: &Path) -> Result<i64> {
    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| Error::file_read_failed(path, e.to_string()))?;
    let millis = modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    Ok(i64::try_from(millis).unwrap_or(i64::MAX))
}

/// Newest modification stamp among files matching `pattern` under `dir`.
///
/// Returns 0 when the folder is missing or holds no matching file.
///
/// # Errors
///
/// Returns an error if the pattern is invalid or a matching file's metadata
/// cannot be read.
pub fn newest_modify_stamp(dir: &Path, pattern: &str, recursive: bool) -> Result<i64> {
    find_files(dir, pattern, recursive)?
        .iter()
        .try_fold(0_i64, |newest, path| Ok(newest.max(modify_stamp(path)?)))
}

/// Create `dir` and all of its parents.
///
/// # Errors
///
/// Returns [`Error::DirectoryCreationFailed`] on failure.
pub fn create_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| Error::directory_creation_failed(dir, e.to_string()))
}

/// Delete `dir` recursively; a missing folder is not an error.
///
/// # Errors
///
/// Returns [`Error::DeleteFailed`] if the folder exists but cannot be removed.
pub fn delete_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    debug!(path = %dir.display(), "Deleting folder");
    std::fs::remove_dir_all(dir).map_err(|e| Error::delete_failed(dir, e.to_string()))
}

/// Copy one file, creating the destination's parent folders and overwriting
/// any existing file.
///
/// # Errors
///
/// Returns [`Error::CopyFailed`] or [`Error::DirectoryCreationFailed`].
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        create_dir(parent)?;
    }
    std::fs::copy(from, to)
        .map(|_| ())
        .map_err(|e| Error::copy_failed(from, to, e.to_string()))
}

/// Copy the whole tree under `from` into `to`, overwriting existing files.
///
/// Returns the number of files copied.
///
/// # Errors
///
/// Returns [`Error::DirectoryNotFound`] if `from` is not a folder, or the
/// first copy failure.
pub fn copy_tree(from: &Path, to: &Path) -> Result<usize> {
    if !from.is_dir() {
        return Err(Error::DirectoryNotFound {
            path: from.to_path_buf(),
        });
    }
    create_dir(to)?;
    let files = find_files(from, "*", true)?;
    for file in &files {
        let relative = file
            .strip_prefix(from)
            .map_err(|e| Error::copy_failed(file, to, e.to_string()))?;
        copy_file(file, &to.join(relative))?;
    }
    debug!(
        from = %from.display(),
        to = %to.display(),
        files = files.len(),
        "Copied folder"
    );
    Ok(files.len())
}

/// File name of `path` as an owned string, or an empty string.
#[must_use]
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
