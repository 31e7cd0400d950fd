//! Filesystem utilities.
//!
//! This module provides safe primitives for writing files in a crash-tolerant way,
//! and the checks applied to archive member names before they become paths on disk.
//!
//! Why this exists:
//! - An installed scene collection is read by OBS Studio on its next start; a partial
//!   write (power loss, crash) must not leave a truncated collection behind.
//! - Archives come from other machines; a member name must never escape the
//!   destination asset directory.
//! - Windows semantics differ from Unix for rename-over-existing; we handle both.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use crate::core::{CoreError, CoreResult};

// =============================================================================
// Path Validation Utilities
// =============================================================================

/// Validates that a collection name is safe to use as a file name.
///
/// Rejects empty names, path separators, traversal sequences and control characters.
pub fn validate_collection_name(name: &str) -> Result<(), String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("collection name is empty or contains only whitespace".to_string());
    }
    if trimmed == "." || trimmed == ".." || trimmed.contains('/') || trimmed.contains('\\') {
        return Err(format!(
            "Invalid collection name {name:?}: contains path traversal characters"
        ));
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(format!(
            "Invalid collection name {name:?}: contains control characters"
        ));
    }
    Ok(())
}

/// Converts a `/`-separated archive remainder into a relative path that stays
/// below whatever directory it is joined onto.
///
/// # Security
/// Rejects absolute paths, drive prefixes, `..` components, backslashes and
/// control characters, so `dest.join(result)` can never point outside `dest`.
pub fn safe_relative_path(remainder: &str) -> Result<PathBuf, String> {
    if remainder.trim().is_empty() {
        return Err("member name is empty".to_string());
    }
    if remainder.chars().any(|c| c.is_control()) {
        return Err(format!("member name {remainder:?} contains control characters"));
    }
    if remainder.contains('\\') || remainder.contains(':') {
        return Err(format!(
            "member name {remainder:?} contains platform-specific separators"
        ));
    }

    let mut result = PathBuf::new();
    for component in Path::new(remainder).components() {
        match component {
            Component::Normal(part) => result.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(format!(
                    "member name {remainder:?} escapes the destination directory"
                ));
            }
        }
    }

    if result.as_os_str().is_empty() {
        return Err(format!("member name {remainder:?} has no file component"));
    }
    Ok(result)
}

/// True if joining `remainder` onto a directory cannot leave that directory.
///
/// Weaker than [`safe_relative_path`]: names that are merely awkward on some
/// platforms (`:`) pass, traversal does not.
pub fn stays_below(remainder: &str) -> bool {
    !remainder.contains('\\')
        && Path::new(remainder)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

// =============================================================================
// Atomic Writes
// =============================================================================

/// Write bytes to `path` using an atomic replace pattern.
///
/// Implementation notes:
/// - Write to a sibling temporary file.
/// - Flush and sync the temp file.
/// - Swap into place by renaming.
/// - If the destination exists, it is first moved aside as a `.bak` file, then removed.
pub fn atomic_write_bytes(path: &Path, bytes: &[u8]) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = tmp_path_for(path);
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes)?;
        writer.flush()?;
        // Best-effort fsync. If it fails, we still surface the error.
        writer.get_ref().sync_all()?;
    }

    atomic_replace(path, &tmp_path)?;
    Ok(())
}

/// Write a JSON file atomically, pretty-printed or compact.
pub fn atomic_write_json<T: serde::Serialize>(
    path: &Path,
    value: &T,
    pretty: bool,
) -> CoreResult<()> {
    let bytes = if pretty {
        serde_json::to_vec_pretty(value)?
    } else {
        serde_json::to_vec(value)?
    };
    atomic_write_bytes(path, &bytes)
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "tmp".to_string());
    tmp.set_file_name(format!("{file_name}.tmp"));
    tmp
}

fn bak_path_for(path: &Path) -> PathBuf {
    let mut bak = path.to_path_buf();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "bak".to_string());
    bak.set_file_name(format!("{file_name}.bak"));
    bak
}

fn atomic_replace(dest: &Path, src_tmp: &Path) -> CoreResult<()> {
    // Fast path: dest does not exist.
    if !dest.exists() {
        std::fs::rename(src_tmp, dest)?;
        return Ok(());
    }

    // Windows: rename-over-existing may fail depending on filesystem; use a backup swap.
    let bak = bak_path_for(dest);

    if bak.exists() {
        let _ = std::fs::remove_file(&bak);
    }

    std::fs::rename(dest, &bak)?;
    match std::fs::rename(src_tmp, dest) {
        Ok(()) => {
            let _ = std::fs::remove_file(&bak);
            Ok(())
        }
        Err(e) => {
            // Try to restore the old file.
            let _ = std::fs::rename(&bak, dest);
            let _ = std::fs::remove_file(src_tmp);
            Err(CoreError::IoError(e))
        }
    }
}
