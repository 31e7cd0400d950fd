//! Path Resolution Utilities
//!
//! Where OBS Studio keeps scene collections, and where imported assets go by default.
//!
//! OBS stores collections under `obs-studio/basic/scenes` inside the per-user
//! configuration directory: `%APPDATA%` on Windows, `~/Library/Application Support`
//! on macOS and `$XDG_CONFIG_HOME` (usually `~/.config`) elsewhere, which is exactly
//! what [`dirs::config_dir`] returns on each platform.

use std::path::{Path, PathBuf};

use crate::core::{CoreError, CoreResult};

/// File extension of serialized scene collections
pub const COLLECTION_EXTENSION: &str = "json";

/// Directory holding OBS Studio scene collections for the current user
pub fn default_scenes_dir() -> CoreResult<PathBuf> {
    dirs::config_dir()
        .map(|p| p.join("obs-studio").join("basic").join("scenes"))
        .ok_or(CoreError::DirectoryUnavailable("configuration"))
}

/// The user's Documents folder, falling back to `~/Documents`
pub fn documents_dir() -> CoreResult<PathBuf> {
    // "dirs" is best-effort and may return None in sandboxed or headless environments.
    dirs::document_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Documents")))
        .ok_or(CoreError::DirectoryUnavailable("documents"))
}

/// Root below which imported collections get their own asset directory
pub fn default_asset_root() -> CoreResult<PathBuf> {
    Ok(documents_dir()?.join("OBS").join("Scene-Assets"))
}

/// Asset directory for one collection, scoped by name so collections never collide
pub fn collection_asset_dir(asset_root: &Path, collection_name: &str) -> PathBuf {
    asset_root.join(collection_name)
}

/// Path of the serialized collection `name` inside `scenes_dir`
pub fn collection_file(scenes_dir: &Path, name: &str) -> PathBuf {
    scenes_dir.join(format!("{name}.{COLLECTION_EXTENSION}"))
}

/// Resolves a collection reference given on the command line.
///
/// An existing file is used as-is; anything else is treated as a collection
/// name and looked up in `scenes_dir`.
pub fn resolve_collection(scenes_dir: &Path, name_or_path: &str) -> CoreResult<PathBuf> {
    let direct = Path::new(name_or_path);
    if direct.is_file() {
        return Ok(direct.to_path_buf());
    }
    let in_store = collection_file(scenes_dir, name_or_path);
    if in_store.is_file() {
        Ok(in_store)
    } else {
        Err(CoreError::CollectionNotFound(format!(
            "{name_or_path} (looked in {})",
            scenes_dir.display()
        )))
    }
}

/// Converts a path into the string form stored in scene collection documents.
pub fn path_to_document_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
