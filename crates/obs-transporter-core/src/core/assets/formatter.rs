//! Filesystem Asset Formatter
//!
//! Resolves asset references that point at the local filesystem.

use std::path::Path;

use walkdir::WalkDir;

use super::AssetToken;

/// Common interface of the filesystem and archive formatters
pub trait PathFormatter {
    /// Splits `path` into a token, or `None` if it is not a usable asset location
    fn format_file_name(&self, path: &str) -> Option<AssetToken>;

    /// Like [`PathFormatter::format_file_name`], but a directory yields one token per file in it
    fn format_expanding_dirs(&self, path: &str) -> Vec<AssetToken>;
}

/// Formatter backed by the regular filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsPathFormatter;

impl FsPathFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl PathFormatter for FsPathFormatter {
    /// Splits an existing file or directory into (containing directory, name).
    fn format_file_name(&self, path: &str) -> Option<AssetToken> {
        let p = Path::new(path);
        if !p.is_file() && !p.is_dir() {
            return None;
        }
        let name = p.file_name()?.to_string_lossy().into_owned();
        Some(AssetToken::new(parent_of(p), name))
    }

    /// Expands a directory exactly one level deep; hidden entries and
    /// subdirectories are left out.
    fn format_expanding_dirs(&self, path: &str) -> Vec<AssetToken> {
        let p = Path::new(path);
        if p.is_file() {
            return self.format_file_name(path).into_iter().collect();
        }
        if !p.is_dir() {
            return Vec::new();
        }
        let Some(dir_name) = p.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            return Vec::new();
        };
        let base = parent_of(p);

        let mut tokens = Vec::new();
        for entry in WalkDir::new(p)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping unreadable playlist entry");
                    continue;
                }
            };

            let name = entry.file_name().to_string_lossy();
            if name.starts_with('.') || !entry.file_type().is_file() {
                continue;
            }
            tokens.push(AssetToken::new(base.clone(), format!("{dir_name}/{name}")));
        }
        tokens
    }
}

fn parent_of(path: &Path) -> String {
    path.parent()
        .map(|parent| parent.to_string_lossy().into_owned())
        .unwrap_or_default()
}
