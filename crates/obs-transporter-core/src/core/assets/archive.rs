//! Archive Asset Formatter
//!
//! Resolves asset references that point into a scene collection archive.
//! Member names are matched textually; directory references match every
//! member below `name + "/"`.

use std::io::{Read, Seek};

use zip::ZipArchive;

use super::{AssetToken, PathFormatter};

/// Default prefix under which assets are stored in an archive
pub const DEFAULT_ARCHIVE_PREFIX: &str = "assets";

/// Formatter backed by the member list of a zip archive
#[derive(Debug, Clone)]
pub struct ArchivePathFormatter {
    prefix: String,
    names: Vec<String>,
}

impl ArchivePathFormatter {
    /// Creates a formatter over an explicit list of member names
    pub fn new(names: Vec<String>, prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            names,
        }
    }

    /// Creates a formatter over the members of an open archive
    pub fn from_archive<R: Read + Seek>(archive: &ZipArchive<R>, prefix: impl Into<String>) -> Self {
        let names = archive.file_names().map(str::to_string).collect();
        Self::new(names, prefix)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl PathFormatter for ArchivePathFormatter {
    /// Names outside the prefix come back unlocated (whole name as base, empty remainder).
    fn format_file_name(&self, path: &str) -> Option<AssetToken> {
        let located = path
            .strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|rest| !rest.is_empty());

        Some(match located {
            Some(rest) => AssetToken::new(self.prefix.clone(), rest),
            None => AssetToken::unlocated(path),
        })
    }

    fn format_expanding_dirs(&self, path: &str) -> Vec<AssetToken> {
        let to_token = |name: &str| {
            self.format_file_name(name)
                .unwrap_or_else(|| AssetToken::unlocated(name))
        };

        if self.names.iter().any(|n| n == path) {
            return vec![to_token(path)];
        }

        let dir = format!("{}/", path.trim_end_matches('/'));
        self.names
            .iter()
            .filter(|n| n.starts_with(&dir) && !n.ends_with('/'))
            .map(|n| to_token(n.as_str()))
            .collect()
    }
}
