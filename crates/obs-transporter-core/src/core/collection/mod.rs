//! Scene Collection Module
//!
//! The in-memory scene collection document plus the metadata derived from it,
//! and the export / import / list operations built on the asset registry.

mod export;
mod import;
mod list;

pub use export::*;
pub use import::*;
pub use list::*;

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::core::assets::{AssetToken, PathFormatter, DEFAULT_ARCHIVE_PREFIX};
use crate::core::device_ids::Platform;
use crate::core::fs::stays_below;
use crate::core::registry;
use crate::core::settings::TransporterSettings;
use crate::core::{paths, CoreError, CoreResult};

/// Archive member holding the serialized scene collection
pub const DOCUMENT_MEMBER: &str = "scene-collection.json";

/// Source `id` used by scenes (scenes are stored as sources)
pub const SCENE_SOURCE_ID: &str = "scene";

/// Name used when a document carries none
pub const UNTITLED: &str = "Untitled";

// =============================================================================
// Options
// =============================================================================

/// Resolved configuration for one export / import / list run
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Directory OBS Studio reads scene collections from
    pub scenes_dir: PathBuf,
    /// Root for per-collection asset directories; platform default when `None`
    pub asset_root: Option<PathBuf>,
    /// Archive directory holding assets
    pub archive_prefix: String,
    /// Platform whose device identifiers imported collections should use
    pub platform: Platform,
    /// Pretty-print installed collections
    pub pretty_json: bool,
}

impl TransportOptions {
    /// Options for `scenes_dir` with defaults for everything else
    pub fn new(scenes_dir: impl Into<PathBuf>) -> Self {
        Self {
            scenes_dir: scenes_dir.into(),
            asset_root: None,
            archive_prefix: DEFAULT_ARCHIVE_PREFIX.to_string(),
            platform: Platform::host(),
            pretty_json: false,
        }
    }

    /// Resolves persisted settings against platform defaults
    pub fn from_settings(settings: &TransporterSettings) -> CoreResult<Self> {
        let scenes_dir = match &settings.scenes_dir {
            Some(dir) => dir.clone(),
            None => paths::default_scenes_dir()?,
        };
        Ok(Self {
            asset_root: settings.asset_root.clone(),
            archive_prefix: settings.archive_prefix.clone(),
            pretty_json: settings.pretty_json,
            ..Self::new(scenes_dir)
        })
    }

    pub fn with_asset_root(mut self, asset_root: impl Into<PathBuf>) -> Self {
        self.asset_root = Some(asset_root.into());
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Asset root to import into, falling back to `<Documents>/OBS/Scene-Assets`
    pub fn resolved_asset_root(&self) -> CoreResult<PathBuf> {
        match &self.asset_root {
            Some(root) => Ok(root.clone()),
            None => paths::default_asset_root(),
        }
    }
}

// =============================================================================
// Scene Collection
// =============================================================================

/// A scene collection document and the metadata derived from it
#[derive(Debug, Clone)]
pub struct SceneCollection {
    /// Collection title
    pub name: String,
    /// File the collection was loaded from, if any
    pub path: Option<PathBuf>,
    /// The parsed document; rewritten in place by export and import
    pub document: Value,
    /// Deduplicated, sorted asset list from the last read pass
    pub assets: Vec<AssetToken>,
    /// Number of sources per source `id`
    pub counts: BTreeMap<String, usize>,
}

impl SceneCollection {
    /// Wraps a parsed document. The document must be a mapping.
    pub fn from_document(document: Value, path: Option<PathBuf>) -> CoreResult<Self> {
        if !document.is_object() {
            return Err(CoreError::InvalidDocument(
                "top level of a scene collection must be an object".to_string(),
            ));
        }

        let name = document
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                path.as_deref()
                    .and_then(Path::file_stem)
                    .map(|stem| stem.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| UNTITLED.to_string());

        let mut collection = Self {
            name,
            path,
            document,
            assets: Vec::new(),
            counts: BTreeMap::new(),
        };
        collection.recount();
        Ok(collection)
    }

    /// Parses a document from `reader`; `source_name` identifies it in errors.
    pub fn from_reader<R: Read>(
        reader: R,
        source_name: &str,
        path: Option<PathBuf>,
    ) -> CoreResult<Self> {
        let document: Value =
            serde_json::from_reader(reader).map_err(|e| CoreError::malformed(source_name, e))?;
        Self::from_document(document, path)
    }

    /// Loads a collection file and resolves its assets against the filesystem.
    pub fn from_path(path: &Path) -> CoreResult<Self> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let mut collection =
            Self::from_reader(reader, &path.display().to_string(), Some(path.to_path_buf()))?;
        collection.resolve_assets(&crate::core::assets::FsPathFormatter::new());
        Ok(collection)
    }

    fn recount(&mut self) {
        let mut counts = BTreeMap::new();
        if let Some(sources) = self.document.get("sources").and_then(Value::as_array) {
            for id in sources
                .iter()
                .filter_map(|s| s.get("id").and_then(Value::as_str))
            {
                *counts.entry(id.to_string()).or_insert(0) += 1;
            }
        }
        self.counts = counts;
    }

    /// Number of entries in `sources`
    pub fn total_sources(&self) -> usize {
        self.document
            .get("sources")
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    /// Number of scenes
    pub fn scene_count(&self) -> usize {
        self.counts.get(SCENE_SOURCE_ID).copied().unwrap_or(0)
    }

    /// Number of sources that are not scenes
    pub fn source_count(&self) -> usize {
        self.total_sources().saturating_sub(self.scene_count())
    }

    /// Renames the collection, including the `name` field of the document
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
        if let Some(map) = self.document.as_object_mut() {
            map.insert("name".to_string(), Value::String(name.to_string()));
        }
    }

    /// Raw string values of every registered asset field, in document order
    pub fn asset_values(&self) -> Vec<String> {
        let mut values = Vec::new();
        registry::for_each_asset_field(&self.document, |map, key| {
            if let Some(value) = map.get(key).and_then(Value::as_str) {
                values.push(value.to_string());
            }
        });
        values
    }

    /// Read pass: expands every asset field through `formatter` and stores the
    /// deduplicated, sorted result in [`SceneCollection::assets`].
    pub fn resolve_assets(&mut self, formatter: &dyn PathFormatter) -> &[AssetToken] {
        let tokens: BTreeSet<AssetToken> = self
            .asset_values()
            .iter()
            .flat_map(|value| {
                let expanded = formatter.format_expanding_dirs(value);
                if expanded.is_empty() {
                    debug!(path = %value, "Asset reference did not resolve to any file");
                }
                expanded
            })
            .collect();

        self.assets = tokens.into_iter().collect();
        warn_on_colliding_remainders(&self.assets);
        &self.assets
    }

    /// Mutate pass: every asset field the formatter can locate is rewritten to
    /// `base + "/" + remainder`. Remainders that would climb out of `base` are
    /// left alone. Returns the number of rewritten fields.
    pub fn rewrite_assets(&mut self, base: &str, formatter: &dyn PathFormatter) -> usize {
        let mut rewritten = 0;
        registry::for_each_asset_field_mut(&mut self.document, |map, key| {
            let Some(current) = map.get(key).and_then(Value::as_str) else {
                return;
            };
            match formatter.format_file_name(current) {
                Some(token)
                    if token.is_located() && stays_below(&token.remainder) =>
                {
                    let new_value = token.rebased(base);
                    debug!(from = %current, to = %new_value, "Rewriting asset path");
                    map.insert(key.to_string(), Value::String(new_value));
                    rewritten += 1;
                }
                _ => {
                    debug!(path = %current, "Leaving unresolved or unsafe asset path untouched");
                }
            }
        });
        rewritten
    }
}

/// Remainders claimed by more than one base directory. Two such files would
/// land on the same archive member / destination file.
fn colliding_remainders(assets: &[AssetToken]) -> BTreeMap<&str, BTreeSet<&str>> {
    let mut bases: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for token in assets.iter().filter(|t| t.is_located()) {
        bases
            .entry(token.remainder.as_str())
            .or_default()
            .insert(token.base.as_str());
    }
    bases.retain(|_, b| b.len() > 1);
    bases
}

fn warn_on_colliding_remainders(assets: &[AssetToken]) {
    for (remainder, bases) in colliding_remainders(assets) {
        warn!(
            remainder = %remainder,
            bases = ?bases,
            "Assets from different directories share a relative path; only one will be kept"
        );
    }
}
