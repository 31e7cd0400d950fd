//! Collection listing for the scene store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;
use walkdir::WalkDir;

use super::SceneCollection;
use crate::core::paths::COLLECTION_EXTENSION;
use crate::core::CoreResult;

/// Loads every scene collection in `scenes_dir`, sorted by file name.
///
/// Files that fail to parse are skipped with a warning. A missing store
/// yields an empty list.
pub fn list_collections(scenes_dir: &Path) -> CoreResult<Vec<SceneCollection>> {
    if !scenes_dir.is_dir() {
        warn!("Scene collection directory {} does not exist", scenes_dir.display());
        return Ok(Vec::new());
    }

    let mut collections = Vec::new();
    for entry in WalkDir::new(scenes_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(std::io::Error::from)?;
        let path = entry.path();
        let is_collection = entry.file_type().is_file()
            && path.extension().is_some_and(|ext| ext == COLLECTION_EXTENSION);
        if !is_collection {
            continue;
        }

        match SceneCollection::from_path(path) {
            Ok(collection) => collections.push(collection),
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }
    Ok(collections)
}

/// One asset of a listed collection
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSummary {
    pub path: String,
    pub exists: bool,
}

/// Serializable overview of a collection, as printed by `list --json`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    pub name: String,
    pub path: Option<PathBuf>,
    pub scenes: usize,
    pub sources: usize,
    pub counts: BTreeMap<String, usize>,
    pub assets: Vec<AssetSummary>,
}

impl SceneCollection {
    pub fn summary(&self) -> CollectionSummary {
        CollectionSummary {
            name: self.name.clone(),
            path: self.path.clone(),
            scenes: self.scene_count(),
            sources: self.source_count(),
            counts: self.counts.clone(),
            assets: self
                .assets
                .iter()
                .map(|token| {
                    let path = token.joined();
                    let exists = Path::new(&path).is_file();
                    AssetSummary { path, exists }
                })
                .collect(),
        }
    }
}
