//! Collection import: installs an archived collection into the scene store and
//! unpacks its assets into a per-collection directory.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};
use zip::result::ZipError;
use zip::ZipArchive;

use super::{SceneCollection, TransportOptions, DOCUMENT_MEMBER};
use crate::core::assets::{ArchivePathFormatter, AssetToken};
use crate::core::fs::{atomic_write_json, safe_relative_path, validate_collection_name};
use crate::core::{device_ids, paths, CoreError, CoreResult};

/// Outcome of an import
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub name: String,
    /// Installed collection file
    pub collection_file: PathBuf,
    /// Directory assets were extracted into
    pub asset_dir: PathBuf,
    /// Asset fields rewritten to point into `asset_dir`
    pub rewritten: usize,
    /// Device identifiers translated for the host platform
    pub translated: usize,
    /// Files written below `asset_dir`
    pub extracted: Vec<PathBuf>,
    /// Archive members that could not be extracted
    pub skipped: Vec<String>,
}

/// Imports the archive at `archive`.
///
/// `name` overrides the collection name stored in the archive; `asset_dir`
/// overrides `<asset root>/<name>` as the extraction directory.
pub fn import_collection(
    archive: &Path,
    name: Option<&str>,
    asset_dir: Option<&Path>,
    options: &TransportOptions,
) -> CoreResult<ImportReport> {
    info!("Importing scene collection from {}", archive.display());
    let file = File::open(archive)?;
    let mut zip = ZipArchive::new(BufReader::new(file))?;

    let mut collection = read_document(&mut zip, archive)?;
    let formatter = ArchivePathFormatter::from_archive(&zip, options.archive_prefix.as_str());
    collection.resolve_assets(&formatter);

    // The installed file is named after the collection, so the document must carry that name too
    let name = name.map_or_else(|| collection.name.clone(), str::to_string);
    collection.set_name(&name);
    validate_collection_name(&collection.name).map_err(CoreError::InvalidDocument)?;

    let translated = device_ids::translate_sources(&mut collection.document, options.platform);

    let asset_dir = match asset_dir {
        Some(dir) => dir.to_path_buf(),
        None => paths::collection_asset_dir(&options.resolved_asset_root()?, &collection.name),
    };
    let rewritten = collection.rewrite_assets(&paths::path_to_document_string(&asset_dir), &formatter);

    let collection_file = paths::collection_file(&options.scenes_dir, &collection.name);
    if collection_file.exists() {
        warn!("Replacing existing scene collection {}", collection_file.display());
    }
    atomic_write_json(&collection_file, &collection.document, options.pretty_json)?;
    info!("Installed scene collection {}", collection_file.display());

    std::fs::create_dir_all(&asset_dir)?;
    let mut extracted = Vec::new();
    let mut skipped = Vec::new();
    for token in &collection.assets {
        match extract_asset(&mut zip, token, &asset_dir) {
            Ok(path) => {
                debug!("Extracted {} to {}", token, path.display());
                extracted.push(path);
            }
            Err(reason) => {
                warn!("Skipping archive member {}: {}", token, reason);
                skipped.push(token.joined());
            }
        }
    }

    info!(
        "Imported {:?}: {} assets extracted, {} skipped",
        collection.name,
        extracted.len(),
        skipped.len()
    );

    Ok(ImportReport {
        name: collection.name,
        collection_file,
        asset_dir,
        rewritten,
        translated,
        extracted,
        skipped,
    })
}

fn read_document<R: Read + Seek>(
    zip: &mut ZipArchive<R>,
    archive: &Path,
) -> CoreResult<SceneCollection> {
    let member = match zip.by_name(DOCUMENT_MEMBER) {
        Ok(member) => member,
        Err(ZipError::FileNotFound) => {
            return Err(CoreError::DocumentMissing {
                archive: archive.to_path_buf(),
                member: DOCUMENT_MEMBER.to_string(),
            })
        }
        Err(e) => return Err(e.into()),
    };
    SceneCollection::from_reader(member, &archive.display().to_string(), None)
}

/// Copies one archive member below `dest`; the error is a human-readable reason.
fn extract_asset<R: Read + Seek>(
    zip: &mut ZipArchive<R>,
    token: &AssetToken,
    dest: &Path,
) -> Result<PathBuf, String> {
    if !token.is_located() {
        return Err("not stored under the archive asset prefix".to_string());
    }
    let relative = safe_relative_path(&token.remainder)?;
    let target = dest.join(relative);

    let mut member = zip.by_name(&token.joined()).map_err(|e| e.to_string())?;
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    let mut output = File::create(&target).map_err(|e| e.to_string())?;
    io::copy(&mut member, &mut output).map_err(|e| e.to_string())?;
    Ok(target)
}
