//! Collection export: packs a scene collection and its assets into one archive.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use super::{SceneCollection, TransportOptions, DOCUMENT_MEMBER};
use crate::core::assets::FsPathFormatter;
use crate::core::device_ids::{self, Platform};
use crate::core::{paths, CoreResult};

/// Outcome of an export
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub name: String,
    pub archive: PathBuf,
    /// Asset fields rewritten to archive paths
    pub rewritten: usize,
    /// Archive members written for assets
    pub added: Vec<String>,
    /// Assets that could not be read and were left out
    pub missing: Vec<String>,
}

/// Archive written when no destination is given: `<name>.zip` in the working directory
pub fn default_archive_path(collection_name: &str) -> PathBuf {
    PathBuf::from(format!("{collection_name}.zip"))
}

/// Exports the collection `name_or_path` into `archive` (or `<name>.zip`).
pub fn export_collection(
    name_or_path: &str,
    archive: Option<&Path>,
    options: &TransportOptions,
) -> CoreResult<ExportReport> {
    let source = paths::resolve_collection(&options.scenes_dir, name_or_path)?;
    info!("Exporting scene collection from {}", source.display());

    let mut collection = SceneCollection::from_path(&source)?;
    let archive = archive
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_archive_path(&collection.name));

    collection.export_to(&archive, &options.archive_prefix)
}

impl SceneCollection {
    /// Writes this collection and every resolved asset into a new archive at `archive`.
    ///
    /// Device identifiers are written in their platform-neutral form and asset
    /// fields are rewritten to point below `prefix`. Unreadable assets are
    /// skipped with a warning. On a fatal error a partially written archive is removed.
    pub fn export_to(&mut self, archive: &Path, prefix: &str) -> CoreResult<ExportReport> {
        let translated = device_ids::translate_sources(&mut self.document, Platform::Linux);
        if translated > 0 {
            debug!("Neutralised {} device identifiers", translated);
        }

        let rewritten = self.rewrite_assets(prefix, &FsPathFormatter::new());

        let (added, missing) = self.write_archive(archive, prefix)?;

        info!(
            "Exported {:?} to {} ({} assets, {} missing)",
            self.name,
            archive.display(),
            added.len(),
            missing.len()
        );

        Ok(ExportReport {
            name: self.name.clone(),
            archive: archive.to_path_buf(),
            rewritten,
            added,
            missing,
        })
    }

    /// Creates `archive` and fills it; the file is removed again if filling fails.
    fn write_archive(&self, archive: &Path, prefix: &str) -> CoreResult<(Vec<String>, Vec<String>)> {
        let file = File::create(archive)?;
        let result = self.write_members(ZipWriter::new(BufWriter::new(file)), prefix);
        if result.is_err() {
            if let Err(e) = std::fs::remove_file(archive) {
                warn!("Failed to remove partial archive {}: {}", archive.display(), e);
            }
        }
        result
    }

    fn write_members<W: io::Write + io::Seek>(
        &self,
        mut zip: ZipWriter<W>,
        prefix: &str,
    ) -> CoreResult<(Vec<String>, Vec<String>)> {
        let options = SimpleFileOptions::default();

        zip.start_file(DOCUMENT_MEMBER, options)?;
        serde_json::to_writer(&mut zip, &self.document)?;

        let mut added = Vec::new();
        let mut missing = Vec::new();
        let mut members: HashSet<String> = HashSet::new();

        for token in self.assets.iter().filter(|t| t.is_located()) {
            let source = token.joined();
            let member = token.rebased(prefix);

            if members.contains(&member) {
                warn!(
                    "Skipping {}: archive already holds {} from another directory",
                    source, member
                );
                missing.push(source);
                continue;
            }

            // Open before starting the entry so a missing file leaves no empty member
            let (mut input, len) = match File::open(&source).and_then(|f| {
                let len = f.metadata()?.len();
                Ok((f, len))
            }) {
                Ok(opened) => opened,
                Err(e) => {
                    warn!("Skipping asset {}: {}", source, e);
                    missing.push(source);
                    continue;
                }
            };

            zip.start_file(member.as_str(), asset_options(options, len))?;
            if let Err(e) = io::copy(&mut input, &mut zip) {
                warn!("Failed to read asset {}: {}", source, e);
                zip.abort_file()?;
                missing.push(source);
                continue;
            }

            debug!("Added {} as {}", source, member);
            members.insert(member.clone());
            added.push(member);
        }

        let mut writer = zip.finish()?;
        writer.flush()?;
        Ok((added, missing))
    }
}

/// Recordings past 4 GiB need Zip64 headers.
fn asset_options(options: SimpleFileOptions, len: u64) -> SimpleFileOptions {
    options.large_file(len >= u64::from(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CoreError;
    use serde_json::{json, Value};
    use std::io::Read;
    use tempfile::tempdir;
    use zip::ZipArchive;

    fn write_collection(dir: &Path, name: &str, document: &Value) -> PathBuf {
        let path = dir.join(format!("{name}.json"));
        std::fs::write(&path, serde_json::to_vec(document).unwrap()).unwrap();
        path
    }

    fn read_member(archive: &Path, member: &str) -> String {
        let mut zip = ZipArchive::new(File::open(archive).unwrap()).unwrap();
        let mut contents = String::new();
        zip.by_name(member)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        contents
    }

    #[test]
    fn test_export_writes_document_and_assets() {
        let scenes = tempdir().unwrap();
        let media = tempdir().unwrap();
        let clip = media.path().join("clip.mp4");
        std::fs::write(&clip, "video bytes").unwrap();

        write_collection(
            scenes.path(),
            "Show",
            &json!({
                "name": "Show",
                "sources": [
                    {"id": "ffmpeg_source", "versioned_id": "ffmpeg_source",
                     "settings": {"local_file": clip.to_string_lossy()}},
                    {"id": "av_capture_input", "versioned_id": "av_capture_input", "settings": {}}
                ]
            }),
        );

        let out = tempdir().unwrap();
        let archive = out.path().join("show.zip");
        let options = TransportOptions::new(scenes.path());
        let report = export_collection("Show", Some(&archive), &options).unwrap();

        assert_eq!(report.name, "Show");
        assert_eq!(report.rewritten, 1);
        assert_eq!(report.added, vec!["assets/clip.mp4".to_string()]);
        assert!(report.missing.is_empty());

        assert_eq!(read_member(&archive, "assets/clip.mp4"), "video bytes");
        let doc: Value = serde_json::from_str(&read_member(&archive, DOCUMENT_MEMBER)).unwrap();
        assert_eq!(doc["sources"][0]["settings"]["local_file"], "assets/clip.mp4");
        assert_eq!(doc["sources"][1]["id"], "v4l2_input");
    }

    #[test]
    fn test_export_skips_missing_assets() {
        let scenes = tempdir().unwrap();
        write_collection(
            scenes.path(),
            "Gone",
            &json!({
                "name": "Gone",
                "sources": [
                    {"id": "image_source", "versioned_id": "image_source",
                     "settings": {"file": "/no/such/file.png"}}
                ]
            }),
        );

        let out = tempdir().unwrap();
        let archive = out.path().join("gone.zip");
        let report =
            export_collection("Gone", Some(&archive), &TransportOptions::new(scenes.path()))
                .unwrap();

        assert_eq!(report.rewritten, 0);
        assert!(report.added.is_empty());

        let zip = ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        let names: Vec<&str> = zip.file_names().collect();
        assert_eq!(names, vec![DOCUMENT_MEMBER]);
        let doc: Value = serde_json::from_str(&read_member(&archive, DOCUMENT_MEMBER)).unwrap();
        assert_eq!(doc["sources"][0]["settings"]["file"], "/no/such/file.png");
    }

    #[test]
    fn test_export_expands_directories() {
        let scenes = tempdir().unwrap();
        let media = tempdir().unwrap();
        let slides = media.path().join("slides");
        std::fs::create_dir_all(&slides).unwrap();
        std::fs::write(slides.join("1.png"), "one").unwrap();
        std::fs::write(slides.join("2.png"), "two").unwrap();
        std::fs::write(slides.join(".DS_Store"), "junk").unwrap();

        let path = write_collection(
            scenes.path(),
            "Slides",
            &json!({
                "name": "Slides",
                "sources": [
                    {"id": "slideshow", "versioned_id": "slideshow",
                     "settings": {"files": [{"value": slides.to_string_lossy()}]}}
                ]
            }),
        );

        let out = tempdir().unwrap();
        let archive = out.path().join("slides.zip");
        let report = export_collection(
            &path.to_string_lossy(),
            Some(&archive),
            &TransportOptions::new(out.path()),
        )
        .unwrap();

        assert_eq!(
            report.added,
            vec!["assets/slides/1.png".to_string(), "assets/slides/2.png".to_string()]
        );
        let doc: Value = serde_json::from_str(&read_member(&archive, DOCUMENT_MEMBER)).unwrap();
        assert_eq!(doc["sources"][0]["settings"]["files"][0]["value"], "assets/slides");
    }

    #[test]
    fn test_export_unknown_collection() {
        let scenes = tempdir().unwrap();
        let err = export_collection("Nope", None, &TransportOptions::new(scenes.path())).unwrap_err();
        assert!(matches!(err, CoreError::CollectionNotFound(_)));
    }

    #[test]
    fn test_export_keeps_first_of_colliding_assets() {
        let scenes = tempdir().unwrap();
        let media = tempdir().unwrap();
        for dir in ["a", "b"] {
            std::fs::create_dir_all(media.path().join(dir)).unwrap();
            std::fs::write(media.path().join(dir).join("x.png"), dir).unwrap();
        }
        let first = media.path().join("a").join("x.png");
        let second = media.path().join("b").join("x.png");

        write_collection(
            scenes.path(),
            "Twins",
            &json!({
                "name": "Twins",
                "sources": [
                    {"id": "image_source", "versioned_id": "image_source",
                     "settings": {"file": second.to_string_lossy()}},
                    {"id": "image_source", "versioned_id": "image_source",
                     "settings": {"file": first.to_string_lossy()}}
                ]
            }),
        );

        let out = tempdir().unwrap();
        let archive = out.path().join("twins.zip");
        let report =
            export_collection("Twins", Some(&archive), &TransportOptions::new(scenes.path()))
                .unwrap();

        assert_eq!(report.added, vec!["assets/x.png".to_string()]);
        assert_eq!(report.missing, vec![second.to_string_lossy().to_string()]);
        assert_eq!(read_member(&archive, "assets/x.png"), "a");
    }

    #[test]
    fn test_export_large_asset_uses_zip64() {
        let scenes = tempdir().unwrap();
        let media = tempdir().unwrap();
        let recording = media.path().join("recording.mkv");
        let len = (4u64 << 30) + 4096;
        // Sparse, so the test does not need 4 GiB of disk
        File::create(&recording).unwrap().set_len(len).unwrap();

        write_collection(
            scenes.path(),
            "Long",
            &json!({
                "name": "Long",
                "sources": [
                    {"id": "ffmpeg_source", "versioned_id": "ffmpeg_source",
                     "settings": {"local_file": recording.to_string_lossy()}}
                ]
            }),
        );

        let out = tempdir().unwrap();
        let archive = out.path().join("long.zip");
        let report =
            export_collection("Long", Some(&archive), &TransportOptions::new(scenes.path()))
                .unwrap();

        assert_eq!(report.added, vec!["assets/recording.mkv".to_string()]);
        assert!(report.missing.is_empty());
        let mut zip = ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        assert_eq!(zip.by_name("assets/recording.mkv").unwrap().size(), len);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_create_keeps_existing_archive() {
        use std::os::unix::fs::PermissionsExt;

        let scenes = tempdir().unwrap();
        write_collection(scenes.path(), "Show", &json!({"name": "Show", "sources": []}));

        let out = tempdir().unwrap();
        let archive = out.path().join("show.zip");
        std::fs::write(&archive, "previous export").unwrap();
        std::fs::set_permissions(&archive, std::fs::Permissions::from_mode(0o444)).unwrap();
        if std::fs::OpenOptions::new().write(true).open(&archive).is_ok() {
            // Running with privileges that ignore file modes
            return;
        }

        let result = export_collection("Show", Some(&archive), &TransportOptions::new(scenes.path()));
        assert!(matches!(result, Err(CoreError::IoError(_))));
        assert_eq!(std::fs::read_to_string(&archive).unwrap(), "previous export");
    }

    #[test]
    fn test_default_archive_path() {
        assert_eq!(default_archive_path("Show"), PathBuf::from("Show.zip"));
    }
}
