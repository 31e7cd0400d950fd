//! Export → import scenarios across the whole core.

use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};

use crate::core::collection::{export_collection, import_collection, TransportOptions};
use crate::core::device_ids::Platform;

const FIXTURE_HOME: &str = "/Users/dev";

/// The TransportTest fixture with its home directory moved below a scratch
/// directory, and the referenced media created there.
struct Workspace {
    root: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let root = tempdir().unwrap();
        let home = root.path().join("home");

        let fixture = std::fs::read_to_string(
            Path::new(env!("CARGO_MANIFEST_DIR"))
                .join("tests")
                .join("fixtures")
                .join("TransportTest-mac.json"),
        )
        .unwrap();
        let document = fixture.replace(FIXTURE_HOME, &home.to_string_lossy());

        for (file, contents) in [
            ("Documents/DevDay/Screens/broadcast_test_pattern_1920X1080.jpg", "jpg"),
            ("Downloads/OBS-TransportTest/Rotating_earth.mp4", "earth"),
            ("Downloads/OBS-TransportTest/.DS_Store", "junk"),
            ("Pictures/DevDay-Slides/slide1.png", "slide1"),
            ("Pictures/DevDay-Slides/slide2.png", "slide2"),
        ] {
            let path = home.join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, contents).unwrap();
        }

        let scenes = root.path().join("scenes");
        std::fs::create_dir_all(&scenes).unwrap();
        std::fs::write(scenes.join("TransportTest.json"), document).unwrap();

        Self { root }
    }

    fn export_options(&self) -> TransportOptions {
        TransportOptions::new(self.root.path().join("scenes"))
    }

    fn archive(&self) -> PathBuf {
        self.root.path().join("TransportTest.zip")
    }

    /// Options for a second machine with its own scene store
    fn import_options(&self, platform: Platform) -> TransportOptions {
        TransportOptions::new(self.root.path().join("other-scenes"))
            .with_asset_root(self.root.path().join("Scene-Assets"))
            .with_platform(platform)
    }
}

fn read_json(path: &Path) -> Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

fn source<'a>(document: &'a Value, name: &str) -> &'a Value {
    document["sources"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["name"] == name)
        .unwrap()
}

#[test]
fn test_fixture_round_trip() {
    let ws = Workspace::new();
    let export = export_collection("TransportTest", Some(&ws.archive()), &ws.export_options()).unwrap();
    assert!(export.missing.is_empty());
    assert_eq!(
        export.added,
        vec![
            "assets/broadcast_test_pattern_1920X1080.jpg".to_string(),
            "assets/OBS-TransportTest/Rotating_earth.mp4".to_string(),
            "assets/Rotating_earth.mp4".to_string(),
            "assets/DevDay-Slides/slide1.png".to_string(),
            "assets/DevDay-Slides/slide2.png".to_string(),
        ]
    );

    let dest = ws.root.path().join("D");
    let import = import_collection(
        &ws.archive(),
        None,
        Some(&dest),
        &ws.import_options(Platform::MacOs),
    )
    .unwrap();
    assert!(import.skipped.is_empty());
    assert_eq!(import.extracted.len(), 5);

    let d = dest.to_string_lossy();
    let installed = read_json(&import.collection_file);
    assert_eq!(installed["name"], "TransportTest");
    assert_eq!(
        source(&installed, "Earth")["settings"]["local_file"],
        format!("{d}/Rotating_earth.mp4").as_str()
    );
    assert_eq!(
        installed["transitions"][0]["settings"]["path"],
        format!("{d}/Rotating_earth.mp4").as_str()
    );
    assert_eq!(
        source(&installed, "Playlist")["settings"]["playlist"][0]["value"],
        format!("{d}/OBS-TransportTest").as_str()
    );
    assert_eq!(
        source(&installed, "Slides")["settings"]["files"][0]["value"],
        format!("{d}/DevDay-Slides").as_str()
    );
    assert_eq!(source(&installed, "Camera")["id"], "av_capture_input");

    assert_eq!(
        std::fs::read_to_string(dest.join("Rotating_earth.mp4")).unwrap(),
        "earth"
    );
    assert!(dest.join("OBS-TransportTest").join("Rotating_earth.mp4").is_file());
    assert!(!dest.join("OBS-TransportTest").join(".DS_Store").exists());
    assert!(dest.join("DevDay-Slides").join("slide2.png").is_file());
}

#[test]
fn test_round_trip_to_windows_translates_devices() {
    let ws = Workspace::new();
    export_collection("TransportTest", Some(&ws.archive()), &ws.export_options()).unwrap();

    let import = import_collection(
        &ws.archive(),
        Some("TransportTest-win"),
        None,
        &ws.import_options(Platform::Windows),
    )
    .unwrap();

    let installed = read_json(&import.collection_file);
    let camera = source(&installed, "Camera");
    assert_eq!(camera["id"], "dshow_input");
    assert_eq!(camera["versioned_id"], "dshow_input");
    assert_eq!(
        import.asset_dir,
        ws.root.path().join("Scene-Assets").join("TransportTest-win")
    );
    assert!(import.asset_dir.join("Rotating_earth.mp4").is_file());
}

#[test]
fn test_minimal_round_trip() {
    let root = tempdir().unwrap();
    let media = root.path().join("Downloads").join("OBS-TransportTest");
    std::fs::create_dir_all(&media).unwrap();
    let clip = media.join("Rotating_earth.mp4");
    std::fs::write(&clip, "earth").unwrap();
    let clip = clip.to_string_lossy().to_string();

    let scenes = root.path().join("scenes");
    std::fs::create_dir_all(&scenes).unwrap();
    let document = json!({
        "name": "TransportTest",
        "sources": [
            {"id": "ffmpeg_source", "versioned_id": "ffmpeg_source", "name": "Earth",
             "settings": {"local_file": clip}}
        ],
        "transitions": [
            {"id": "obs_stinger_transition", "name": "Stinger", "settings": {"path": clip}}
        ]
    });
    std::fs::write(scenes.join("TransportTest.json"), document.to_string()).unwrap();

    let archive = root.path().join("out.zip");
    export_collection("TransportTest", Some(&archive), &TransportOptions::new(&scenes)).unwrap();

    let dest = root.path().join("fresh");
    let import = import_collection(
        &archive,
        None,
        Some(&dest),
        &TransportOptions::new(root.path().join("installed")),
    )
    .unwrap();

    let expected = format!("{}/Rotating_earth.mp4", dest.to_string_lossy());
    let installed = read_json(&import.collection_file);
    assert_eq!(installed["sources"][0]["settings"]["local_file"], expected.as_str());
    assert_eq!(installed["transitions"][0]["settings"]["path"], expected.as_str());
    assert_eq!(import.extracted, vec![dest.join("Rotating_earth.mp4")]);
}
