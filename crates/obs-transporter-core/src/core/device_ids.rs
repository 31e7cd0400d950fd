//! Device Identifier Translation
//!
//! OBS Studio names its camera, screen capture and text plugins differently on
//! each operating system. Archives carry the Linux ("neutral") identifiers;
//! importing maps them to the identifiers of the host platform.
//!
//! A single table backs both directions.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Operating systems OBS Studio runs on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Platform {
    /// Baseline platform; its identifiers are the neutral ones
    Linux,
    MacOs,
    Windows,
}

impl Platform {
    /// Platform this binary was built for
    pub fn host() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    /// Returns true for the platform whose identifiers are used as the neutral set
    pub fn is_neutral(self) -> bool {
        self == Platform::Linux
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Platform::Linux => "Linux",
            Platform::MacOs => "macOS",
            Platform::Windows => "Windows",
        })
    }
}

/// One row of the translation table
#[derive(Debug, Clone, Copy)]
pub struct DeviceIdMapping {
    pub platform: Platform,
    pub neutral: &'static str,
    pub native: &'static str,
}

const fn row(platform: Platform, neutral: &'static str, native: &'static str) -> DeviceIdMapping {
    DeviceIdMapping {
        platform,
        neutral,
        native,
    }
}

/// Neutral-to-native identifier table for every non-neutral platform
pub const DEVICE_ID_MAPPINGS: &[DeviceIdMapping] = &[
    row(Platform::MacOs, "v4l2_input", "av_capture_input"),
    row(Platform::MacOs, "xshm_input", "display_capture"),
    row(Platform::Windows, "v4l2_input", "dshow_input"),
    row(Platform::Windows, "xshm_input", "monitor_capture"),
    row(Platform::Windows, "text_ft2_source", "text_gdiplus"),
    row(Platform::Windows, "text_ft2_source_v2", "text_gdiplus_v2"),
];

/// Maps a platform-specific identifier back to its neutral form; unknown ids pass through.
pub fn to_neutral(id: &str) -> &str {
    DEVICE_ID_MAPPINGS
        .iter()
        .find(|m| m.native == id)
        .map_or(id, |m| m.neutral)
}

/// Maps a neutral identifier to the identifier used on `platform`; unknown ids pass through.
pub fn to_platform(id: &str, platform: Platform) -> &str {
    if platform.is_neutral() {
        return id;
    }
    DEVICE_ID_MAPPINGS
        .iter()
        .find(|m| m.platform == platform && m.neutral == id)
        .map_or(id, |m| m.native)
}

/// Maps an identifier from whichever platform it belongs to onto `platform`.
pub fn translate(id: &str, platform: Platform) -> &str {
    to_platform(to_neutral(id), platform)
}

/// Rewrites the `id` and `versioned_id` fields of one source for `platform`.
///
/// Each field is translated on its own, so a plugin that only renamed one of
/// the two is still handled. Returns true if anything changed.
pub fn translate_source(source: &mut Value, platform: Platform) -> bool {
    let Some(map) = source.as_object_mut() else {
        return false;
    };

    let mut changed = false;
    for key in ["id", "versioned_id"] {
        let Some(current) = map.get(key).and_then(Value::as_str) else {
            continue;
        };
        let mapped = translate(current, platform);
        if mapped != current {
            tracing::debug!(field = key, from = current, to = mapped, %platform, "Translated source id");
            let mapped = mapped.to_string();
            map.insert(key.to_string(), Value::String(mapped));
            changed = true;
        }
    }
    changed
}

/// Translates every entry of the document's `sources` sequence; returns the number of changed sources.
pub fn translate_sources(document: &mut Value, platform: Platform) -> usize {
    match document.get_mut("sources").and_then(Value::as_array_mut) {
        Some(sources) => sources
            .iter_mut()
            .map(|source| translate_source(source, platform))
            .filter(|changed| *changed)
            .count(),
        None => 0,
    }
}
