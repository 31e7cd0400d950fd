//! Settings Persistence System
//!
//! Provides persistent transporter settings with:
//! - Atomic file writes (temp file + rename)
//! - Schema validation with defaults
//! - Migration support for schema changes
//!
//! Storage location: {config_dir}/obs-scene-transporter/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::core::assets::DEFAULT_ARCHIVE_PREFIX;
use crate::core::{CoreError, CoreResult};

/// Settings schema version for migration support
pub const SETTINGS_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// Lock file name (advisory lock to prevent concurrent writers)
pub const SETTINGS_LOCK_FILE: &str = "settings.json.lock";

/// Directory name below the user configuration directory
pub const SETTINGS_DIR_NAME: &str = "obs-scene-transporter";

/// Transporter settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransporterSettings {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: u32,

    /// Scene collection store; platform default when unset
    #[serde(default)]
    pub scenes_dir: Option<PathBuf>,

    /// Root for imported assets; `<Documents>/OBS/Scene-Assets` when unset
    #[serde(default)]
    pub asset_root: Option<PathBuf>,

    /// Archive directory holding assets
    #[serde(default = "default_archive_prefix")]
    pub archive_prefix: String,

    /// Pretty-print installed scene collections
    #[serde(default)]
    pub pretty_json: bool,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

fn default_archive_prefix() -> String {
    DEFAULT_ARCHIVE_PREFIX.to_string()
}

impl Default for TransporterSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            scenes_dir: None,
            asset_root: None,
            archive_prefix: default_archive_prefix(),
            pretty_json: false,
        }
    }
}

impl TransporterSettings {
    /// Normalizes settings so persisted state is always valid.
    ///
    /// This is intentionally tolerant: it corrects bad values instead of failing.
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;

        let prefix = self.archive_prefix.trim().trim_matches('/');
        if prefix.is_empty() || prefix.contains(['/', '\\']) || prefix == ".." {
            warn!(
                "Invalid archive prefix {:?}, using {:?}",
                self.archive_prefix, DEFAULT_ARCHIVE_PREFIX
            );
            self.archive_prefix = default_archive_prefix();
        } else {
            self.archive_prefix = prefix.to_string();
        }

        if self
            .scenes_dir
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            self.scenes_dir = None;
        }
        if self
            .asset_root
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            self.asset_root = None;
        }
    }
}

/// Keys accepted by [`TransporterSettings::set`], as they appear in the settings file
pub const SETTINGS_KEYS: &[&str] = &["scenesDir", "assetRoot", "archivePrefix", "prettyJson"];

impl TransporterSettings {
    /// Sets one value by its settings-file key. An empty value clears a directory
    /// override back to the platform default.
    pub fn set(&mut self, key: &str, value: &str) -> CoreResult<()> {
        let dir = |value: &str| (!value.trim().is_empty()).then(|| PathBuf::from(value));
        match key {
            "scenesDir" => self.scenes_dir = dir(value),
            "assetRoot" => self.asset_root = dir(value),
            "archivePrefix" => self.archive_prefix = value.to_string(),
            "prettyJson" => {
                self.pretty_json = value.trim().parse().map_err(|_| {
                    CoreError::Settings(format!("prettyJson must be true or false, got {value:?}"))
                })?
            }
            _ => {
                return Err(CoreError::Settings(format!(
                    "Unknown setting {key:?}; expected one of {}",
                    SETTINGS_KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }
}

/// Default directory holding the settings file
pub fn default_settings_dir() -> CoreResult<PathBuf> {
    dirs::config_dir()
        .map(|p| p.join(SETTINGS_DIR_NAME))
        .ok_or(CoreError::DirectoryUnavailable("configuration"))
}

/// Settings manager for loading, saving, and resetting settings
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    /// Create a new settings manager with the given settings directory
    pub fn new(settings_dir: PathBuf) -> Self {
        Self {
            settings_path: settings_dir.join(SETTINGS_FILE),
        }
    }

    /// Settings manager for the per-user default location
    pub fn for_current_user() -> CoreResult<Self> {
        Ok(Self::new(default_settings_dir()?))
    }

    fn lock_path(&self) -> PathBuf {
        self.settings_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(SETTINGS_LOCK_FILE)
    }

    fn with_lock<T>(
        &self,
        exclusive: bool,
        op: impl FnOnce() -> CoreResult<T>,
    ) -> CoreResult<T> {
        // Ensure parent directory exists so the lock file can be created.
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?;

        if exclusive {
            fs2::FileExt::lock_exclusive(&lock_file)
                .map_err(|e| CoreError::Settings(format!("Failed to lock settings file: {e}")))?;
        } else {
            fs2::FileExt::lock_shared(&lock_file)
                .map_err(|e| CoreError::Settings(format!("Failed to lock settings file: {e}")))?;
        }

        let result = op();

        if let Err(e) = fs2::FileExt::unlock(&lock_file) {
            warn!("Failed to unlock settings lock file: {}", e);
        }

        result
    }

    /// Get the settings file path
    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Load settings from disk, returning defaults if the file is missing or unreadable
    pub fn load(&self) -> TransporterSettings {
        if !self.settings_path.exists() {
            return TransporterSettings::default();
        }

        let result = self.with_lock(false, || {
            let content = fs::read_to_string(&self.settings_path)?;
            let mut settings = serde_json::from_str::<TransporterSettings>(&content)?;

            if settings.version < SETTINGS_VERSION {
                info!(
                    "Migrating settings from version {} to {}",
                    settings.version, SETTINGS_VERSION
                );
                settings = self.migrate(settings);
            }

            settings.normalize();
            Ok(settings)
        });

        match result {
            Ok(settings) => settings,
            Err(e) => {
                warn!(
                    "Failed to load settings from {}, using defaults: {}",
                    self.settings_path.display(),
                    e
                );
                TransporterSettings::default()
            }
        }
    }

    /// Save settings to disk using atomic write (temp file + rename)
    pub fn save(&self, settings: &TransporterSettings) -> CoreResult<TransporterSettings> {
        self.with_lock(true, || {
            let mut normalized = settings.clone();
            normalized.normalize();

            crate::core::fs::atomic_write_json(&self.settings_path, &normalized, true)?;

            info!("Settings saved to {:?}", self.settings_path);
            Ok(normalized)
        })
    }

    /// Reset settings to defaults and delete the settings file
    pub fn reset(&self) -> CoreResult<TransporterSettings> {
        self.with_lock(true, || {
            if self.settings_path.exists() {
                fs::remove_file(&self.settings_path)?;
                info!("Settings file deleted");
            }
            Ok(TransporterSettings::default())
        })
    }

    /// Migrate settings from older version
    fn migrate(&self, mut settings: TransporterSettings) -> TransporterSettings {
        settings.version = SETTINGS_VERSION;
        settings
    }
}
