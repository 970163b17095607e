use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::maven::FABRIC_MAVEN;

const APP_DIR_NAME: &str = "craftpath";
const SETTINGS_FILE: &str = "launcher_settings.json";

pub const VERSION_LIST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";
pub const RESOURCES_URL: &str = "https://resources.download.minecraft.net";

/// Persisted launcher preferences (`launcher_settings.json` in the base dir).
///
/// Unknown or missing keys fall back to their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LauncherSettings {
    pub java_path: Option<PathBuf>,
    pub max_memory_mb: u32,
    pub min_memory_mb: u32,
    pub username: String,
    /// Parallel asset downloads. `1` downloads strictly one at a time.
    pub download_concurrency: usize,
    pub version_list_url: String,
    pub resources_url: String,
    pub fabric_maven_url: String,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            java_path: None,
            max_memory_mb: 2048,
            min_memory_mb: 512,
            username: "Player".into(),
            download_concurrency: 8,
            version_list_url: VERSION_LIST_URL.into(),
            resources_url: RESOURCES_URL.into(),
            fabric_maven_url: FABRIC_MAVEN.into(),
        }
    }
}

impl LauncherSettings {
    /// Load settings from `base_dir`, falling back to defaults when the file
    /// is absent or unreadable.
    pub fn load(base_dir: &Path) -> Self {
        let path = base_dir.join(SETTINGS_FILE);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };

        match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(err) => {
                warn!("Ignoring unreadable settings at {:?}: {}", path, err);
                Self::default()
            }
        }
    }

    pub fn save(&self, base_dir: &Path) -> LauncherResult<PathBuf> {
        std::fs::create_dir_all(base_dir).map_err(|e| LauncherError::io(base_dir, e))?;
        let path = base_dir.join(SETTINGS_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).map_err(|e| LauncherError::io(&path, e))?;
        Ok(path)
    }

    /// Concurrency clamped to at least one download in flight.
    pub fn effective_concurrency(&self) -> usize {
        self.download_concurrency.max(1)
    }
}

/// `<data dir>/craftpath`, or `./craftpath` when the platform has no data dir.
pub fn default_base_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}
