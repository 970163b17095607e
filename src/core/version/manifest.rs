// ─── Version Manifest ───
// Per-version descriptor: downloads, libraries, asset index and launch
// arguments. Loader manifests use the same shape plus `inheritsFrom`.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::layout::{is_single_component, GameLayout};
use crate::core::maven::MavenArtifact;
use crate::core::platform::{Platform, Rule};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionManifest {
    #[serde(default)]
    pub id: Option<String>,
    pub main_class: String,
    #[serde(default)]
    pub inherits_from: Option<String>,
    #[serde(default)]
    pub asset_index: Option<AssetIndexInfo>,
    #[serde(default)]
    pub downloads: Option<VersionDownloads>,
    #[serde(default)]
    pub libraries: Vec<Library>,
    #[serde(default)]
    pub arguments: Option<Arguments>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetIndexInfo {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VersionDownloads {
    #[serde(default)]
    pub client: Option<ClientDownload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientDownload {
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Arguments {
    #[serde(default)]
    pub game: Vec<serde_json::Value>,
    #[serde(default)]
    pub jvm: Vec<serde_json::Value>,
}

// ─── Libraries ───

/// One library entry.
///
/// Official manifests describe files under `downloads`; loader manifests
/// only carry a Maven `name` and a repository `url`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Library {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    #[serde(default)]
    pub rules: Option<Vec<Rule>>,
    /// Legacy OS → classifier key map, e.g. `{"windows": "natives-windows-${arch}"}`.
    #[serde(default)]
    pub natives: Option<HashMap<String, String>>,
    #[serde(default)]
    pub extract: Option<ExtractRules>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default)]
    pub artifact: Option<LibraryArtifact>,
    #[serde(default)]
    pub classifiers: Option<BTreeMap<String, LibraryArtifact>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryArtifact {
    #[serde(default)]
    pub path: Option<String>,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractRules {
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// A downloadable library file with its repository-relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub url: String,
    /// Forward-slash path relative to `libraries/`.
    pub path: String,
    pub sha1: Option<String>,
}

impl ResolvedArtifact {
    pub fn local_path(&self, libraries_dir: &Path) -> PathBuf {
        self.path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(libraries_dir.to_path_buf(), |acc, segment| acc.join(segment))
    }
}

impl Library {
    /// The generic (non-native) file of this library, if it has one.
    ///
    /// `default_repo` is used for loader-style entries without a `url`.
    pub fn artifact(&self, default_repo: &str) -> LauncherResult<Option<ResolvedArtifact>> {
        match &self.downloads {
            Some(downloads) => match &downloads.artifact {
                Some(artifact) => Ok(Some(ResolvedArtifact {
                    url: artifact.url.clone(),
                    path: self.artifact_path(artifact)?,
                    sha1: artifact.sha1.clone(),
                })),
                None => Ok(None),
            },
            None => {
                let Some(name) = &self.name else {
                    return Ok(None);
                };
                let coordinate = MavenArtifact::parse(name)?;
                let repo = self.url.as_deref().unwrap_or(default_repo);
                Ok(Some(ResolvedArtifact {
                    url: coordinate.url(repo),
                    path: checked_library_path(coordinate.relative_path())?,
                    sha1: self.sha1.clone(),
                }))
            }
        }
    }

    /// Every classifier archive the manifest lists, keyed by classifier.
    pub fn classifier_artifacts(&self) -> LauncherResult<Vec<(String, ResolvedArtifact)>> {
        let Some(classifiers) = self
            .downloads
            .as_ref()
            .and_then(|d| d.classifiers.as_ref())
        else {
            return Ok(Vec::new());
        };

        classifiers
            .iter()
            .map(|(key, artifact)| {
                Ok((
                    key.clone(),
                    ResolvedArtifact {
                        url: artifact.url.clone(),
                        path: self.classifier_path(key, artifact)?,
                        sha1: artifact.sha1.clone(),
                    },
                ))
            })
            .collect()
    }

    /// Classifier key naming this library's native archive on `platform`.
    ///
    /// A legacy `natives` map wins when present; otherwise the platform's
    /// own classifier token is used.
    pub fn native_classifier(&self, platform: &Platform) -> Option<String> {
        match &self.natives {
            Some(map) => map
                .get(platform.os.manifest_name())
                .map(|key| key.replace("${arch}", platform.arch_bits())),
            None => platform.native_classifier().map(str::to_string),
        }
    }

    /// The native archive for `platform`, if this library ships one.
    pub fn native_artifact(&self, platform: &Platform) -> LauncherResult<Option<ResolvedArtifact>> {
        let Some(key) = self.native_classifier(platform) else {
            return Ok(None);
        };
        Ok(self
            .classifier_artifacts()?
            .into_iter()
            .find(|(classifier, _)| *classifier == key)
            .map(|(_, artifact)| artifact))
    }

    pub fn extract_excludes(&self) -> &[String] {
        self.extract
            .as_ref()
            .map(|e| e.exclude.as_slice())
            .unwrap_or_default()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed library>")
    }

    fn artifact_path(&self, artifact: &LibraryArtifact) -> LauncherResult<String> {
        match (&artifact.path, &self.name) {
            (Some(path), _) => checked_library_path(path.clone()),
            (None, Some(name)) => checked_library_path(MavenArtifact::parse(name)?.relative_path()),
            (None, None) => Err(LauncherError::InvalidCoordinate(artifact.url.clone())),
        }
    }

    fn classifier_path(&self, key: &str, artifact: &LibraryArtifact) -> LauncherResult<String> {
        match (&artifact.path, &self.name) {
            (Some(path), _) => checked_library_path(path.clone()),
            (None, Some(name)) => {
                let mut coordinate = MavenArtifact::parse(name)?;
                coordinate.classifier = Some(key.to_string());
                checked_library_path(coordinate.relative_path())
            }
            (None, None) => Err(LauncherError::InvalidCoordinate(artifact.url.clone())),
        }
    }
}

/// Library paths come from third-party JSON; each segment must stay inside
/// `libraries/`.
fn checked_library_path(path: String) -> LauncherResult<String> {
    let relative = !path.starts_with('/') && !path.starts_with('\\');
    let segments_ok = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .all(is_single_component);
    if relative && segments_ok {
        Ok(path)
    } else {
        Err(LauncherError::UnsafePath(path))
    }
}

// ─── Arguments ───

impl Arguments {
    pub fn game_args(&self, platform: &Platform) -> Vec<String> {
        self.game
            .iter()
            .flat_map(|value| argument_values(value, platform))
            .collect()
    }

    pub fn jvm_args(&self, platform: &Platform) -> Vec<String> {
        self.jvm
            .iter()
            .flat_map(|value| argument_values(value, platform))
            .collect()
    }
}

/// Plain strings pass through; `{rules, value}` objects contribute their
/// value only when the rules allow the platform. Rules gated on launcher
/// features never match since no feature is enabled.
fn argument_values(value: &serde_json::Value, platform: &Platform) -> Vec<String> {
    if let Some(arg) = value.as_str() {
        return vec![arg.to_string()];
    }

    let Some(obj) = value.as_object() else {
        return vec![];
    };

    if let Some(rules) = obj.get("rules").and_then(|r| r.as_array()) {
        if rules.iter().any(|rule| rule.get("features").is_some()) {
            return vec![];
        }
        let parsed: Vec<Rule> = match serde_json::from_value(serde_json::Value::Array(rules.clone())) {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!("Skipping argument with unreadable rules: {}", err);
                return vec![];
            }
        };
        if !platform.rules_allow(Some(&parsed)) {
            return vec![];
        }
    }

    match obj.get("value") {
        Some(serde_json::Value::String(s)) => vec![s.clone()],
        Some(serde_json::Value::Array(arr)) => arr
            .iter()
            .filter_map(|v| v.as_str().map(ToString::to_string))
            .collect(),
        _ => vec![],
    }
}

// ─── Inheritance ───

/// How a manifest relates to other versions, decided once at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestKind {
    /// Carries its own client jar, libraries and assets.
    Standalone,
    /// Loader manifest layered over an already installed base version.
    Inherits { base: String },
}

impl VersionManifest {
    pub fn kind(&self) -> ManifestKind {
        match self.inherits_from.as_deref().map(str::trim) {
            Some(base) if !base.is_empty() => ManifestKind::Inherits {
                base: base.to_string(),
            },
            _ => ManifestKind::Standalone,
        }
    }
}

/// A manifest read from `versions/<id>/<id>.json`.
#[derive(Debug, Clone)]
pub struct LocalVersion {
    pub id: String,
    pub manifest: VersionManifest,
    pub kind: ManifestKind,
}

impl LocalVersion {
    pub fn parse(id: &str, raw: &str) -> LauncherResult<Self> {
        let manifest: VersionManifest = serde_json::from_str(raw)?;
        let kind = manifest.kind();
        Ok(Self {
            id: id.to_string(),
            manifest,
            kind,
        })
    }

    pub fn is_installed(layout: &GameLayout, id: &str) -> bool {
        layout.version_json(id).is_file()
    }

    /// Read an on-disk manifest; absence is [`LauncherError::MissingManifest`].
    pub async fn load(layout: &GameLayout, id: &str) -> LauncherResult<Self> {
        let path = layout.version_json(id);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LauncherError::MissingManifest {
                    version: id.to_string(),
                    path,
                })
            }
            Err(e) => return Err(LauncherError::io(path, e)),
        };
        Self::parse(id, &raw)
    }

    /// Store the manifest exactly as served.
    pub async fn save_raw(layout: &GameLayout, id: &str, raw: &str) -> LauncherResult<()> {
        let dir = layout.version_dir(id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| LauncherError::io(&dir, e))?;
        let path = layout.version_json(id);
        tokio::fs::write(&path, raw)
            .await
            .map_err(|e| LauncherError::io(&path, e))
    }

    pub fn asset_index_id(&self) -> Option<&str> {
        self.manifest.asset_index.as_ref().map(|a| a.id.as_str())
    }
}
