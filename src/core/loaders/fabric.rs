use std::path::{Path, PathBuf};

use futures_util::stream::{self, StreamExt};
use tracing::info;

use crate::core::downloader::{DownloadOutcome, Downloader};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::layout::{is_single_component, GameLayout};
use crate::core::platform::Platform;
use crate::core::sink::LogSink;
use crate::core::version::{LocalVersion, ManifestKind, ResolvedArtifact, VersionManifest};

/// Makes sure the libraries a loader manifest adds on top of its base
/// version are present under `libraries/`.
pub struct LoaderLibraries<'a> {
    downloader: &'a Downloader,
    layout: &'a GameLayout,
    platform: Platform,
    default_repo: &'a str,
}

impl<'a> LoaderLibraries<'a> {
    pub fn new(
        downloader: &'a Downloader,
        layout: &'a GameLayout,
        platform: Platform,
        default_repo: &'a str,
    ) -> Self {
        Self {
            downloader,
            layout,
            platform,
            default_repo,
        }
    }

    /// Allowed loader libraries in manifest order.
    pub fn resolve(&self, manifest: &VersionManifest) -> LauncherResult<Vec<ResolvedArtifact>> {
        let mut artifacts = Vec::new();
        for lib in &manifest.libraries {
            if !self.platform.is_library_allowed(lib) {
                continue;
            }
            if let Some(artifact) = lib.artifact(self.default_repo)? {
                artifacts.push(artifact);
            }
        }
        Ok(artifacts)
    }

    /// Download missing loader libraries, returning how many were fetched.
    pub async fn ensure(&self, manifest: &VersionManifest, sink: &dyn LogSink) -> LauncherResult<usize> {
        let artifacts = self.resolve(manifest)?;
        let libs_dir = self.layout.libraries_dir();
        let total = artifacts.len();

        let results = stream::iter(artifacts)
            .map(|artifact| {
                let dest = artifact.local_path(&libs_dir);
                async move {
                    self.downloader
                        .ensure_file(&artifact.url, &dest, artifact.sha1.as_deref())
                        .await
                }
            })
            .buffer_unordered(self.downloader.concurrency())
            .collect::<Vec<_>>()
            .await;

        let mut fetched = 0;
        for result in results {
            if result? == DownloadOutcome::Fetched {
                fetched += 1;
            }
        }

        sink.info(&format!("Loader libraries: {total} required, {fetched} downloaded"));
        Ok(fetched)
    }
}

/// Install a pre-fetched loader profile as `versions/<id>/<id>.json`.
///
/// The profile must name a main class and a base version. Its own `id`
/// wins over the file name.
pub async fn import_profile(layout: &GameLayout, source: &Path) -> LauncherResult<LocalVersion> {
    let raw = tokio::fs::read_to_string(source)
        .await
        .map_err(|e| LauncherError::io(source, e))?;
    let manifest: VersionManifest = serde_json::from_str(&raw)?;

    let id = manifest
        .id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .or_else(|| file_stem(source))
        .ok_or_else(|| LauncherError::InvalidProfile(format!("cannot name profile {}", source.display())))?;

    if !is_single_component(&id) {
        return Err(LauncherError::UnsafePath(id));
    }
    if manifest.main_class.trim().is_empty() {
        return Err(LauncherError::InvalidProfile(format!("{id} has no mainClass")));
    }
    if manifest.kind() == ManifestKind::Standalone {
        return Err(LauncherError::InvalidProfile(format!(
            "{id} does not inherit from a base version"
        )));
    }

    LocalVersion::save_raw(layout, &id, &raw).await?;
    info!("Imported loader profile {} from {:?}", id, source);
    LocalVersion::parse(&id, &raw)
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
}

/// Absolute paths of the loader libraries, in manifest order.
pub fn loader_classpath(
    manifest: &VersionManifest,
    platform: &Platform,
    libraries_dir: &Path,
    default_repo: &str,
) -> LauncherResult<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for lib in &manifest.libraries {
        if !platform.is_library_allowed(lib) {
            continue;
        }
        if let Some(artifact) = lib.artifact(default_repo)? {
            entries.push(artifact.local_path(libraries_dir));
        }
    }
    Ok(entries)
}
