// ─── Artifact Fetcher ───
// Materializes everything a standalone manifest needs: client jar,
// allowed libraries with all their classifier archives, the persisted
// library list and the assets.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::core::assets::AssetManager;
use crate::core::downloader::{DownloadOutcome, Downloader};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::layout::GameLayout;
use crate::core::platform::Platform;
use crate::core::sink::LogSink;
use crate::core::version::{LocalVersion, VersionManifest, VersionSummary};

pub struct ArtifactFetcher<'a> {
    downloader: &'a Downloader,
    layout: &'a GameLayout,
    platform: Platform,
    resources_url: &'a str,
    default_repo: &'a str,
}

impl<'a> ArtifactFetcher<'a> {
    pub fn new(
        downloader: &'a Downloader,
        layout: &'a GameLayout,
        platform: Platform,
        resources_url: &'a str,
        default_repo: &'a str,
    ) -> Self {
        Self {
            downloader,
            layout,
            platform,
            resources_url,
            default_repo,
        }
    }

    /// Fetch and parse a manifest, returning it with the raw JSON.
    pub async fn fetch_manifest(&self, url: &str) -> LauncherResult<(VersionManifest, String)> {
        let raw = self.downloader.fetch_text(url).await?;
        let manifest: VersionManifest = serde_json::from_str(&raw)?;
        Ok((manifest, raw))
    }

    /// Fetch a listed version's manifest and persist it verbatim.
    pub async fn install_manifest(
        &self,
        summary: &VersionSummary,
        sink: &dyn LogSink,
    ) -> LauncherResult<LocalVersion> {
        sink.info(&format!("Fetching manifest for {}", summary.id));
        let (_, raw) = self.fetch_manifest(&summary.url).await?;
        LocalVersion::save_raw(self.layout, &summary.id, &raw).await?;
        LocalVersion::parse(&summary.id, &raw)
    }

    /// Download client jar, libraries and assets for `version_id`.
    ///
    /// Returns the library classpath (main jar excluded), which is also
    /// written to `libraries_<id>.txt`.
    pub async fn download_all(
        &self,
        manifest: &VersionManifest,
        version_id: &str,
        sink: &dyn LogSink,
    ) -> LauncherResult<Vec<PathBuf>> {
        self.download_client(manifest, version_id, sink).await?;

        let classpath = self.download_libraries(manifest, sink).await?;
        self.write_libraries_file(version_id, &classpath).await?;

        match &manifest.asset_index {
            Some(index) => {
                AssetManager::new(self.downloader, self.layout, self.resources_url)
                    .download_assets(index, sink)
                    .await?;
            }
            None => sink.warn(&format!("{version_id} declares no asset index")),
        }

        info!("Version {} materialized", version_id);
        Ok(classpath)
    }

    async fn download_client(
        &self,
        manifest: &VersionManifest,
        version_id: &str,
        sink: &dyn LogSink,
    ) -> LauncherResult<()> {
        let Some(client) = manifest.downloads.as_ref().and_then(|d| d.client.as_ref()) else {
            sink.warn(&format!("{version_id} declares no client download"));
            return Ok(());
        };

        let jar = self.layout.version_jar(version_id);
        let outcome = self
            .downloader
            .ensure_file(&client.url, &jar, client.sha1.as_deref())
            .await?;
        if outcome == DownloadOutcome::Fetched {
            sink.info(&format!("Downloaded {version_id}.jar"));
        }
        Ok(())
    }

    /// Download every allowed library.
    ///
    /// All classifier archives are fetched so switching platforms needs no
    /// refetch, but only the current platform's native joins the classpath.
    async fn download_libraries(
        &self,
        manifest: &VersionManifest,
        sink: &dyn LogSink,
    ) -> LauncherResult<Vec<PathBuf>> {
        let libs_dir = self.layout.libraries_dir();
        let mut classpath = Vec::new();
        let mut fetched = 0usize;
        let mut allowed = 0usize;

        for lib in &manifest.libraries {
            if !self.platform.is_library_allowed(lib) {
                debug!("Skipping library (OS rule): {}", lib.display_name());
                continue;
            }
            allowed += 1;

            if let Some(artifact) = lib.artifact(self.default_repo)? {
                let dest = artifact.local_path(&libs_dir);
                if self
                    .downloader
                    .ensure_file(&artifact.url, &dest, artifact.sha1.as_deref())
                    .await?
                    == DownloadOutcome::Fetched
                {
                    fetched += 1;
                }
                classpath.push(dest);
            }

            let native_key = lib.native_classifier(&self.platform);
            for (key, artifact) in lib.classifier_artifacts()? {
                let dest = artifact.local_path(&libs_dir);
                if self
                    .downloader
                    .ensure_file(&artifact.url, &dest, artifact.sha1.as_deref())
                    .await?
                    == DownloadOutcome::Fetched
                {
                    fetched += 1;
                }
                if native_key.as_deref() == Some(key.as_str()) {
                    classpath.push(dest);
                }
            }
        }

        sink.info(&format!(
            "Libraries: {} of {} allowed, {} downloaded",
            allowed,
            manifest.libraries.len(),
            fetched
        ));
        Ok(classpath)
    }

    async fn write_libraries_file(&self, version_id: &str, classpath: &[PathBuf]) -> LauncherResult<()> {
        let joined = classpath
            .iter()
            .map(|p| p.to_string_lossy())
            .collect::<Vec<_>>()
            .join(self.platform.classpath_separator());

        let path = self.layout.libraries_file(version_id);
        tokio::fs::write(&path, joined)
            .await
            .map_err(|e| LauncherError::io(&path, e))
    }

    /// Re-hash installed client and library files against the manifest and
    /// delete the ones that do not match, so the next download refetches them.
    pub async fn verify_installed(
        &self,
        manifest: &VersionManifest,
        version_id: &str,
        sink: &dyn LogSink,
    ) -> LauncherResult<Vec<PathBuf>> {
        let libs_dir = self.layout.libraries_dir();
        let mut candidates = Vec::new();

        if let Some(client) = manifest.downloads.as_ref().and_then(|d| d.client.as_ref()) {
            if let Some(sha1) = &client.sha1 {
                candidates.push((self.layout.version_jar(version_id), sha1.clone()));
            }
        }
        for lib in &manifest.libraries {
            if !self.platform.is_library_allowed(lib) {
                continue;
            }
            let artifacts = lib
                .artifact(self.default_repo)?
                .into_iter()
                .chain(lib.classifier_artifacts()?.into_iter().map(|(_, a)| a));
            for artifact in artifacts {
                if let Some(sha1) = artifact.sha1.clone() {
                    candidates.push((artifact.local_path(&libs_dir), sha1));
                }
            }
        }

        let mut removed = Vec::new();
        for (path, sha1) in candidates {
            if !path.is_file() || Downloader::validate_sha1(&path, &sha1).await? {
                continue;
            }
            sink.warn(&format!("Removing corrupt file {}", path.display()));
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| LauncherError::io(&path, e))?;
            removed.push(path);
        }

        sink.info(&format!("Verification removed {} file(s)", removed.len()));
        Ok(removed)
    }
}
