// ─── Launch Orchestrator ───
// Loads a version, follows at most one `inheritsFrom` hop, drives the
// fetcher, extractor and classpath builder, and emits the final command.
//
//   Standalone:  libraries_<id>.txt            + versions/<id>/<id>.jar
//   Inherits:    libraries_<base>.txt + loader + versions/<base>/<base>.jar

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::Client;
use serde::Serialize;
use tracing::info;

use super::classpath::{safe_path_str, ClasspathBuilder};
use super::command::{sanitize_game_args, sanitize_jvm_args, CommandBuilder, CommandDescription};
use super::natives;
use super::process::{self, LaunchHandle, OutputMode};
use crate::core::downloader::Downloader;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::build_http_client;
use crate::core::java::resolve_java_binary;
use crate::core::layout::GameLayout;
use crate::core::loaders::{ArtifactFetcher, LoaderLibraries};
use crate::core::maven::MOJANG_LIBRARIES;
use crate::core::platform::Platform;
use crate::core::profile::OfflineProfile;
use crate::core::settings::LauncherSettings;
use crate::core::sink::LogSink;
use crate::core::version::{LocalVersion, ManifestKind, VersionCache, VersionCatalog, VersionSummary};

const LAUNCHER_NAME: &str = "craftpath";
const LAUNCHER_VERSION: &str = env!("CARGO_PKG_VERSION");
const LEGACY_ASSET_INDEX: &str = "legacy";

/// Everything a launch needs, resolved but not yet started.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedLaunch {
    pub version_id: String,
    /// Set when the version inherits from an installed base version.
    pub base_version: Option<String>,
    pub main_class: String,
    pub asset_index: String,
    pub natives_dir: PathBuf,
    pub classpath: Vec<PathBuf>,
    pub command: CommandDescription,
}

pub struct Launcher {
    layout: GameLayout,
    settings: LauncherSettings,
    platform: Platform,
    downloader: Downloader,
    catalog: VersionCatalog,
    sink: Arc<dyn LogSink>,
}

impl Launcher {
    pub fn new(
        base_dir: &Path,
        settings: LauncherSettings,
        platform: Platform,
        sink: Arc<dyn LogSink>,
    ) -> LauncherResult<Self> {
        let client = build_http_client()?;
        Self::with_client(base_dir, settings, platform, client, sink)
    }

    /// Like [`Launcher::new`] with a caller-provided HTTP client.
    pub fn with_client(
        base_dir: &Path,
        settings: LauncherSettings,
        platform: Platform,
        client: Client,
        sink: Arc<dyn LogSink>,
    ) -> LauncherResult<Self> {
        std::fs::create_dir_all(base_dir).map_err(|e| LauncherError::io(base_dir, e))?;
        let base_dir = std::fs::canonicalize(base_dir).map_err(|e| LauncherError::io(base_dir, e))?;
        let layout = GameLayout::new(base_dir);

        let downloader =
            Downloader::new(client.clone()).with_concurrency(settings.effective_concurrency());
        let catalog = VersionCatalog::new(
            client,
            VersionCache::new(layout.cache_dir()),
            settings.version_list_url.clone(),
        );

        Ok(Self {
            layout,
            settings,
            platform,
            downloader,
            catalog,
            sink,
        })
    }

    pub fn layout(&self) -> &GameLayout {
        &self.layout
    }

    pub fn settings(&self) -> &LauncherSettings {
        &self.settings
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn catalog(&self) -> &VersionCatalog {
        &self.catalog
    }

    pub async fn available_versions(&self) -> LauncherResult<Vec<VersionSummary>> {
        self.catalog.versions(self.sink.as_ref()).await
    }

    pub async fn refresh_versions(&self) -> LauncherResult<Vec<VersionSummary>> {
        self.catalog.refresh(self.sink.as_ref()).await
    }

    /// Download-only entry point: materializes a version without launching.
    ///
    /// For a loader version only the loader libraries are fetched; the base
    /// version must already be installed.
    pub async fn install_version(&self, version_id: &str) -> LauncherResult<LocalVersion> {
        let sink = self.sink.as_ref();
        let version = self.ensure_manifest(version_id).await?;
        match &version.kind {
            ManifestKind::Standalone => {
                self.fetcher()
                    .download_all(&version.manifest, &version.id, sink)
                    .await?;
            }
            ManifestKind::Inherits { base } => {
                self.load_base(&version.id, base).await?;
                self.loader_libraries().ensure(&version.manifest, sink).await?;
            }
        }
        sink.info(&format!("Version {} is ready", version.id));
        Ok(version)
    }

    /// Resolve files and build the command for `version_id`.
    pub async fn prepare(&self, version_id: &str) -> LauncherResult<PreparedLaunch> {
        let sink = self.sink.as_ref();
        let version = self.ensure_manifest(version_id).await?;

        let base = match &version.kind {
            ManifestKind::Standalone => {
                self.fetcher()
                    .download_all(&version.manifest, &version.id, sink)
                    .await?;
                None
            }
            ManifestKind::Inherits { base } => {
                let base = self.load_base(&version.id, base).await?;
                self.loader_libraries().ensure(&version.manifest, sink).await?;
                Some(base)
            }
        };
        // natives, library list, main jar and asset index all come from the base
        let root = base.as_ref().unwrap_or(&version);

        let natives_dir = natives::extract_for_version(
            &root.manifest,
            &self.layout,
            &root.id,
            &self.platform,
            sink,
        )
        .await?;

        let mut builder = ClasspathBuilder::new(&self.platform);
        builder.add_from_libraries_file(&self.layout.libraries_file(&root.id), self.layout.base_dir())?;
        if base.is_some() {
            builder.add_fabric_libraries(
                &version.manifest,
                &self.platform,
                &self.layout.libraries_dir(),
                &self.settings.fabric_maven_url,
            )?;
        }
        builder.add_main_jar(self.layout.version_jar(&root.id));
        let classpath = builder.build();

        let asset_index = root
            .asset_index_id()
            .unwrap_or(LEGACY_ASSET_INDEX)
            .to_string();
        let main_class = version.manifest.main_class.clone();
        let profile = OfflineProfile::offline(&self.settings.username);
        let values = self.placeholders(&version.id, &asset_index, &natives_dir, &profile);

        // only loader manifests contribute declared arguments
        let (loader_jvm, loader_game) = match (&base, &version.manifest.arguments) {
            (Some(_), Some(args)) => (
                sanitize_jvm_args(&args.jvm_args(&self.platform), &values),
                sanitize_game_args(&args.game_args(&self.platform), &values),
            ),
            _ => (Vec::new(), Vec::new()),
        };

        let java = resolve_java_binary(self.settings.java_path.as_deref(), &self.platform);
        let command = CommandBuilder::new(java, main_class.clone())
            .jvm_args(self.platform.startup_jvm_flag())
            .jvm_arg(format!("-Xmx{}M", self.settings.max_memory_mb))
            .jvm_arg(format!("-Xms{}M", self.settings.min_memory_mb))
            .jvm_arg("-XX:+UseG1GC")
            .jvm_args(loader_jvm)
            .natives_dir(&natives_dir)
            .classpath(&classpath, self.platform.classpath_separator())
            .game_args(self.fixed_game_args(&version.id, &asset_index, &profile))
            .game_args(loader_game)
            .build();

        info!(
            "Prepared {} ({} classpath entries, main class {})",
            version.id,
            classpath.len(),
            main_class
        );

        Ok(PreparedLaunch {
            version_id: version.id.clone(),
            base_version: base.map(|b| b.id),
            main_class,
            asset_index,
            natives_dir,
            classpath,
            command,
        })
    }

    /// Prepare and start the game.
    ///
    /// Returns once the process has started; awaiting the handle is up to
    /// the caller.
    pub async fn launch(&self, version_id: &str, output: OutputMode) -> LauncherResult<LaunchHandle> {
        let prepared = self.prepare(version_id).await?;
        self.sink.info(&format!("Launching {}", prepared.version_id));
        let handle = process::spawn(
            &prepared.command,
            self.layout.game_dir(),
            &self.platform,
            output,
        )?;
        self.sink.info(&format!("Game started (pid {:?})", handle.pid()));
        Ok(handle)
    }

    /// Re-hash an installed standalone version and delete corrupt files.
    pub async fn verify_version(&self, version_id: &str) -> LauncherResult<Vec<PathBuf>> {
        let version = LocalVersion::load(&self.layout, version_id).await?;
        let root = match &version.kind {
            ManifestKind::Standalone => version,
            ManifestKind::Inherits { base } => self.load_base(&version.id, base).await?,
        };
        self.fetcher()
            .verify_installed(&root.manifest, &root.id, self.sink.as_ref())
            .await
    }

    /// Local manifest when present; otherwise look the id up in the version
    /// list, fetch the manifest and persist it verbatim.
    async fn ensure_manifest(&self, version_id: &str) -> LauncherResult<LocalVersion> {
        if LocalVersion::is_installed(&self.layout, version_id) {
            return LocalVersion::load(&self.layout, version_id).await;
        }
        let summary = self.catalog.find(version_id, self.sink.as_ref()).await?;
        self.fetcher()
            .install_manifest(&summary, self.sink.as_ref())
            .await
    }

    /// The base manifest must already be on disk; it is never fetched here.
    async fn load_base(&self, version_id: &str, base_id: &str) -> LauncherResult<LocalVersion> {
        let base = LocalVersion::load(&self.layout, base_id).await?;
        if let ManifestKind::Inherits { .. } = base.kind {
            return Err(LauncherError::InheritanceTooDeep {
                version: version_id.to_string(),
                base: base_id.to_string(),
            });
        }
        self.sink
            .debug(&format!("{version_id} inherits from {base_id}"));
        Ok(base)
    }

    fn fetcher(&self) -> ArtifactFetcher<'_> {
        ArtifactFetcher::new(
            &self.downloader,
            &self.layout,
            self.platform,
            &self.settings.resources_url,
            MOJANG_LIBRARIES,
        )
    }

    fn loader_libraries(&self) -> LoaderLibraries<'_> {
        LoaderLibraries::new(
            &self.downloader,
            &self.layout,
            self.platform,
            &self.settings.fabric_maven_url,
        )
    }

    fn fixed_game_args(&self, version_id: &str, asset_index: &str, profile: &OfflineProfile) -> Vec<String> {
        vec![
            "--username".into(),
            profile.username.clone(),
            "--version".into(),
            version_id.to_string(),
            "--gameDir".into(),
            safe_path_str(self.layout.game_dir()),
            "--assetsDir".into(),
            safe_path_str(&self.layout.assets_dir()),
            "--assetIndex".into(),
            asset_index.to_string(),
            "--uuid".into(),
            profile.uuid.simple().to_string(),
            "--accessToken".into(),
            profile.access_token.clone(),
            "--userType".into(),
            profile.user_type.clone(),
        ]
    }

    fn placeholders(
        &self,
        version_id: &str,
        asset_index: &str,
        natives_dir: &Path,
        profile: &OfflineProfile,
    ) -> Vec<(&'static str, String)> {
        vec![
            ("natives_directory", safe_path_str(natives_dir)),
            ("library_directory", safe_path_str(&self.layout.libraries_dir())),
            ("classpath_separator", self.platform.classpath_separator().to_string()),
            ("game_directory", safe_path_str(self.layout.game_dir())),
            ("assets_root", safe_path_str(&self.layout.assets_dir())),
            ("assets_index_name", asset_index.to_string()),
            ("version_name", version_id.to_string()),
            ("version_type", "release".to_string()),
            ("launcher_name", LAUNCHER_NAME.to_string()),
            ("launcher_version", LAUNCHER_VERSION.to_string()),
            ("auth_player_name", profile.username.clone()),
            ("auth_uuid", profile.uuid.simple().to_string()),
            ("auth_access_token", profile.access_token.clone()),
            ("user_type", profile.user_type.clone()),
        ]
    }
}
