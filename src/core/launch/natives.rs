// ─── Native Library Extractor ───
// Unpacks the current platform's native archives into a version-scoped
// directory, rebuilt from scratch on every launch.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::layout::GameLayout;
use crate::core::platform::Platform;
use crate::core::sink::LogSink;
use crate::core::version::VersionManifest;

const ALWAYS_EXCLUDED: &str = "META-INF/";

pub async fn extract_for_version(
    manifest: &VersionManifest,
    layout: &GameLayout,
    version_id: &str,
    platform: &Platform,
    sink: &dyn LogSink,
) -> LauncherResult<PathBuf> {
    let natives_dir = layout.natives_dir(version_id);

    if natives_dir.exists() {
        tokio::fs::remove_dir_all(&natives_dir)
            .await
            .map_err(|e| LauncherError::io(&natives_dir, e))?;
    }
    tokio::fs::create_dir_all(&natives_dir)
        .await
        .map_err(|e| LauncherError::io(&natives_dir, e))?;

    if platform.native_classifier().is_none() {
        sink.warn(&format!(
            "No native classifier for {:?}/{:?}; skipping native extraction",
            platform.os, platform.arch
        ));
        return Ok(natives_dir);
    }

    let libs_dir = layout.libraries_dir();
    let mut extracted = 0usize;

    for lib in &manifest.libraries {
        if !platform.is_library_allowed(lib) {
            continue;
        }
        let Some(artifact) = lib.native_artifact(platform)? else {
            continue;
        };

        let archive_path = artifact.local_path(&libs_dir);
        let bytes = match tokio::fs::read(&archive_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                sink.warn(&format!("Native archive missing: {}", archive_path.display()));
                continue;
            }
            Err(e) => return Err(LauncherError::io(archive_path, e)),
        };

        let dest = natives_dir.clone();
        let excludes = lib.extract_excludes().to_vec();
        let result = tokio::task::spawn_blocking(move || unpack(bytes, &dest, &excludes))
            .await
            .map_err(|e| LauncherError::Process(format!("native extraction task failed: {e}")))?;

        match result {
            Ok(count) => extracted += count,
            Err(LauncherError::Zip(err)) => {
                sink.warn(&format!(
                    "Cannot open native archive {}: {}",
                    archive_path.display(),
                    err
                ));
            }
            Err(err) => return Err(err),
        }
    }

    sink.info(&format!(
        "Extracted {} native file(s) to {}",
        extracted,
        natives_dir.display()
    ));
    Ok(natives_dir)
}

/// Write every file entry of the archive under `dest`, keeping its
/// archive-relative path. Returns the number of files written.
fn unpack(bytes: Vec<u8>, dest: &Path, excludes: &[String]) -> LauncherResult<usize> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut written = 0;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_string();
        if name.starts_with(ALWAYS_EXCLUDED) || excludes.iter().any(|ex| name.starts_with(ex.as_str())) {
            continue;
        }

        // rejects absolute paths and `..` components
        let Some(relative) = entry.enclosed_name() else {
            debug!("Skipping unsafe archive entry: {}", name);
            continue;
        };

        let target = dest.join(relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;
        }
        let mut out = std::fs::File::create(&target).map_err(|e| LauncherError::io(&target, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| LauncherError::io(&target, e))?;
        written += 1;
        debug!("Extracted native: {}", name);
    }

    Ok(written)
}
