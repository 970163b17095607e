use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::loaders::loader_classpath;
use crate::core::platform::Platform;
use crate::core::version::VersionManifest;

/// Collects classpath entries in three groups that always come out in the
/// same order: persisted library list, loader libraries, main jar.
///
/// Within a group entries keep their insertion order. Nothing is sorted or
/// deduplicated; classloading order decides which copy of a class wins.
#[derive(Debug, Clone, Default)]
pub struct ClasspathBuilder {
    libraries: Vec<PathBuf>,
    loader: Vec<PathBuf>,
    main_jars: Vec<PathBuf>,
    separator: &'static str,
}

impl ClasspathBuilder {
    pub fn new(platform: &Platform) -> Self {
        Self {
            separator: platform.classpath_separator(),
            ..Self::default()
        }
    }

    /// Append every entry of a `libraries_<id>.txt` file.
    ///
    /// Relative entries are resolved against `base_dir`; blank entries are
    /// ignored. A missing file is an error.
    pub fn add_from_libraries_file(&mut self, path: &Path, base_dir: &Path) -> LauncherResult<&mut Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| LauncherError::io(path, e))?;

        let before = self.libraries.len();
        for entry in raw.split(self.separator) {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let entry = Path::new(entry);
            self.libraries.push(if entry.is_absolute() {
                entry.to_path_buf()
            } else {
                base_dir.join(entry)
            });
        }
        debug!(
            "Read {} classpath entries from {:?}",
            self.libraries.len() - before,
            path
        );
        Ok(self)
    }

    /// Append the allowed libraries of a loader manifest.
    pub fn add_fabric_libraries(
        &mut self,
        manifest: &VersionManifest,
        platform: &Platform,
        libraries_dir: &Path,
        default_repo: &str,
    ) -> LauncherResult<&mut Self> {
        let entries = loader_classpath(manifest, platform, libraries_dir, default_repo)?;
        self.loader.extend(entries);
        Ok(self)
    }

    pub fn add_main_jar(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.main_jars.push(path.into());
        self
    }

    pub fn build(&self) -> Vec<PathBuf> {
        self.libraries
            .iter()
            .chain(&self.loader)
            .chain(&self.main_jars)
            .cloned()
            .collect()
    }
}

/// Join entries with the platform separator, in the form handed to `-cp`.
pub fn join_classpath(entries: &[PathBuf], separator: &str) -> String {
    entries
        .iter()
        .map(|p| safe_path_str(p))
        .collect::<Vec<_>>()
        .join(separator)
}

/// Convert a path to a string for the JVM command line.
///
/// Existing paths are canonicalized. Windows extended-length prefixes
/// (`\\?\C:\...`) are stripped because the JVM classpath parser rejects them.
pub fn safe_path_str(path: &Path) -> String {
    let resolved = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let text = resolved.to_string_lossy().to_string();

    #[cfg(target_os = "windows")]
    {
        if let Some(stripped) = text.strip_prefix(r"\\?\") {
            return stripped.to_string();
        }
    }

    text
}
