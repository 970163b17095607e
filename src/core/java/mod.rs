// ─── Java Binary Resolution ───

use std::path::{Path, PathBuf};

use crate::core::platform::Platform;

/// Pick the `java` executable for a launch.
///
/// Order: an explicit path that exists, then `$JAVA_HOME/bin/java`, then the
/// bare executable name so the OS resolves it from `PATH`.
pub fn resolve_java_binary(explicit: Option<&Path>, platform: &Platform) -> PathBuf {
    if let Some(path) = explicit {
        if path.exists() {
            return path.to_path_buf();
        }
        tracing::warn!("Configured Java path {:?} does not exist, falling back", path);
    }

    if let Some(home) = std::env::var_os("JAVA_HOME") {
        let candidate = locate_java_binary(Path::new(&home), platform);
        if candidate.exists() {
            return candidate;
        }
    }

    PathBuf::from(platform.java_executable())
}

/// `<runtime root>/bin/java`, or the macOS bundle layout when that exists.
fn locate_java_binary(runtime_root: &Path, platform: &Platform) -> PathBuf {
    let primary = runtime_root.join("bin").join(platform.java_executable());
    if primary.exists() {
        return primary;
    }

    let mac_layout = runtime_root
        .join("Contents")
        .join("Home")
        .join("bin")
        .join(platform.java_executable());
    if mac_layout.exists() {
        return mac_layout;
    }

    primary
}
