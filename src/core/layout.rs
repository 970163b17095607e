// ─── Game Directory Layout ───
// Every on-disk location under the base directory, in one place.
//
//   versions/<id>/<id>.json        manifest, stored verbatim
//   versions/<id>/<id>.jar         client jar
//   libraries/<maven path>         library and classifier archives
//   libraries/natives/<id>/        extracted natives (recreated per launch)
//   assets/indexes/<asset id>.json
//   assets/objects/<hh>/<hash>
//   libraries_<id>.txt             persisted library classpath
//   version_cache.json, version_cache_metadata.json

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameLayout {
    base_dir: PathBuf,
}

impl GameLayout {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Working directory of the game process.
    pub fn game_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.base_dir.join("versions")
    }

    pub fn version_dir(&self, id: &str) -> PathBuf {
        self.versions_dir().join(id)
    }

    pub fn version_json(&self, id: &str) -> PathBuf {
        self.version_dir(id).join(format!("{id}.json"))
    }

    pub fn version_jar(&self, id: &str) -> PathBuf {
        self.version_dir(id).join(format!("{id}.jar"))
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.base_dir.join("libraries")
    }

    pub fn natives_dir(&self, id: &str) -> PathBuf {
        self.libraries_dir().join("natives").join(id)
    }

    pub fn libraries_file(&self, id: &str) -> PathBuf {
        self.base_dir.join(format!("libraries_{id}.txt"))
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.base_dir.join("assets")
    }

    pub fn asset_index(&self, asset_id: &str) -> PathBuf {
        self.assets_dir()
            .join("indexes")
            .join(format!("{asset_id}.json"))
    }

    /// Content-addressed object path: `objects/<hash[0:2]>/<hash>`.
    pub fn asset_object(&self, hash: &str) -> PathBuf {
        let prefix = hash.get(..2).unwrap_or(hash);
        self.assets_dir().join("objects").join(prefix).join(hash)
    }

    /// Directory holding the version-list cache files.
    pub fn cache_dir(&self) -> &Path {
        &self.base_dir
    }
}

/// A name that joins as exactly one path component: no separators, no
/// drive prefix, not `.` or `..`.
pub fn is_single_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', ':'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_launcher_layout() {
        let layout = GameLayout::new("/games/mc");
        assert_eq!(
            layout.version_json("1.20.4"),
            PathBuf::from("/games/mc/versions/1.20.4/1.20.4.json")
        );
        assert_eq!(
            layout.version_jar("1.20.4"),
            PathBuf::from("/games/mc/versions/1.20.4/1.20.4.jar")
        );
        assert_eq!(
            layout.natives_dir("1.20.4"),
            PathBuf::from("/games/mc/libraries/natives/1.20.4")
        );
        assert_eq!(
            layout.libraries_file("1.20.4"),
            PathBuf::from("/games/mc/libraries_1.20.4.txt")
        );
        assert_eq!(
            layout.asset_index("12"),
            PathBuf::from("/games/mc/assets/indexes/12.json")
        );
        assert_eq!(
            layout.asset_object("ab12cd"),
            PathBuf::from("/games/mc/assets/objects/ab/ab12cd")
        );
    }

    #[test]
    fn single_component_rejects_traversal() {
        assert!(is_single_component("1.20.4"));
        assert!(is_single_component("fabric-loader-0.15.11-1.20.4"));
        for name in ["", ".", "..", "../evil", "a/b", "a\\b", "C:evil"] {
            assert!(!is_single_component(name), "{name:?}");
        }
    }
}
