use std::collections::{BTreeMap, HashSet};

use futures_util::stream::{self, StreamExt};
use serde::Deserialize;
use tracing::debug;

use crate::core::downloader::Downloader;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::layout::{is_single_component, GameLayout};
use crate::core::sink::LogSink;
use crate::core::version::AssetIndexInfo;

const PROGRESS_EVERY: usize = 100;

/// Top-level asset index JSON structure.
#[derive(Debug, Deserialize)]
pub struct AssetIndex {
    pub objects: BTreeMap<String, AssetObject>,
}

#[derive(Debug, Deserialize)]
pub struct AssetObject {
    pub hash: String,
}

/// Counts reported after an asset pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetSummary {
    pub total: usize,
    pub downloaded: usize,
    pub already_present: usize,
}

/// Downloads the asset index and the content-addressed objects it lists.
pub struct AssetManager<'a> {
    downloader: &'a Downloader,
    layout: &'a GameLayout,
    resources_url: &'a str,
}

impl<'a> AssetManager<'a> {
    pub fn new(downloader: &'a Downloader, layout: &'a GameLayout, resources_url: &'a str) -> Self {
        Self {
            downloader,
            layout,
            resources_url,
        }
    }

    /// Make sure the index and every object it references are on disk.
    ///
    /// Objects already present are skipped. The first failed download aborts
    /// the whole pass.
    pub async fn download_assets(
        &self,
        index_info: &AssetIndexInfo,
        sink: &dyn LogSink,
    ) -> LauncherResult<AssetSummary> {
        // 1. Asset index, stored as assets/indexes/<id>.json
        if !is_single_component(&index_info.id) {
            return Err(LauncherError::UnsafePath(index_info.id.clone()));
        }
        let index_path = self.layout.asset_index(&index_info.id);
        self.downloader
            .ensure_file(&index_info.url, &index_path, index_info.sha1.as_deref())
            .await?;
        let raw = tokio::fs::read(&index_path)
            .await
            .map_err(|e| LauncherError::io(&index_path, e))?;
        let index: AssetIndex = serde_json::from_slice(&raw)?;

        // 2. Objects not yet on disk, one entry per distinct hash
        let mut seen = HashSet::new();
        let mut pending = Vec::new();
        for object in index.objects.values() {
            if !is_sha1_hex(&object.hash) {
                return Err(LauncherError::UnsafePath(object.hash.clone()));
            }
            if !seen.insert(object.hash.as_str()) {
                continue;
            }
            let dest = self.layout.asset_object(&object.hash);
            if dest.exists() {
                continue;
            }
            pending.push((self.object_url(&object.hash), dest, object.hash.clone()));
        }

        let summary = AssetSummary {
            total: seen.len(),
            downloaded: pending.len(),
            already_present: seen.len() - pending.len(),
        };
        sink.info(&format!(
            "Assets {}: {} to download, {} already present",
            index_info.id, summary.downloaded, summary.already_present
        ));

        // 3. Fetch, bounded by the downloader's concurrency
        let mut downloads = stream::iter(pending)
            .map(|(url, dest, hash)| async move {
                self.downloader.download_file(&url, &dest, Some(hash.as_str())).await
            })
            .buffer_unordered(self.downloader.concurrency());

        let mut done = 0usize;
        while let Some(result) = downloads.next().await {
            result?;
            done += 1;
            if done % PROGRESS_EVERY == 0 {
                sink.info(&format!("Downloaded {}/{} assets", done, summary.downloaded));
            }
        }

        debug!("Asset pass complete: {:?}", summary);
        Ok(summary)
    }

    fn object_url(&self, hash: &str) -> String {
        let prefix = hash.get(..2).unwrap_or(hash);
        format!(
            "{}/{}/{}",
            self.resources_url.trim_end_matches('/'),
            prefix,
            hash
        )
    }
}

/// Object names double as file names, so only real SHA-1 digests are used.
fn is_sha1_hex(hash: &str) -> bool {
    hash.len() == 40 && hash.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sink::MemorySink;

    #[test]
    fn object_url_uses_hash_prefix() {
        let downloader = Downloader::new(reqwest::Client::new());
        let layout = GameLayout::new("/tmp/base");
        let manager = AssetManager::new(
            &downloader,
            &layout,
            "https://resources.download.minecraft.net/",
        );
        assert_eq!(
            manager.object_url("bdf48ef6b5d0d23bbb02e17d04865216179f510a"),
            "https://resources.download.minecraft.net/bd/bdf48ef6b5d0d23bbb02e17d04865216179f510a"
        );
    }

    #[test]
    fn index_ignores_size_and_extra_fields() {
        let index: AssetIndex = serde_json::from_str(
            r#"{"objects": {"icons/icon_16x16.png": {"hash": "bdf48ef6b5d0d23bbb02e17d04865216179f510a", "size": 3665}}}"#,
        )
        .unwrap();
        assert_eq!(index.objects.len(), 1);
    }

    #[tokio::test]
    async fn traversing_hash_is_rejected_before_any_download() {
        let temp = tempfile::tempdir().unwrap();
        let layout = GameLayout::new(temp.path());
        tokio::fs::create_dir_all(layout.assets_dir().join("indexes"))
            .await
            .unwrap();
        tokio::fs::write(
            layout.asset_index("12"),
            r#"{"objects": {"evil": {"hash": "../../../../versions/x"}}}"#,
        )
        .await
        .unwrap();

        let downloader = Downloader::new(reqwest::Client::new());
        // unroutable: the index is already on disk, objects must never be fetched
        let manager = AssetManager::new(&downloader, &layout, "http://127.0.0.1:9");
        let info = AssetIndexInfo {
            id: "12".into(),
            url: "http://127.0.0.1:9/12.json".into(),
            sha1: None,
        };
        let err = manager
            .download_assets(&info, &MemorySink::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::UnsafePath(_)));
    }

    #[tokio::test]
    async fn traversing_index_id_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let layout = GameLayout::new(temp.path());
        let downloader = Downloader::new(reqwest::Client::new());
        let manager = AssetManager::new(&downloader, &layout, "http://127.0.0.1:9");
        let info = AssetIndexInfo {
            id: "../../escape".into(),
            url: "http://127.0.0.1:9/x.json".into(),
            sha1: None,
        };
        let err = manager
            .download_assets(&info, &MemorySink::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::UnsafePath(ref id) if id == "../../escape"));
    }
}
