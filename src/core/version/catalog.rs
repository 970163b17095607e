// ─── Version Catalog ───
// Decides between serving the cached version list, revalidating it with the
// stored ETag, or fetching it from scratch.

use tracing::warn;

use super::cache::VersionCache;
use super::list::{fetch_version_list, ListFetch, VersionSummary};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::sink::LogSink;

#[derive(Debug, Clone)]
pub struct VersionCatalog {
    client: reqwest::Client,
    cache: VersionCache,
    list_url: String,
}

impl VersionCatalog {
    pub fn new(client: reqwest::Client, cache: VersionCache, list_url: impl Into<String>) -> Self {
        Self {
            client,
            cache,
            list_url: list_url.into(),
        }
    }

    pub fn cache(&self) -> &VersionCache {
        &self.cache
    }

    /// The version list, touching the network only when the cache is stale
    /// or gone.
    pub async fn versions(&self, sink: &dyn LogSink) -> LauncherResult<Vec<VersionSummary>> {
        if let Some(versions) = self.cache.get_cached_versions() {
            sink.debug(&format!("Using cached version list ({} versions)", versions.len()));
            return Ok(versions);
        }

        if self.cache.needs_validation() {
            if let Some(record) = self.cache.load_record() {
                return self.revalidate(record.versions, record.etag, sink).await;
            }
        }

        self.refresh(sink).await
    }

    /// Unconditionally download the list and replace the cache.
    pub async fn refresh(&self, sink: &dyn LogSink) -> LauncherResult<Vec<VersionSummary>> {
        sink.info("Fetching version list...");
        match fetch_version_list(&self.client, &self.list_url, None).await? {
            ListFetch::Modified { versions, etag } => {
                self.store(&versions, etag.as_deref());
                sink.info(&format!("Fetched {} versions", versions.len()));
                Ok(versions)
            }
            ListFetch::NotModified => Err(LauncherError::DownloadFailed {
                url: self.list_url.clone(),
                status: 304,
            }),
        }
    }

    /// Look up one version by id.
    pub async fn find(&self, id: &str, sink: &dyn LogSink) -> LauncherResult<VersionSummary> {
        self.versions(sink)
            .await?
            .into_iter()
            .find(|v| v.id == id)
            .ok_or_else(|| LauncherError::VersionNotFound(id.to_string()))
    }

    async fn revalidate(
        &self,
        stale: Vec<VersionSummary>,
        etag: Option<String>,
        sink: &dyn LogSink,
    ) -> LauncherResult<Vec<VersionSummary>> {
        sink.info("Version list cache expired, revalidating...");
        match fetch_version_list(&self.client, &self.list_url, etag.as_deref()).await {
            Ok(ListFetch::NotModified) => {
                sink.debug("Version list unchanged");
                self.store(&stale, etag.as_deref());
                Ok(stale)
            }
            Ok(ListFetch::Modified { versions, etag }) => {
                sink.info(&format!("Version list updated ({} versions)", versions.len()));
                self.store(&versions, etag.as_deref());
                Ok(versions)
            }
            Err(err) if err.is_network() => {
                sink.warn(&format!(
                    "Could not revalidate version list ({err}); using the expired copy"
                ));
                Ok(stale)
            }
            Err(err) => Err(err),
        }
    }

    fn store(&self, versions: &[VersionSummary], etag: Option<&str>) {
        if let Err(err) = self.cache.save_to_cache(versions, etag) {
            warn!("Could not write version cache: {}", err);
        }
    }
}
