// ─── Version Cache ───
// Two JSON files next to each other:
//   version_cache.json           [{id, type, url, releaseTime}, ...]
//   version_cache_metadata.json  {timestamp: epoch millis, etag}
//
// Freshness (timestamp + TTL) and identity (ETag) are tracked separately so a
// stale list can be revalidated with a conditional request instead of a full
// refetch. Any read problem is a cache miss, never an error.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::list::VersionSummary;
use crate::core::error::{LauncherError, LauncherResult};

pub const CACHE_TTL_HOURS: i64 = 6;

const DATA_FILE: &str = "version_cache.json";
const METADATA_FILE: &str = "version_cache_metadata.json";

#[derive(Debug, Serialize, Deserialize)]
struct CacheMetadata {
    /// Epoch milliseconds of the last successful save.
    timestamp: i64,
    etag: Option<String>,
}

#[derive(Debug, thiserror::Error)]
enum CacheReadError {
    #[error("missing")]
    Missing,
    #[error("unreadable {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("corrupt {path:?}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid timestamp {0}")]
    Timestamp(i64),
}

/// A complete cache entry, regardless of its age.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRecord {
    pub versions: Vec<VersionSummary>,
    pub timestamp: DateTime<Utc>,
    pub etag: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VersionCache {
    dir: PathBuf,
    ttl: Duration,
}

impl VersionCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ttl: Duration::hours(CACHE_TTL_HOURS),
        }
    }

    fn data_path(&self) -> PathBuf {
        self.dir.join(DATA_FILE)
    }

    fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILE)
    }

    /// Cached list if both files are present, parse, and are within the TTL.
    pub fn get_cached_versions(&self) -> Option<Vec<VersionSummary>> {
        let record = self.load_record()?;
        if self.is_expired(record.timestamp) {
            debug!("Version cache expired (saved {})", record.timestamp);
            return None;
        }
        Some(record.versions)
    }

    /// ETag stored with an intact cache, fresh or stale.
    pub fn get_stored_etag(&self) -> Option<String> {
        self.load_record()?.etag
    }

    /// True only when metadata exists, parses, and its TTL has elapsed.
    ///
    /// A missing cache is not "needs validation"; it needs a full fetch.
    pub fn needs_validation(&self) -> bool {
        match self.read_metadata() {
            Ok(meta) => match millis_to_datetime(meta.timestamp) {
                Ok(saved) => self.is_expired(saved),
                Err(err) => {
                    warn!("Ignoring version cache metadata: {}", err);
                    false
                }
            },
            Err(CacheReadError::Missing) => false,
            Err(err) => {
                warn!("Ignoring version cache metadata: {}", err);
                false
            }
        }
    }

    /// Read both files ignoring the TTL. `None` on any absence or corruption.
    pub fn load_record(&self) -> Option<CacheRecord> {
        match self.try_load_record() {
            Ok(record) => Some(record),
            Err(CacheReadError::Missing) => None,
            Err(err) => {
                warn!("Treating version cache as absent: {}", err);
                None
            }
        }
    }

    /// Overwrite the list, then the metadata, stamping the current time.
    pub fn save_to_cache(
        &self,
        versions: &[VersionSummary],
        etag: Option<&str>,
    ) -> LauncherResult<()> {
        self.save_with_timestamp(versions, etag, Utc::now())
    }

    fn save_with_timestamp(
        &self,
        versions: &[VersionSummary],
        etag: Option<&str>,
        timestamp: DateTime<Utc>,
    ) -> LauncherResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| LauncherError::io(&self.dir, e))?;

        write_replacing(&self.data_path(), &serde_json::to_vec(versions)?)?;

        let metadata = CacheMetadata {
            timestamp: timestamp.timestamp_millis(),
            etag: etag.map(str::to_string),
        };
        write_replacing(&self.metadata_path(), &serde_json::to_vec(&metadata)?)?;

        debug!("Saved {} versions to cache", versions.len());
        Ok(())
    }

    /// Delete both files. Files that are already gone are not an error.
    pub fn clear_cache(&self) -> LauncherResult<()> {
        for path in [self.data_path(), self.metadata_path()] {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(LauncherError::io(path, e)),
            }
        }
        Ok(())
    }

    /// A timestamp from the future (clock moved back) counts as stale.
    fn is_expired(&self, saved: DateTime<Utc>) -> bool {
        let now = Utc::now();
        saved > now || now - saved > self.ttl
    }

    fn try_load_record(&self) -> Result<CacheRecord, CacheReadError> {
        let meta = self.read_metadata()?;
        let versions: Vec<VersionSummary> = read_json(&self.data_path())?;
        Ok(CacheRecord {
            versions,
            timestamp: millis_to_datetime(meta.timestamp)?,
            etag: meta.etag,
        })
    }

    fn read_metadata(&self) -> Result<CacheMetadata, CacheReadError> {
        read_json(&self.metadata_path())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CacheReadError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(CacheReadError::Missing),
        Err(source) => {
            return Err(CacheReadError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_slice(&bytes).map_err(|source| CacheReadError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn millis_to_datetime(millis: i64) -> Result<DateTime<Utc>, CacheReadError> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or(CacheReadError::Timestamp(millis))
}

/// Write through a sibling temp file so a reader never sees half a file.
fn write_replacing(path: &Path, bytes: &[u8]) -> LauncherResult<()> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, bytes).map_err(|e| LauncherError::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| LauncherError::io(path, e))?;
    Ok(())
}
