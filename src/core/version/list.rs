// ─── Version List ───
// The remote document enumerating every published game version.

use reqwest::header::{ETAG, IF_NONE_MATCH};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::error::{LauncherError, LauncherResult};

/// One published version and the URL of its manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub version_type: String,
    pub url: String,
    pub release_time: String,
}

#[derive(Debug, Deserialize)]
struct VersionListDocument {
    versions: Vec<VersionSummary>,
}

/// Result of a (possibly conditional) version-list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListFetch {
    Modified {
        versions: Vec<VersionSummary>,
        etag: Option<String>,
    },
    /// The server confirmed the cached copy identified by the sent ETag.
    NotModified,
}

/// Fetch the version list, sending `If-None-Match` when an ETag is known.
pub async fn fetch_version_list(
    client: &reqwest::Client,
    url: &str,
    etag: Option<&str>,
) -> LauncherResult<ListFetch> {
    let mut request = client.get(url);
    if let Some(tag) = etag {
        request = request.header(IF_NONE_MATCH, tag);
    }

    let response = request.send().await?;
    let status = response.status();

    if status == StatusCode::NOT_MODIFIED && etag.is_some() {
        debug!("Version list not modified since ETag {:?}", etag);
        return Ok(ListFetch::NotModified);
    }
    if !status.is_success() {
        return Err(LauncherError::DownloadFailed {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let etag = response
        .headers()
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let document: VersionListDocument = response.json().await?;

    info!("Loaded {} versions from version list", document.versions.len());
    Ok(ListFetch::Modified {
        versions: document.versions,
        etag,
    })
}
