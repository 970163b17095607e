pub mod cache;
pub mod catalog;
pub mod list;
pub mod manifest;

pub use cache::{CacheRecord, VersionCache, CACHE_TTL_HOURS};
pub use catalog::VersionCatalog;
pub use list::{fetch_version_list, ListFetch, VersionSummary};
pub use manifest::{
    Arguments, AssetIndexInfo, ClientDownload, ExtractRules, Library, LibraryArtifact,
    LibraryDownloads, LocalVersion, ManifestKind, ResolvedArtifact, VersionDownloads,
    VersionManifest,
};
