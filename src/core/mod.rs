// ─── craftpath core ───
// Version resolution and launch pipeline.
//
// Architecture:
//   core/
//     version/      version list, two-file cache, per-version manifests
//     downloader/   skip-if-present downloads with SHA-1 validation
//     assets/       asset index + content-addressed objects
//     loaders/      vanilla artifact fetcher, loader (Fabric) libraries
//     launch/       natives, classpath, command, process, orchestrator
//     maven/        coordinate parsing
//     java/         java binary lookup
//     platform, layout, settings, profile, sink, http, error

pub mod assets;
pub mod downloader;
pub mod error;
pub mod http;
pub mod java;
pub mod launch;
pub mod layout;
pub mod loaders;
pub mod maven;
pub mod platform;
pub mod profile;
pub mod settings;
pub mod sink;
pub mod version;
