mod client;

pub use client::{DownloadOutcome, Downloader};
