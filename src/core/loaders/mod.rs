pub mod fabric;
pub mod vanilla;

pub use fabric::{import_profile, loader_classpath, LoaderLibraries};
pub use vanilla::ArtifactFetcher;
