mod artifact;

pub use artifact::MavenArtifact;

/// Maven repositories the launcher resolves loader libraries against.
pub const MOJANG_LIBRARIES: &str = "https://libraries.minecraft.net";
pub const FABRIC_MAVEN: &str = "https://maven.fabricmc.net";
