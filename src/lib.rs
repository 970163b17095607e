//! # craftpath
//!
//! Minecraft version resolution and launch pipeline: version list cache,
//! manifest and library download, native extraction, classpath assembly and
//! the final `java` invocation.
//!
//! The binary in `main.rs` is a thin shell over [`core::launch::Launcher`].

pub mod commands;
pub mod core;

pub use crate::core::error::{LauncherError, LauncherResult};
pub use crate::core::launch::{CommandDescription, LaunchHandle, Launcher, OutputMode, PreparedLaunch};
pub use crate::core::platform::Platform;
pub use crate::core::settings::LauncherSettings;
pub use crate::core::sink::{LogLevel, LogLine, LogSink, MemorySink, TracingSink};
