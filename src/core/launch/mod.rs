pub mod classpath;
pub mod command;
pub mod natives;
pub mod orchestrator;
pub mod process;

pub use classpath::{join_classpath, safe_path_str, ClasspathBuilder};
pub use command::{CommandBuilder, CommandDescription};
pub use natives::extract_for_version;
pub use orchestrator::{Launcher, PreparedLaunch};
pub use process::{spawn, LaunchHandle, OutputMode};
