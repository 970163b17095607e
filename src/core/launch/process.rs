// ─── Game Process ───
// Spawns a built command. The caller decides whether to await the handle or
// let the game run detached.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::classpath::safe_path_str;
use super::command::CommandDescription;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::platform::Platform;
use crate::core::sink::{LogLevel, LogSink};

/// Where the child's stdout and stderr go.
pub enum OutputMode {
    /// Share the launcher's own terminal.
    Inherit,
    /// Stream lines into a sink: stdout at info, stderr at warn.
    Forward(Arc<dyn LogSink>),
}

/// A started game process.
///
/// Dropping the handle leaves the process running.
#[derive(Debug)]
pub struct LaunchHandle {
    child: Child,
    pid: Option<u32>,
    forwarders: Vec<JoinHandle<()>>,
}

impl LaunchHandle {
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Wait for the process to exit and its output to drain.
    pub async fn wait(mut self) -> LauncherResult<ExitStatus> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| LauncherError::Process(format!("waiting for game process: {e}")))?;
        for forwarder in self.forwarders {
            let _ = forwarder.await;
        }
        info!("Game process exited with {}", status);
        Ok(status)
    }
}

pub fn spawn(
    command: &CommandDescription,
    game_dir: &Path,
    platform: &Platform,
    output: OutputMode,
) -> LauncherResult<LaunchHandle> {
    let mut cmd = Command::new(command.program());
    cmd.args(command.args());
    cmd.current_dir(game_dir);
    cmd.stdin(Stdio::null());

    if let Some(natives_dir) = command.natives_dir() {
        configure_native_library_env(&mut cmd, natives_dir, platform);
    }
    configure_platform_spawn(&mut cmd);

    let forwarding = matches!(output, OutputMode::Forward(_));
    if forwarding {
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
    } else {
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());
    }

    debug!("Command (copy/paste): {}", command.display_line());
    let mut child = cmd
        .spawn()
        .map_err(|e| LauncherError::Process(format!("cannot start {}: {e}", command.program())))?;
    let pid = child.id();
    info!("Game process started (pid {:?})", pid);

    let mut forwarders = Vec::new();
    if let OutputMode::Forward(sink) = output {
        if let Some(stdout) = child.stdout.take() {
            forwarders.push(forward_lines(stdout, Arc::clone(&sink), LogLevel::Info));
        }
        if let Some(stderr) = child.stderr.take() {
            forwarders.push(forward_lines(stderr, sink, LogLevel::Warn));
        }
    }

    Ok(LaunchHandle {
        child,
        pid,
        forwarders,
    })
}

fn forward_lines<R>(stream: R, sink: Arc<dyn LogSink>, level: LogLevel) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            sink.log(level, &line);
        }
    })
}

/// Prepend the natives directory to the dynamic loader's search path.
fn configure_native_library_env(cmd: &mut Command, natives_dir: &Path, platform: &Platform) {
    let Some(var) = platform.library_path_env() else {
        return;
    };
    let existing = std::env::var(var).ok();
    let merged = prepend_env_path(
        existing.as_deref(),
        &safe_path_str(natives_dir),
        platform.classpath_separator(),
    );
    cmd.env(var, merged);
}

fn configure_platform_spawn(cmd: &mut Command) {
    #[cfg(target_os = "windows")]
    {
        const CREATE_NEW_CONSOLE: u32 = 0x00000010;
        cmd.creation_flags(CREATE_NEW_CONSOLE);
        // terminal markers make LWJGL treat the child as a console session
        cmd.env_remove("WT_SESSION");
        cmd.env_remove("TERM");
        cmd.env_remove("ConEmuANSI");
    }
    #[cfg(not(target_os = "windows"))]
    let _ = cmd;
}

fn prepend_env_path(existing: Option<&str>, value: &str, separator: &str) -> String {
    match existing {
        Some(existing) if !existing.trim().is_empty() => {
            format!("{}{}{}", value, separator, existing)
        }
        _ => value.to_string(),
    }
}
