//! External archive tool invocation
//!
//! The tool (`unrar` or a compatible executable) owns every format-specific
//! detail. This module only knows how to find it, start it in test or extract
//! mode, and stream what it prints.

pub mod parser;

use crate::config::ToolsConfig;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub use parser::{MARKER_CONTRACT_VERSION, VolumeMarker, parse_volume_marker};

/// Executable names searched for in PATH, in order
pub const TOOL_CANDIDATES: &[&str] = &["unrar", "UnRAR", "rar"];

/// What the tool is asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolMode {
    /// Test archive integrity without writing anything
    Test,
    /// Extract with full paths into the working directory
    Extract,
}

impl ToolMode {
    /// Command-line arguments preceding the archive path
    pub fn args(self) -> &'static [&'static str] {
        match self {
            ToolMode::Test => &["t", "-y"],
            ToolMode::Extract => &["x", "-y"],
        }
    }
}

/// Handle on the external archive tool
///
/// # Examples
///
/// ```no_run
/// use rar_reclaim::tool::ArchiveTool;
/// use std::path::PathBuf;
///
/// // Create with explicit path
/// let tool = ArchiveTool::new(PathBuf::from("/usr/bin/unrar"));
///
/// // Or auto-discover from PATH
/// let tool = ArchiveTool::from_path().expect("unrar not found in PATH");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveTool {
    binary_path: PathBuf,
}

impl ArchiveTool {
    /// Create a handle with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find the tool in PATH
    ///
    /// Tries each name in [`TOOL_CANDIDATES`] with the `which` crate.
    pub fn from_path() -> Option<Self> {
        TOOL_CANDIDATES
            .iter()
            .find_map(|name| which::which(name).ok())
            .map(Self::new)
    }

    /// Resolve the tool from configuration
    ///
    /// An explicit `tool_path` wins; a bare name there is looked up in PATH.
    /// Without one, PATH is searched when `search_path` is enabled.
    ///
    /// # Errors
    ///
    /// [`Error::ToolMissing`] when nothing usable is found.
    pub fn resolve(config: &ToolsConfig) -> Result<Self> {
        if let Some(explicit) = &config.tool_path {
            let is_file = std::fs::metadata(explicit)
                .map(|m| m.is_file())
                .unwrap_or(false);
            if is_file {
                debug!(tool = ?explicit, "using configured archive tool");
                return Ok(Self::new(explicit.clone()));
            }
            if let Ok(found) = which::which(explicit) {
                debug!(tool = ?found, "resolved configured archive tool via PATH");
                return Ok(Self::new(found));
            }
            return Err(Error::ToolMissing {
                searched: explicit.display().to_string(),
            });
        }

        if !config.search_path {
            return Err(Error::ToolMissing {
                searched: "no tool_path configured and PATH search disabled".to_string(),
            });
        }

        Self::from_path().ok_or_else(|| Error::ToolMissing {
            searched: format!("{} in PATH", TOOL_CANDIDATES.join(", ")),
        })
    }

    /// Path of the executable
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Start the tool against `archive` with `working_dir` as its current directory
    ///
    /// Standard output and error are captured; standard input is closed so
    /// the tool can never block on a question. The child is killed if the
    /// returned [`ToolProcess`] is dropped before it exits.
    pub fn spawn(&self, mode: ToolMode, archive: &Path, working_dir: &Path) -> Result<ToolProcess> {
        debug!(
            tool = ?self.binary_path,
            ?mode,
            ?archive,
            ?working_dir,
            "starting archive tool"
        );

        let mut child = Command::new(&self.binary_path)
            .args(mode.args())
            .arg(archive)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::ExternalTool(format!(
                    "Failed to execute {}: {}",
                    self.binary_path.display(),
                    e
                ))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::ExternalTool("tool stdout was not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::ExternalTool("tool stderr was not captured".to_string()))?;

        // Drained concurrently so a chatty error stream cannot fill its pipe
        // while stdout is being read line by line
        let stderr_task = tokio::spawn(async move {
            let mut bytes = Vec::new();
            let mut stderr = stderr;
            if let Err(e) = stderr.read_to_end(&mut bytes).await {
                warn!(error = %e, "failed to read tool error stream");
            }
            String::from_utf8_lossy(&bytes).into_owned()
        });

        Ok(ToolProcess {
            child,
            stdout: BufReader::new(stdout),
            stderr_task: Some(stderr_task),
            buf: Vec::new(),
        })
    }
}

/// How a tool run ended
#[must_use]
#[derive(Debug, Clone)]
pub struct ToolExit {
    /// Whether the exit status was zero
    pub success: bool,
    /// Exit code, `None` if the tool was terminated by a signal
    pub code: Option<i32>,
    /// Everything the tool wrote to standard error
    pub stderr: String,
}

/// A running tool with its output streams captured
pub struct ToolProcess {
    child: Child,
    stdout: BufReader<ChildStdout>,
    stderr_task: Option<JoinHandle<String>>,
    buf: Vec<u8>,
}

impl ToolProcess {
    /// Read the next line of standard output
    ///
    /// Suspends until a full line is available. Returns `Ok(None)` at end of
    /// stream. Invalid UTF-8 is replaced rather than rejected and the trailing
    /// line terminator is stripped.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        self.buf.clear();
        let n = self
            .stdout
            .read_until(b'\n', &mut self.buf)
            .await
            .map_err(|e| Error::ExternalTool(format!("failed to read tool output: {}", e)))?;
        if n == 0 {
            return Ok(None);
        }

        let line = String::from_utf8_lossy(&self.buf);
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Wait for the tool to exit and collect its error stream
    pub async fn wait(mut self) -> Result<ToolExit> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| Error::ExternalTool(format!("failed to wait for tool: {}", e)))?;

        let stderr = match self.stderr_task.take() {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        debug!(code = ?status.code(), "archive tool exited");
        Ok(ToolExit {
            success: status.success(),
            code: status.code(),
            stderr,
        })
    }

    /// Forcibly terminate the tool
    pub async fn kill(&mut self) {
        if let Err(e) = self.child.kill().await {
            warn!(error = %e, "failed to kill archive tool");
        }
    }
}
