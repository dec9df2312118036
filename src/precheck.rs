//! Integrity precheck using the tool's test mode

use crate::error::Result;
use crate::tool::parser::is_damage_line;
use crate::tool::{ArchiveTool, ToolMode};
use std::path::Path;
use tracing::{info, trace, warn};

/// Result of an integrity test
#[must_use]
#[derive(Debug, Clone)]
pub struct TestOutcome {
    /// Whether the tool exited with status 0
    pub passed: bool,
    /// Exit code reported by the tool
    pub exit_code: Option<i32>,
    /// Error-stream text plus any damage reports from standard output
    pub diagnostics: String,
}

/// Test the archive whose first part is `archive`, running in `working_dir`.
///
/// Every line of the tool's standard output is echoed as it arrives. The
/// outcome passes iff the tool exits with status 0; anything on its error
/// stream is returned as diagnostics either way.
pub async fn run_integrity_check(
    tool: &ArchiveTool,
    archive: &Path,
    working_dir: &Path,
) -> Result<TestOutcome> {
    info!(?archive, "testing archive integrity");

    let mut process = tool.spawn(ToolMode::Test, archive, working_dir)?;
    let mut damage = Vec::new();

    while let Some(line) = process.next_line().await? {
        println!("{line}");
        trace!(line = %line, "tool output");
        if is_damage_line(&line) {
            damage.push(line.trim().to_string());
        }
    }

    let exit = process.wait().await?;
    let mut diagnostics = exit.stderr.trim().to_string();
    if !damage.is_empty() {
        if !diagnostics.is_empty() {
            diagnostics.push('\n');
        }
        diagnostics.push_str(&damage.join("\n"));
    }
    if !exit.success && diagnostics.is_empty() {
        diagnostics = match exit.code {
            Some(code) => format!("archive tool exited with status {code}"),
            None => "archive tool was terminated by a signal".to_string(),
        };
    }

    if exit.success {
        if !diagnostics.is_empty() {
            warn!(diagnostics = %diagnostics, "integrity test passed with warnings");
        }
        info!("integrity test passed");
    } else {
        warn!(code = ?exit.code, "integrity test failed");
    }

    Ok(TestOutcome {
        passed: exit.success,
        exit_code: exit.code,
        diagnostics,
    })
}
