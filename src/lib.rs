//! # rar-reclaim
//!
//! Extract a multi-part RAR archive while deleting each part as soon as the
//! extractor has moved past it, so peak disk usage stays close to the size of
//! the extracted output plus one part.
//!
//! ## Safety contract
//!
//! - Nothing is deleted without an explicit affirmative from the operator
//! - Nothing is deleted if the integrity test fails (unless it was disabled)
//! - A part is deleted only after the extractor is seen reading a later part,
//!   or after a successful exit for the last part
//! - A failed extraction keeps the part being read and every later part
//!
//! ## Quick Start
//!
//! ```no_run
//! use rar_reclaim::{Config, Orchestrator, RunRequest, TerminalPrompter};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orchestrator = Orchestrator::from_config(Config::default(), Arc::new(TerminalPrompter))?;
//!
//!     // Subscribe to events
//!     let mut events = orchestrator.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let report = orchestrator
//!         .run(RunRequest {
//!             archive: Some("movie.part01.rar".into()),
//!             destination: Some("/mnt/out".into()),
//!         })
//!         .await?;
//!     std::process::exit(report.exit_code());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Command-line arguments
pub mod cli;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Operator prompts and the confirmation gate
pub mod gate;
/// Part discovery
pub mod locator;
/// Progressive extraction monitor
pub mod monitor;
/// Pipeline sequencing
pub mod orchestrator;
/// Integrity precheck
pub mod precheck;
/// External archive tool
pub mod tool;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use cli::Cli;
pub use config::{Config, ConsoleConfig, ExtractionConfig, ToolsConfig};
pub use error::{Error, Result, ToExitCode};
pub use gate::{Prompter, TerminalPrompter, is_affirmative};
pub use locator::locate;
pub use monitor::{ExtractionMonitor, FsPartRemover, PartRemover, PartTracker};
pub use orchestrator::{Orchestrator, RunReport, RunRequest};
pub use precheck::{TestOutcome, run_integrity_check};
pub use tool::{ArchiveTool, ToolMode};
pub use types::{ArchivePart, ArchiveSet, Event, ExtractionSession, SessionStatus};

/// Wait for a termination signal (SIGTERM/SIGINT on Unix, Ctrl+C elsewhere).
///
/// Used by the binary to abandon a run; dropping the run kills the archive tool.
#[cfg(unix)]
pub async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("received SIGTERM, stopping"),
                _ = sigint.recv() => tracing::info!("received SIGINT (Ctrl+C), stopping"),
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "could not register signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

/// Wait for a termination signal (SIGTERM/SIGINT on Unix, Ctrl+C elsewhere).
#[cfg(not(unix))]
pub async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("received Ctrl+C, stopping");
}
