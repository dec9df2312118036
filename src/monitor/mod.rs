//! Progressive extraction monitor: extracts an archive and deletes each part
//! as soon as the tool has moved past it.
//!
//! The monitor reads the tool's standard output one line at a time and echoes
//! every line. When a volume marker shows the tool reading a later part, the
//! part it vacated is deleted after a short settle delay. The final part is
//! deleted only after the tool exits with status 0. A non-zero exit leaves the
//! current part and everything after it on disk.

mod remover;
mod tracker;

pub use remover::{FsPartRemover, PartRemover};
pub use tracker::{PartTracker, Transition};

use crate::config::ExtractionConfig;
use crate::error::{Error, Result};
use crate::tool::{ArchiveTool, ToolMode, parse_volume_marker};
use crate::types::{ArchiveSet, Event, ExtractionSession, SessionStatus};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};

/// Drives one extraction run and the deletions that follow it
pub struct ExtractionMonitor {
    tool: ArchiveTool,
    config: ExtractionConfig,
    remover: Arc<dyn PartRemover>,
    event_tx: Option<broadcast::Sender<Event>>,
}

impl ExtractionMonitor {
    /// Create a monitor that deletes parts from the filesystem
    pub fn new(tool: ArchiveTool, config: ExtractionConfig) -> Self {
        Self {
            tool,
            config,
            remover: Arc::new(FsPartRemover),
            event_tx: None,
        }
    }

    /// Use a different part remover
    pub fn with_remover(mut self, remover: Arc<dyn PartRemover>) -> Self {
        self.remover = remover;
        self
    }

    /// Publish progress events on `event_tx`
    pub fn with_events(mut self, event_tx: broadcast::Sender<Event>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    fn emit(&self, event: Event) {
        if let Some(tx) = &self.event_tx {
            tx.send(event).ok();
        }
    }

    /// Extract `set` into `destination`, deleting parts as they are consumed.
    ///
    /// Returns the finished session; a failed extraction is reported through
    /// [`SessionStatus::FailedExtraction`], not as an error. `Err` is returned
    /// only when the tool cannot be started or its output cannot be read, and
    /// in that case the tool has been killed.
    pub async fn extract(&self, set: &ArchiveSet, destination: &Path) -> Result<ExtractionSession> {
        let archive = set.archive_path()?;
        tokio::fs::create_dir_all(destination).await?;

        let mut session = ExtractionSession::new(set.clone(), destination.to_path_buf());
        let mut tracker = PartTracker::new();

        info!(
            ?archive,
            ?destination,
            parts = set.len(),
            remover = self.remover.name(),
            "starting progressive extraction"
        );
        self.emit(Event::ExtractionStarted {
            archive: archive.to_path_buf(),
            destination: destination.to_path_buf(),
        });

        let mut process = self.tool.spawn(ToolMode::Extract, archive, destination)?;

        loop {
            let line = match process.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "lost the tool's output stream, killing it");
                    process.kill().await;
                    return Err(e);
                }
            };

            println!("{line}");
            trace!(line = %line, "tool output");

            let Some(marker) = parse_volume_marker(&line) else {
                continue;
            };
            if !marker.base_name.eq_ignore_ascii_case(&set.base_name) {
                debug!(
                    file = %marker.file_name,
                    "volume marker belongs to another archive, ignoring"
                );
                continue;
            }

            if let Some(transition) = tracker.observe(marker.part) {
                session.current_part = tracker.current();
                info!(
                    from = transition.from,
                    to = transition.to,
                    "tool moved to the next part"
                );
                self.emit(Event::PartTransition {
                    from: transition.from,
                    to: transition.to,
                });
                self.delete_part(&mut session, transition.from).await;
            }
        }

        let exit = process.wait().await?;
        session.exit_code = exit.code;
        session.diagnostics = exit.stderr.trim().to_string();

        if exit.success {
            tokio::time::sleep(self.config.final_settle()).await;
            if let Some(last) = tracker.release_current() {
                self.delete_part(&mut session, last).await;
            }
            session.status = SessionStatus::Succeeded;
            if !session.diagnostics.is_empty() {
                warn!(diagnostics = %session.diagnostics, "extraction succeeded with warnings");
            }
            info!(
                deleted = session.deleted_parts.len(),
                undeletable = session.undeletable_parts.len(),
                "extraction succeeded"
            );
        } else {
            session.status = SessionStatus::FailedExtraction;
            warn!(
                code = ?exit.code,
                current_part = session.current_part,
                "extraction failed; keeping the current part and everything after it"
            );
        }

        self.emit(Event::ExtractionFinished {
            status: session.status,
            exit_code: session.exit_code,
        });
        Ok(session)
    }

    /// Wait for the tool to let go of `part`, then remove it.
    ///
    /// Failures are logged and recorded on the session; they never abort the run.
    async fn delete_part(&self, session: &mut ExtractionSession, part: u32) {
        let Some(entry) = session.archive_set.part(part).cloned() else {
            debug!(part, "no file for this part number, nothing to delete");
            return;
        };

        tokio::time::sleep(self.config.delete_delay()).await;

        match self.remover.remove(&entry.path).await {
            Ok(()) => {
                info!(part, path = ?entry.path, "deleted consumed part");
                session.deleted_parts.push(part);
                self.emit(Event::PartDeleted {
                    part,
                    path: entry.path,
                });
            }
            Err(source) => {
                let err = Error::DeletionFailed {
                    path: entry.path.clone(),
                    source,
                };
                warn!(part, error = %err, "could not delete consumed part, leaving it for manual cleanup");
                session.undeletable_parts.push(part);
                self.emit(Event::PartDeleteFailed {
                    part,
                    path: entry.path,
                    error: err.to_string(),
                });
            }
        }
    }
}
