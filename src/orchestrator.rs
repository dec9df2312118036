//! Pipeline sequencing: locate → confirm → test → confirm → extract
//!
//! Nothing is deleted before the operator has confirmed and, unless disabled,
//! the integrity test has passed and been confirmed a second time. With the
//! test disabled the first confirmation leads straight to extraction.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::gate::Prompter;
use crate::locator::locate;
use crate::monitor::{ExtractionMonitor, FsPartRemover, PartRemover};
use crate::precheck::run_integrity_check;
use crate::tool::ArchiveTool;
use crate::types::{ArchiveSet, Event, ExtractionSession, SessionStatus};
use crate::utils::{format_parts_table, format_size};
use console::style;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Capacity of the event channel
const EVENT_CAPACITY: usize = 1024;

/// What the operator supplied up front; missing values are asked for
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    /// First part of the archive
    pub archive: Option<PathBuf>,
    /// Extraction destination
    pub destination: Option<PathBuf>,
}

/// Outcome of a run
#[must_use]
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Terminal state
    pub status: SessionStatus,
    /// Parts found, if the run got that far
    pub archive_set: Option<ArchiveSet>,
    /// Extraction session, if extraction started
    pub session: Option<ExtractionSession>,
    /// Tool diagnostics for failed runs
    pub diagnostics: Option<String>,
}

impl RunReport {
    fn cancelled(archive_set: Option<ArchiveSet>) -> Self {
        Self {
            status: SessionStatus::Cancelled,
            archive_set,
            session: None,
            diagnostics: None,
        }
    }

    /// Process exit status for this report
    pub fn exit_code(&self) -> i32 {
        self.status.exit_code()
    }

    /// The error to show the operator, for failed runs
    pub fn failure(&self) -> Option<Error> {
        let archive = self
            .archive_set
            .as_ref()
            .and_then(ArchiveSet::first_path)
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let diagnostics = self.diagnostics.clone().unwrap_or_default();

        match self.status {
            SessionStatus::FailedIntegrity => Some(Error::IntegrityCheckFailed {
                archive,
                diagnostics,
            }),
            SessionStatus::FailedExtraction => Some(Error::ExtractionFailed {
                archive,
                exit_code: self.session.as_ref().and_then(|s| s.exit_code),
                diagnostics,
            }),
            _ => None,
        }
    }
}

/// Runs the whole pipeline for one archive
pub struct Orchestrator {
    config: Arc<Config>,
    tool: ArchiveTool,
    prompter: Arc<dyn Prompter>,
    remover: Arc<dyn PartRemover>,
    event_tx: broadcast::Sender<Event>,
}

impl Orchestrator {
    /// Create an orchestrator with an already resolved tool
    pub fn new(config: Config, tool: ArchiveTool, prompter: Arc<dyn Prompter>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            config: Arc::new(config),
            tool,
            prompter,
            remover: Arc::new(FsPartRemover),
            event_tx,
        }
    }

    /// Create an orchestrator, resolving the tool from configuration
    ///
    /// # Errors
    ///
    /// [`Error::ToolMissing`] if the tool cannot be found; nothing has been
    /// touched at that point.
    pub fn from_config(config: Config, prompter: Arc<dyn Prompter>) -> Result<Self> {
        let tool = ArchiveTool::resolve(&config.tools)?;
        Ok(Self::new(config, tool, prompter))
    }

    /// Use a different part remover
    pub fn with_remover(mut self, remover: Arc<dyn PartRemover>) -> Self {
        self.remover = remover;
        self
    }

    /// Subscribe to progress events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The tool this orchestrator runs
    pub fn tool(&self) -> &ArchiveTool {
        &self.tool
    }

    /// Run the pipeline.
    ///
    /// Cancelled selections and declined confirmations produce a
    /// [`SessionStatus::Cancelled`] report. Test and extraction failures are
    /// reported through the status too; `Err` is reserved for faults such as
    /// a missing archive or a tool that cannot be started.
    pub async fn run(&self, request: RunRequest) -> Result<RunReport> {
        match self.run_pipeline(request).await {
            Err(Error::SelectionCancelled) => {
                info!("selection cancelled, nothing was changed");
                println!("Cancelled. Nothing was changed.");
                Ok(RunReport::cancelled(None))
            }
            other => other,
        }
    }

    async fn run_pipeline(&self, request: RunRequest) -> Result<RunReport> {
        let archive = match request.archive {
            Some(path) => path,
            None => self
                .ask(|p| p.pick_archive())
                .await?
                .ok_or(Error::SelectionCancelled)?,
        };

        let set = locate(&archive, &self.config.extraction)?;
        self.emit(Event::PartsDiscovered {
            base_name: set.base_name.clone(),
            count: set.len(),
        });
        println!(
            "\nFound {} part(s) of {}:\n{}\n",
            set.len(),
            style(&set.base_name).bold(),
            format_parts_table(&set)
        );

        let destination = match request.destination {
            Some(path) => path,
            None => {
                let suggested = set.directory.clone();
                self.ask(move |p| p.pick_destination(&suggested))
                    .await?
                    .ok_or(Error::SelectionCancelled)?
            }
        };

        let test_enabled = self.config.extraction.test_before_extract;
        if !test_enabled {
            warn!("integrity test disabled; a damaged archive may lose parts before the damage is found");
            println!(
                "{}",
                style("Warning: the integrity test is disabled. If the archive is damaged, parts may be deleted before extraction fails.")
                    .yellow()
                    .bold()
            );
        }

        let prompt = format!(
            "Extract {} into {} and delete each part once it has been consumed?",
            set.base_name,
            destination.display()
        );
        if !self.ask(move |p| p.confirm(&prompt)).await? {
            info!("operator declined, nothing was changed");
            println!("Cancelled. Nothing was changed.");
            return Ok(RunReport::cancelled(Some(set)));
        }

        if test_enabled {
            let archive = set.archive_path()?;
            self.emit(Event::IntegrityCheckStarted {
                archive: archive.to_path_buf(),
            });
            println!("{}", style("Testing archive integrity...").cyan());
            let outcome = run_integrity_check(&self.tool, archive, &set.directory).await?;
            self.emit(Event::IntegrityCheckFinished {
                passed: outcome.passed,
            });

            if !outcome.passed {
                return Ok(RunReport {
                    status: SessionStatus::FailedIntegrity,
                    archive_set: Some(set),
                    session: None,
                    diagnostics: Some(outcome.diagnostics),
                });
            }
            println!("{}", style("Integrity test passed.").green());

            let prompt = format!(
                "Start extracting {} now? Parts are deleted as they are consumed.",
                set.base_name
            );
            if !self.ask(move |p| p.confirm(&prompt)).await? {
                info!("operator declined after the integrity test, nothing was changed");
                println!("Cancelled. Nothing was changed.");
                return Ok(RunReport::cancelled(Some(set)));
            }
        } else {
            self.emit(Event::IntegrityCheckSkipped);
        }

        println!(
            "{} {}",
            style("Extracting into").cyan(),
            destination.display()
        );
        let monitor = ExtractionMonitor::new(self.tool.clone(), self.config.extraction.clone())
            .with_remover(Arc::clone(&self.remover))
            .with_events(self.event_tx.clone());
        let session = monitor.extract(&set, &destination).await?;

        print_summary(&session);

        let diagnostics = match session.status {
            SessionStatus::FailedExtraction => Some(session.diagnostics.clone()),
            _ => None,
        };
        Ok(RunReport {
            status: session.status,
            archive_set: Some(set),
            session: Some(session),
            diagnostics,
        })
    }

    /// Run a blocking prompt off the async runtime
    async fn ask<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn Prompter) -> T + Send + 'static,
        T: Send + 'static,
    {
        let prompter = Arc::clone(&self.prompter);
        tokio::task::spawn_blocking(move || f(prompter.as_ref()))
            .await
            .map_err(|e| Error::Other(format!("prompt task failed: {}", e)))
    }

    fn emit(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}

fn print_summary(session: &ExtractionSession) {
    println!("{}", format_summary(session));
}

/// Closing report: what was freed, what is left, and anything the tool complained about
fn format_summary(session: &ExtractionSession) -> String {
    let freed: u64 = session
        .deleted_parts
        .iter()
        .filter_map(|n| session.archive_set.part(*n))
        .map(|p| p.size_bytes)
        .sum();

    let mut lines = Vec::new();
    match session.status {
        SessionStatus::Succeeded => lines.push(format!(
            "\n{} Deleted {} of {} part(s), freed {}.",
            style("Done.").green().bold(),
            session.deleted_parts.len(),
            session.archive_set.len(),
            format_size(freed)
        )),
        _ => lines.push(format!(
            "\n{} {} part(s) already deleted ({} freed); part {} and later were kept.",
            style("Extraction did not finish.").red().bold(),
            session.deleted_parts.len(),
            format_size(freed),
            session.current_part
        )),
    }

    for part in session.remaining_parts() {
        lines.push(format!("  kept: {}", part.path.display()));
    }
    if !session.undeletable_parts.is_empty() {
        lines.push(
            style("Some consumed parts could not be deleted; remove them manually.")
                .yellow()
                .to_string(),
        );
    }

    // Failed runs carry their diagnostics in the reported error instead
    if session.status == SessionStatus::Succeeded && !session.diagnostics.is_empty() {
        lines.push(style("The archive tool reported warnings:").yellow().to_string());
        for line in session.diagnostics.lines() {
            lines.push(format!("  {line}"));
        }
    }

    lines.join("\n")
}
