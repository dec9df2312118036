//! Core types for rar-reclaim

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One physical part of a multi-part archive
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivePart {
    /// Sequence number parsed from the file name (`movie.part3.rar` → 3)
    pub number: u32,
    /// Absolute path of the part
    pub path: PathBuf,
    /// Size on disk when the part was discovered (informational)
    pub size_bytes: u64,
}

impl ArchivePart {
    /// File name of the part, lossily converted for display
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// All parts of one archive, ordered by sequence number
///
/// Built once by the locator and read-only afterwards. The locator never
/// returns an empty set, but one built by hand may be.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveSet {
    /// Shared file name prefix (`movie` for `movie.part1.rar`)
    pub base_name: String,
    /// Directory containing every part
    pub directory: PathBuf,
    /// Parts in ascending sequence order, unique sequence numbers
    pub parts: Vec<ArchivePart>,
}

impl ArchiveSet {
    /// The part with the lowest sequence number, which is handed to the tool
    pub fn first(&self) -> Option<&ArchivePart> {
        self.parts.first()
    }

    /// Look up a part by exact sequence number
    pub fn part(&self, number: u32) -> Option<&ArchivePart> {
        self.parts
            .binary_search_by_key(&number, |p| p.number)
            .ok()
            .map(|idx| &self.parts[idx])
    }

    /// Number of parts
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the set has no parts
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Total size of all parts in bytes
    pub fn total_size(&self) -> u64 {
        self.parts.iter().map(|p| p.size_bytes).sum()
    }

    /// Path of the first part
    pub fn first_path(&self) -> Option<&Path> {
        self.first().map(|p| p.path.as_path())
    }

    /// Path handed to the archive tool
    ///
    /// # Errors
    ///
    /// [`Error::NoPartsFound`] if the set is empty.
    pub fn archive_path(&self) -> Result<&Path> {
        self.first_path().ok_or_else(|| Error::NoPartsFound {
            directory: self.directory.clone(),
            base_name: self.base_name.clone(),
        })
    }
}

/// Terminal state of a run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Extraction in progress
    Running,
    /// The tool exited with status 0 and the final part was handled
    Succeeded,
    /// The integrity test failed; nothing was extracted or deleted
    FailedIntegrity,
    /// The tool exited with a non-zero status during extraction
    FailedExtraction,
    /// The operator declined a prompt or cancelled a picker
    Cancelled,
    /// Any other fatal condition
    Error,
}

impl SessionStatus {
    /// Process exit status for this outcome
    pub fn exit_code(self) -> i32 {
        match self {
            SessionStatus::Succeeded | SessionStatus::Cancelled => 0,
            _ => 1,
        }
    }

    /// Returns `true` once the session has left `Running`
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionStatus::Running)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionStatus::Running => "running",
            SessionStatus::Succeeded => "succeeded",
            SessionStatus::FailedIntegrity => "failed integrity check",
            SessionStatus::FailedExtraction => "failed extraction",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// State of one extraction run, owned and mutated by the extraction monitor
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtractionSession {
    /// The archive being extracted
    pub archive_set: ArchiveSet,
    /// Where the tool writes its output
    pub destination: PathBuf,
    /// Part the tool is currently reading; never decreases
    pub current_part: u32,
    /// Parts removed from disk, in deletion order
    pub deleted_parts: Vec<u32>,
    /// Parts whose deletion was attempted but failed; left on disk
    pub undeletable_parts: Vec<u32>,
    /// Current state
    pub status: SessionStatus,
    /// Exit code reported by the tool once it has exited
    pub exit_code: Option<i32>,
    /// Error-stream text captured from the tool
    pub diagnostics: String,
}

impl ExtractionSession {
    /// Start a session tracking part 1
    pub fn new(archive_set: ArchiveSet, destination: PathBuf) -> Self {
        Self {
            archive_set,
            destination,
            current_part: 1,
            deleted_parts: Vec::new(),
            undeletable_parts: Vec::new(),
            status: SessionStatus::Running,
            exit_code: None,
            diagnostics: String::new(),
        }
    }

    /// Parts still present on disk as far as this session knows
    pub fn remaining_parts(&self) -> Vec<&ArchivePart> {
        self.archive_set
            .parts
            .iter()
            .filter(|p| !self.deleted_parts.contains(&p.number))
            .collect()
    }
}

/// Events published while a run progresses
///
/// Consumers subscribe via [`crate::Orchestrator::subscribe`] or pass a sender
/// to [`crate::ExtractionMonitor`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The locator found the archive's parts
    PartsDiscovered {
        /// Shared base name
        base_name: String,
        /// Number of parts found
        count: usize,
    },

    /// The integrity test started
    IntegrityCheckStarted {
        /// Archive handed to the tool
        archive: PathBuf,
    },

    /// The integrity test finished
    IntegrityCheckFinished {
        /// Whether the tool reported success
        passed: bool,
    },

    /// The integrity test was disabled by configuration
    IntegrityCheckSkipped,

    /// The extraction tool was started
    ExtractionStarted {
        /// Archive handed to the tool
        archive: PathBuf,
        /// Output directory
        destination: PathBuf,
    },

    /// The tool moved from one part to a later one
    PartTransition {
        /// Part that was vacated
        from: u32,
        /// Part now being read
        to: u32,
    },

    /// A consumed part was removed from disk
    PartDeleted {
        /// Sequence number of the part
        part: u32,
        /// Path that was removed
        path: PathBuf,
    },

    /// Removing a consumed part failed; it stays on disk
    PartDeleteFailed {
        /// Sequence number of the part
        part: u32,
        /// Path that could not be removed
        path: PathBuf,
        /// Error description
        error: String,
    },

    /// The extraction tool exited
    ExtractionFinished {
        /// Terminal state of the session
        status: SessionStatus,
        /// Exit code reported by the tool
        exit_code: Option<i32>,
    },
}
