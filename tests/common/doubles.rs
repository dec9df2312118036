//! Test doubles for the operator and the filesystem

use async_trait::async_trait;
use rar_reclaim::{FsPartRemover, PartRemover, Prompter};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Prompter answering from a script
pub struct ScriptedPrompter {
    archive: Option<PathBuf>,
    destination: Option<PathBuf>,
    answers: Mutex<VecDeque<bool>>,
    pub confirmations: AtomicUsize,
    pub destination_requests: AtomicUsize,
}

impl ScriptedPrompter {
    pub fn new(archive: Option<PathBuf>, destination: Option<PathBuf>, answers: &[bool]) -> Self {
        Self {
            archive,
            destination,
            answers: Mutex::new(answers.iter().copied().collect()),
            confirmations: AtomicUsize::new(0),
            destination_requests: AtomicUsize::new(0),
        }
    }

    /// Confirms everything, never used as a picker
    pub fn approving() -> Self {
        Self::new(None, None, &[true, true, true])
    }

    pub fn confirmations(&self) -> usize {
        self.confirmations.load(Ordering::SeqCst)
    }
}

impl Prompter for ScriptedPrompter {
    fn pick_archive(&self) -> Option<PathBuf> {
        self.archive.clone()
    }

    fn pick_destination(&self, _suggested: &Path) -> Option<PathBuf> {
        self.destination_requests.fetch_add(1, Ordering::SeqCst);
        self.destination.clone()
    }

    fn confirm(&self, _prompt: &str) -> bool {
        self.confirmations.fetch_add(1, Ordering::SeqCst);
        self.answers.lock().unwrap().pop_front().unwrap_or(false)
    }
}

/// Remover that records every call and fails for selected file names
#[derive(Default)]
pub struct RecordingRemover {
    failing: HashSet<String>,
    pub calls: Mutex<Vec<PathBuf>>,
}

impl RecordingRemover {
    pub fn failing_for(names: &[&str]) -> Self {
        Self {
            failing: names.iter().map(|s| s.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_names(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }
}

#[async_trait]
impl PartRemover for RecordingRemover {
    async fn remove(&self, path: &Path) -> std::io::Result<()> {
        self.calls.lock().unwrap().push(path.to_path_buf());
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        if self.failing.contains(&name) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "file is locked",
            ));
        }
        FsPartRemover.remove(path).await
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
