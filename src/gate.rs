//! Operator interaction: archive and destination selection, confirmation
//!
//! Deleting parts cannot be undone, so nothing destructive happens without an
//! explicit "y" or "yes". Empty input, anything else, and a terminal that
//! cannot be prompted all count as "no".

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Source of operator decisions
///
/// Methods block until the operator answers. `None` from a picker means the
/// operator cancelled.
pub trait Prompter: Send + Sync {
    /// Ask for the first part of the archive
    fn pick_archive(&self) -> Option<PathBuf>;

    /// Ask where to extract to; `suggested` is the parts' own directory
    fn pick_destination(&self, suggested: &Path) -> Option<PathBuf>;

    /// Ask a yes/no question; only an explicit affirmative returns `true`
    fn confirm(&self, prompt: &str) -> bool;
}

/// Whether `input` is an explicit affirmative answer
pub fn is_affirmative(input: &str) -> bool {
    matches!(input.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Interactive prompts on the controlling terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn ask_path(prompt: &str) -> Option<PathBuf> {
        let answer = Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text();

        match answer {
            Ok(text) => normalize_path_input(&text),
            Err(e) => {
                warn!(error = %e, "could not read from the terminal");
                None
            }
        }
    }
}

impl Prompter for TerminalPrompter {
    fn pick_archive(&self) -> Option<PathBuf> {
        Self::ask_path("First part of the archive (empty to cancel)")
    }

    fn pick_destination(&self, suggested: &Path) -> Option<PathBuf> {
        let items = [
            format!("Next to the archive ({})", suggested.display()),
            "Another folder...".to_string(),
        ];
        let choice = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Extract to (Esc to cancel)")
            .items(&items)
            .default(0)
            .interact_opt();

        match choice {
            Ok(Some(0)) => Some(suggested.to_path_buf()),
            Ok(Some(_)) => Self::ask_path("Destination folder (empty to cancel)"),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "could not read from the terminal");
                None
            }
        }
    }

    fn confirm(&self, prompt: &str) -> bool {
        let answer = Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("{prompt} [y/N]"))
            .allow_empty(true)
            .interact_text();

        match answer {
            Ok(text) => is_affirmative(&text),
            Err(e) => {
                warn!(error = %e, "could not read from the terminal, treating as no");
                false
            }
        }
    }
}

/// Turn typed or pasted path text into a path; empty means cancelled.
///
/// Strips surrounding quotes that file managers add when a file is dragged
/// onto a terminal.
pub fn normalize_path_input(text: &str) -> Option<PathBuf> {
    let trimmed = text.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| trimmed.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(trimmed)
        .trim();

    if unquoted.is_empty() {
        None
    } else {
        Some(PathBuf::from(unquoted))
    }
}
