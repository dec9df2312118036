//! Configuration types for rar-reclaim

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder substituted with the archive's base name in [`ExtractionConfig::part_file_pattern`]
pub const BASE_PLACEHOLDER: &str = "{base}";

/// External tool location
///
/// Groups settings for finding the archiving executable.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to the unrar executable (auto-detected if None)
    #[serde(default)]
    pub tool_path: Option<PathBuf>,

    /// Whether to search PATH for the tool if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            tool_path: None,
            search_path: true,
        }
    }
}

/// Extraction behavior: precheck, part discovery and deletion timing
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Run an integrity test before extracting (default: true)
    ///
    /// Turning this off forfeits the guarantee that nothing is deleted from a
    /// corrupt archive.
    #[serde(default = "default_true")]
    pub test_before_extract: bool,

    /// Delay before deleting a vacated part, in milliseconds (default: 500)
    ///
    /// Gives the tool time to release its handle on the part. Best effort only.
    #[serde(default = "default_delete_delay_ms")]
    pub delete_delay_ms: u64,

    /// Delay after a successful exit before deleting the final part, in milliseconds (default: 1000)
    #[serde(default = "default_final_settle_ms")]
    pub final_settle_ms: u64,

    /// Glob used to discover sibling parts (default: "{base}.part*.rar")
    ///
    /// `{base}` is replaced with the archive's base name. `*` and `?` are
    /// wildcards and matching ignores ASCII case.
    #[serde(default = "default_part_file_pattern")]
    pub part_file_pattern: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            test_before_extract: true,
            delete_delay_ms: default_delete_delay_ms(),
            final_settle_ms: default_final_settle_ms(),
            part_file_pattern: default_part_file_pattern(),
        }
    }
}

impl ExtractionConfig {
    /// Delay before deleting a vacated part
    pub fn delete_delay(&self) -> Duration {
        Duration::from_millis(self.delete_delay_ms)
    }

    /// Delay before deleting the final part after a successful run
    pub fn final_settle(&self) -> Duration {
        Duration::from_millis(self.final_settle_ms)
    }
}

/// Console behavior
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Seconds to keep the console open after a fatal error (default: 10)
    #[serde(default = "default_error_display_seconds")]
    pub error_display_seconds: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            error_display_seconds: default_error_display_seconds(),
        }
    }
}

impl ConsoleConfig {
    /// How long to hold the console open after a fatal error
    pub fn error_display(&self) -> Duration {
        Duration::from_secs(self.error_display_seconds)
    }
}

/// Main configuration
///
/// Built once at startup and passed by reference to every component.
/// Sub-configs are flattened, so the JSON document is a single flat object:
///
/// ```json
/// {
///   "tool_path": "/usr/bin/unrar",
///   "delete_delay_ms": 500,
///   "test_before_extract": true
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// External tool location
    #[serde(flatten)]
    pub tools: ToolsConfig,

    /// Extraction behavior
    #[serde(flatten)]
    pub extraction: ExtractionConfig,

    /// Console behavior
    #[serde(flatten)]
    pub console: ConsoleConfig,
}

impl Config {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants serde cannot express
    pub fn validate(&self) -> Result<()> {
        let pattern = &self.extraction.part_file_pattern;
        if pattern.trim().is_empty() {
            return Err(Error::config(
                "part_file_pattern must not be empty",
                "part_file_pattern",
            ));
        }
        if !pattern.contains(BASE_PLACEHOLDER) {
            return Err(Error::config(
                format!("part_file_pattern must contain {BASE_PLACEHOLDER}"),
                "part_file_pattern",
            ));
        }
        if pattern.contains('/') || pattern.contains('\\') {
            return Err(Error::config(
                "part_file_pattern must be a file name pattern, not a path",
                "part_file_pattern",
            ));
        }
        if let Some(tool) = &self.tools.tool_path
            && tool.as_os_str().is_empty()
        {
            return Err(Error::config("tool_path must not be empty", "tool_path"));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_delete_delay_ms() -> u64 {
    500
}

fn default_final_settle_ms() -> u64 {
    1000
}

fn default_part_file_pattern() -> String {
    format!("{BASE_PLACEHOLDER}.part*.rar")
}

fn default_error_display_seconds() -> u64 {
    10
}
