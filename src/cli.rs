//! Command-line arguments and their mapping onto [`Config`]

use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "rar-reclaim")]
#[command(version)]
#[command(
    about = "Extract a multi-part RAR archive, deleting each part once it has been consumed",
    long_about = None
)]
#[command(after_help = "Examples:\n  \
  rar-reclaim movie.part01.rar               test, confirm, then extract next to the parts\n  \
  rar-reclaim movie.part01.rar -d /mnt/out   extract into /mnt/out\n  \
  rar-reclaim                                choose the archive interactively")]
pub struct Cli {
    /// First part of the archive (asked for interactively if omitted)
    #[arg(value_name = "ARCHIVE")]
    pub archive: Option<PathBuf>,

    /// Extract into this directory instead of asking
    #[arg(short = 'd', long = "dest", value_name = "DIR")]
    pub destination: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the unrar executable
    #[arg(long, value_name = "PATH")]
    pub tool: Option<PathBuf>,

    /// Skip the integrity test (parts may be deleted from a damaged archive)
    #[arg(long)]
    pub skip_test: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Default tracing filter for the chosen verbosity
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(tool) = &self.tool {
            config.tools.tool_path = Some(tool.clone());
        }
        if self.skip_test {
            config.extraction.test_before_extract = false;
        }
    }
}
