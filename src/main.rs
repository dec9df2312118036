//! Main entry point for the rar-reclaim CLI application.
//!
//! Parses arguments, loads configuration, runs the pipeline and maps the
//! outcome to a process exit status. On failure the console is held open for
//! `error_display_seconds` so a double-click or drag-and-drop launch does not
//! close before the message can be read.

use clap::Parser;
use console::style;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use tracing_subscriber::EnvFilter;

use rar_reclaim::{
    Cli, Config, Error, Orchestrator, RunRequest, TerminalPrompter, ToExitCode, wait_for_signal,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            report_error(&e);
            pause(Config::default().console.error_display()).await;
            std::process::exit(e.exit_code());
        }
    };
    let hold = config.console.error_display();

    // Run on its own task so a panic comes back as a JoinError instead of
    // tearing down the console before the operator has read anything
    let mut task = tokio::spawn(async move { run(&cli, config).await });

    let (code, interrupted) = tokio::select! {
        joined = &mut task => (exit_code_of(joined), false),
        _ = wait_for_signal() => {
            // Aborting drops the run, which kills the archive tool if it is running
            task.abort();
            let _ = task.await;
            report_error(&Error::Interrupted);
            (Error::Interrupted.exit_code(), true)
        }
    };

    if code != 0 && !interrupted {
        pause(hold).await;
    }

    // Exit explicitly: a prompt may still be blocked reading the terminal
    std::process::exit(code);
}

/// Install the tracing subscriber; `RUST_LOG` overrides the verbosity flags
fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> rar_reclaim::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    cli.apply_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

/// Run the pipeline and turn the outcome into an exit status
async fn run(cli: &Cli, config: Config) -> i32 {
    let orchestrator = match Orchestrator::from_config(config, Arc::new(TerminalPrompter)) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            report_error(&e);
            return e.exit_code();
        }
    };
    tracing::debug!(tool = ?orchestrator.tool().binary_path(), "archive tool resolved");

    let request = RunRequest {
        archive: cli.archive.clone(),
        destination: cli.destination.clone(),
    };

    match orchestrator.run(request).await {
        Ok(report) => {
            if let Some(failure) = report.failure() {
                report_error(&failure);
            }
            report.exit_code()
        }
        Err(e) => {
            report_error(&e);
            e.exit_code()
        }
    }
}

/// Exit status of the run task; a panic is reported like any other fault
fn exit_code_of(joined: Result<i32, JoinError>) -> i32 {
    match joined {
        Ok(code) => code,
        Err(e) => {
            let err = if e.is_panic() {
                Error::Other("internal error: the run panicked".to_string())
            } else {
                Error::Other(format!("run task failed: {e}"))
            };
            report_error(&err);
            err.exit_code()
        }
    }
}

/// Print an error in a form that stands out from the tool's own output
fn report_error(err: &Error) {
    tracing::error!(code = err.error_code(), error = %err, "run failed");
    eprintln!();
    eprintln!("{} {}", style("ERROR:").red().bold(), style(err).red());

    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        eprintln!("  caused by: {}", cause);
        source = cause.source();
    }
}

/// Hold the console open, counting down once per second
async fn pause(duration: Duration) {
    let secs = duration.as_secs();
    if secs == 0 {
        return;
    }
    for remaining in (1..=secs).rev() {
        eprint!("\rClosing in {remaining:>3}s...");
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    eprintln!();
}
