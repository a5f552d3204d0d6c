mod cascade;
mod cli;
mod clipboard;
mod config;
mod content;
mod engine;
mod error;
mod file_scanner;
mod output;
mod persistence;
mod selection;
mod status;
mod tree;
mod tree_builder;
mod tui;
mod utils;
mod workflow;

use anyhow::Result;
use clap::Parser;
use config::{AppPaths, LOG_FILTER_ENV};
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

// Logs go to a daily file; the terminal belongs to the TUI. Without a usable log
// directory the run continues unlogged.
fn init_logging(paths: &AppPaths) -> Option<WorkerGuard> {
    if fs::create_dir_all(&paths.log_dir).is_err() {
        return None;
    }
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(14)
        .filename_prefix("treepick")
        .filename_suffix("log")
        .build(&paths.log_dir)
        .ok()?;
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let layer = fmt::layer().with_writer(writer).with_ansi(false).with_filter(filter);
    tracing_subscriber::registry().with(layer).try_init().ok()?;
    Some(guard)
}

fn main() -> Result<()> {
    // Handle daemon mode first. This should stay in main.rs as it's an early exit.
    if clipboard::check_and_run_daemon_if_requested()? {
        return Ok(());
    }

    let cli_args = cli::Cli::parse();
    let paths = AppPaths::resolve(cli_args.state_dir.clone());
    let _log_guard = init_logging(&paths);
    tracing::info!(state_dir = %paths.state_dir.display(), "starting treepick");

    workflow::run_treepick(cli_args, &paths)
}
