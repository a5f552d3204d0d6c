use crate::cli::Cli;
use crate::config::AppPaths;
use crate::content::{ContentInbox, ThreadedContentLoader};
use crate::engine::SelectionEngine;
use crate::file_scanner::FsTreeSource;
use crate::persistence::{JsonFileStore, SelectionGateway};
use crate::{output, tui};
use anyhow::{Result, bail};
use glob::Pattern;
use std::path::PathBuf;

// Compiles the --preselect globs. An invalid pattern aborts the run, same as a typo in a
// path would.
fn compile_patterns(raw: &[String]) -> Result<Vec<Pattern>> {
    raw.iter()
        .map(|s| match Pattern::new(s) {
            Ok(p) => Ok(p),
            Err(e) => bail!("invalid --preselect glob pattern '{}': {}", s, e),
        })
        .collect()
}

fn resolve_root(cli_args: &Cli) -> Result<PathBuf> {
    if !cli_args.root.is_dir() {
        bail!("{} is not a directory", cli_args.root.display());
    }
    Ok(cli_args
        .root
        .canonicalize()
        .unwrap_or_else(|_| cli_args.root.clone()))
}

fn build_engine(cli_args: &Cli, paths: &AppPaths) -> (SelectionEngine, ContentInbox) {
    let gateway = if cli_args.no_persist {
        SelectionGateway::in_memory()
    } else {
        SelectionGateway::new(Box::new(JsonFileStore::new(&paths.state_dir)))
    };
    let source = FsTreeSource::new(cli_args.types.clone(), cli_args.include_ignored);
    let (loader, inbox) = ThreadedContentLoader::new();
    let engine = SelectionEngine::new(Box::new(source), gateway, Box::new(loader));
    (engine, inbox)
}

// Blocks until every live selected file has its content (or its read error).
fn collect_pending_content(engine: &mut SelectionEngine, inbox: &ContentInbox) {
    for reply in inbox.drain() {
        engine.on_content(reply);
    }
    let pending = engine.pending_tickets();
    if pending.is_empty() {
        return;
    }
    tracing::debug!(count = pending.len(), "waiting for file contents");
    for reply in inbox.wait_for(&pending) {
        engine.on_content(reply);
    }
}

// Main orchestrator: open the workspace, let the user pick, then yank.
pub fn run_treepick(cli_args: Cli, paths: &AppPaths) -> Result<()> {
    let root = resolve_root(&cli_args)?;
    let preselect = compile_patterns(&cli_args.preselect)?;

    let (mut engine, inbox) = build_engine(&cli_args, paths);
    engine.open_workspace(&root);

    if cli_args.clear {
        engine.clear_selection();
    }
    if !preselect.is_empty() {
        let change = engine.select_matching(&preselect);
        tracing::info!(added = change.added.len(), "applied --preselect patterns");
        if change.added.is_empty() && engine.selection().is_empty() {
            println!("No files matched the --preselect patterns.");
        }
    }

    let (mut engine, inbox) = if cli_args.headless {
        (engine, inbox)
    } else {
        let (engine, inbox, confirmed) = tui::run_tui_with_engine(engine, inbox)?;
        if !confirmed {
            println!("Selection cancelled. Your picks are kept for next time.");
            return Ok(());
        }
        (engine, inbox)
    };

    let stale = engine.stale_selection();
    if !stale.is_empty() {
        eprintln!(
            "⚠️ Warning: {} remembered file(s) no longer exist and were skipped.",
            stale.len()
        );
    }

    collect_pending_content(&mut engine, &inbox);
    let files = engine.selected_files();
    let output_string = output::compose_output(engine.tree(), &files);
    output::deliver(&output_string, files.len(), cli_args.dry_run)
}
