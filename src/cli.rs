use clap::Parser;
use std::path::PathBuf;

/// treepick – pick workspace files in a checkbox tree and yank them as one snippet
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Workspace root to scan (defaults to CWD)
    #[arg(value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Comma-separated file-types to include (extension only, no dot).
    #[arg(long, value_delimiter = ',', value_name = "EXTENSIONS")]
    pub types: Vec<String>,

    /// Include files ignored by .gitignore
    #[arg(long)]
    pub include_ignored: bool,

    /// Glob patterns to preselect files (e.g., "src/**/*.rs", "tests/test_*.py").
    /// Paths are relative to the root directory.
    /// Can be specified multiple times using --preselect <PATTERN_1> --preselect <PATTERN_2> ...
    #[arg(long, value_name = "PATTERN")]
    pub preselect: Vec<String>,

    /// Skip the TUI: yank the remembered selection plus any --preselect matches.
    #[arg(long)]
    pub headless: bool,

    /// Print the snippet instead of copying it.
    #[arg(long)]
    pub dry_run: bool,

    /// Where per-workspace selections are stored (overrides $TREEPICK_STATE_DIR).
    #[arg(long, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    /// Keep the selection in memory only for this run.
    #[arg(long)]
    pub no_persist: bool,

    /// Forget the remembered selection for this workspace before starting.
    #[arg(long)]
    pub clear: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repeatable_preselect_and_types() {
        let cli = Cli::try_parse_from([
            "treepick",
            "ws",
            "--types",
            "rs,toml",
            "--preselect",
            "src/*.rs",
            "--preselect",
            "Cargo.toml",
            "--headless",
        ])
        .unwrap();
        assert_eq!(cli.root, PathBuf::from("ws"));
        assert_eq!(cli.types, vec!["rs", "toml"]);
        assert_eq!(cli.preselect.len(), 2);
        assert!(cli.headless);
        assert!(!cli.clear);
    }

    #[test]
    fn root_defaults_to_current_directory() {
        let cli = Cli::try_parse_from(["treepick"]).unwrap();
        assert_eq!(cli.root, PathBuf::from("."));
    }
}
