use directories::ProjectDirs;
use std::path::PathBuf;

pub const STATE_DIR_ENV: &str = "TREEPICK_STATE_DIR";
pub const LOG_FILTER_ENV: &str = "TREEPICK_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub state_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl AppPaths {
    /// Resolves where selections and logs live.
    ///
    /// Precedence for the state directory: `cli_state_dir`, then `TREEPICK_STATE_DIR`,
    /// then the platform data directory. Without a platform data directory everything
    /// falls back to `.treepick/` under the current directory.
    pub fn resolve(cli_state_dir: Option<PathBuf>) -> Self {
        let env_state_dir = std::env::var_os(STATE_DIR_ENV).map(PathBuf::from);
        Self::resolve_with(cli_state_dir, env_state_dir, platform_data_dir())
    }

    fn resolve_with(
        cli_state_dir: Option<PathBuf>,
        env_state_dir: Option<PathBuf>,
        data_dir: Option<PathBuf>,
    ) -> Self {
        let base = data_dir.unwrap_or_else(|| PathBuf::from(".treepick"));
        let state_dir = cli_state_dir
            .or(env_state_dir)
            .unwrap_or_else(|| base.join("state"));
        AppPaths {
            state_dir,
            log_dir: base.join("logs"),
        }
    }
}

fn platform_data_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "github", "treepick").map(|dirs| dirs.data_local_dir().to_path_buf())
}
