use anyhow::Context;
use orch_core::paths::{absolutize, DEFAULT_RUNS_DIR};
use orch_core::Config;
use std::path::{Path, PathBuf};

/// Everything a command needs that does not come from its own arguments.
pub struct Settings {
    pub runs_root: PathBuf,
    pub config: Config,
}

/// Resolve the runs root and provider config.
///
/// Runs root priority:
/// 1. `--runs-root` flag / `ORCH_RUNS_ROOT` env var (passed in as `explicit`)
/// 2. `runs_root` in the config file
/// 3. `audit/runs` under the current directory
///
/// Relative paths are anchored at the current directory.
pub fn resolve(explicit: Option<&Path>, config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;

    let config_path = config_path.map(|p| absolutize(p, &cwd));
    let mut config = Config::load(config_path.as_deref()).context("failed to load config")?;
    config.apply_env(|key| std::env::var(key).ok());

    let runs_root = explicit
        .map(Path::to_path_buf)
        .or_else(|| config.runs_root.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_RUNS_DIR));

    Ok(Settings {
        runs_root: absolutize(&runs_root, &cwd),
        config,
    })
}

/// Anchor a user-supplied ticket path at the current directory.
pub fn ticket_path(ticket: &Path) -> anyhow::Result<PathBuf> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    Ok(absolutize(ticket, &cwd))
}
