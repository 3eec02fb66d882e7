//! Storage locations for usage tracking.
//!
//! Everything lives under a single config directory, `~/.kimi-claude` by
//! default:
//! - `usage.log` - append-only usage event log
//! - `usage_stats.json` - running statistics document

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Name of the default config directory under the user's home.
const CONFIG_DIR_NAME: &str = ".kimi-claude";

/// Usage log file name.
const USAGE_LOG_FILE: &str = "usage.log";

/// Stats document file name.
const STATS_FILE: &str = "usage_stats.json";

/// Returns the default config directory: `~/.kimi-claude`.
///
/// Does not create the directory; `UsageTracker::new` does that.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn default_config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().context("Could not determine home directory for usage tracking")?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Returns the usage log path inside `config_dir`.
pub fn usage_log_path(config_dir: &Path) -> PathBuf {
    config_dir.join(USAGE_LOG_FILE)
}

/// Returns the stats document path inside `config_dir`.
pub fn stats_path(config_dir: &Path) -> PathBuf {
    config_dir.join(STATS_FILE)
}
