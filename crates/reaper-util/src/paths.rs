//! Default paths for gpu-reaper components
//!
//! Paths are user-writable by default (no root required):
//! - Policy file: `$XDG_CONFIG_HOME/gpu-reaper/pod_config.json` or `~/.config/gpu-reaper/pod_config.json`
//! - Logs: `$XDG_STATE_HOME/gpu-reaper` or `~/.local/state/gpu-reaper`

use std::path::PathBuf;

/// Environment variable for overriding the policy file path
pub const REAPER_CONFIG_ENV: &str = "REAPER_CONFIG";

/// Policy filename within the config directory
const CONFIG_FILENAME: &str = "pod_config.json";

/// Application subdirectory name
const APP_DIR: &str = "gpu-reaper";

/// Get the default policy file path.
///
/// Order of precedence:
/// 1. `$REAPER_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/gpu-reaper/pod_config.json` (if XDG_CONFIG_HOME is set)
/// 3. `~/.config/gpu-reaper/pod_config.json` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(REAPER_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    config_path_without_env()
}

/// Get the policy file path without checking the REAPER_CONFIG env var.
pub fn config_path_without_env() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    // Last resort: alongside the process, as a plain script would
    PathBuf::from(CONFIG_FILENAME)
}

/// Get the default log directory.
///
/// Order of precedence:
/// 1. `$XDG_STATE_HOME/gpu-reaper` (if XDG_STATE_HOME is set)
/// 2. `~/.local/state/gpu-reaper` (fallback)
pub fn default_log_dir() -> PathBuf {
    if let Ok(state_home) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(state_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("state")
            .join(APP_DIR);
    }

    PathBuf::from("/tmp").join(APP_DIR).join("logs")
}
