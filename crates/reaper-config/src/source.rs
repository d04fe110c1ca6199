//! Where the reconciler reads its policy from each cycle

use crate::{ConfigError, ConfigResult, Policy, parse_config, write_default_config};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

/// Source of the current policy, re-read at the start of every cycle
pub trait ConfigSource: Send + Sync {
    fn load(&self) -> ConfigResult<Policy>;
}

/// Policy file on disk
///
/// A missing or empty file is replaced by the bootstrap policy.
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    path: PathBuf,
}

impl FileConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn bootstrap(&self) -> Policy {
        match write_default_config(&self.path) {
            Ok(()) => info!(path = %self.path.display(), "Created default config file"),
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to write default config file, using defaults in memory"
            ),
        }
        Policy::default()
    }
}

impl ConfigSource for FileConfigSource {
    fn load(&self) -> ConfigResult<Policy> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(self.bootstrap()),
            Err(e) => return Err(ConfigError::ReadError(e)),
        };

        if content.trim().is_empty() {
            return Ok(self.bootstrap());
        }

        parse_config(&content)
    }
}

/// In-memory policy text, swappable at runtime
#[derive(Debug)]
pub struct MemoryConfigSource {
    content: Mutex<String>,
}

impl MemoryConfigSource {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: Mutex::new(content.into()),
        }
    }

    /// Replace the policy text seen by the next `load`
    pub fn set(&self, content: impl Into<String>) {
        *self.content.lock().unwrap() = content.into();
    }
}

impl ConfigSource for MemoryConfigSource {
    fn load(&self) -> ConfigResult<Policy> {
        parse_config(&self.content.lock().unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reaper_util::TerminationWindow;

    #[test]
    fn missing_file_is_bootstrapped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pod_config.json");
        let source = FileConfigSource::new(&path);

        let policy = source.load().unwrap();
        assert_eq!(policy, Policy::default());
        assert!(path.exists());

        // Second load reads what was written
        assert_eq!(source.load().unwrap(), Policy::default());
    }

    #[test]
    fn empty_file_is_bootstrapped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pod_config.json");
        std::fs::write(&path, "  \n").unwrap();

        let policy = FileConfigSource::new(&path).load().unwrap();
        assert_eq!(policy, Policy::default());
        assert!(!std::fs::read_to_string(&path).unwrap().trim().is_empty());
    }

    #[test]
    fn edits_are_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pod_config.json");
        let source = FileConfigSource::new(&path);
        source.load().unwrap();

        std::fs::write(&path, r#"{ "default_termination_window": "1d" }"#).unwrap();
        let policy = source.load().unwrap();
        assert_eq!(policy.default_window, TerminationWindow::from_hours(24));
    }

    #[test]
    fn invalid_file_is_an_error_not_a_bootstrap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pod_config.json");
        std::fs::write(&path, "{ broken").unwrap();

        assert!(FileConfigSource::new(&path).load().is_err());
        // The operator's file is left alone
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ broken");
    }

    #[test]
    fn memory_source_swaps_content() {
        let source = MemoryConfigSource::new(r#"{ "default_termination_window": "2h" }"#);
        assert_eq!(source.load().unwrap().default_window, TerminationWindow::from_hours(2));

        source.set("nope");
        assert!(source.load().is_err());
    }
}
