//! Lifetime policy configuration for gpu-reaper
//!
//! Supports a JSON policy file with:
//! - Excluded namespaces
//! - A default termination window
//! - Namespace and pod level window overrides
//! - Validation with errors naming the offending path

mod policy;
mod schema;
mod source;
mod validation;

pub use policy::*;
pub use schema::*;
pub use source::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[source] std::io::Error),

    #[error("Failed to write config file: {0}")]
    WriteError(#[source] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Validation failed: {}", format_errors(.errors))]
    ValidationFailed { errors: Vec<ValidationError> },
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Load and validate configuration from a JSON file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Policy> {
    let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
    parse_config(&content)
}

/// Parse and validate configuration from a JSON string
pub fn parse_config(content: &str) -> ConfigResult<Policy> {
    let raw: RawConfig = serde_json::from_str(content)?;

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(Policy::from_raw(raw))
}

/// Write the bootstrap policy to `path`, creating parent directories
pub fn write_default_config(path: impl AsRef<Path>) -> ConfigResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(ConfigError::WriteError)?;
    }

    let content = serde_json::to_string_pretty(&RawConfig::default())?;
    std::fs::write(path, content).map_err(ConfigError::WriteError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reaper_util::{TerminationWindow, WorkloadId};

    #[test]
    fn parse_minimal_config() {
        let config = r#"{ "default_termination_window": "3h" }"#;

        let policy = parse_config(config).unwrap();
        assert!(policy.excluded_namespaces.is_empty());
        assert_eq!(policy.default_window, TerminationWindow::from_hours(3));
    }

    #[test]
    fn parse_overrides() {
        let config = r#"{
            "excluded_namespaces": ["kube-system", "kubeflow"],
            "default_termination_window": "2h",
            "namespaces": {
                "ns1": {
                    "termination_window": "1h",
                    "pods": { "p1": { "termination_window": "0.5h" } }
                }
            }
        }"#;

        let policy = parse_config(config).unwrap();
        assert_eq!(
            policy.resolve_window(&WorkloadId::new("ns1", "p1")),
            TerminationWindow::from_minutes(30)
        );
        assert_eq!(
            policy.resolve_window(&WorkloadId::new("ns1", "p2")),
            TerminationWindow::from_hours(1)
        );
    }

    #[test]
    fn one_bad_node_fails_the_whole_load() {
        let config = r#"{
            "default_termination_window": "2h",
            "namespaces": {
                "ns1": { "termination_window": "1h" },
                "ns2": { "termination_window": "forever" }
            }
        }"#;

        match parse_config(config) {
            Err(ConfigError::ValidationFailed { errors }) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].path(), "namespaces.ns2.termination_window");
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn reject_missing_default() {
        let result = parse_config(r#"{ "excluded_namespaces": [] }"#);
        assert!(matches!(result, Err(ConfigError::ValidationFailed { .. })));
    }

    #[test]
    fn reject_invalid_json() {
        let result = parse_config("{ not json");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn validation_message_lists_paths() {
        let err = parse_config(r#"{ "default_termination_window": "2x" }"#).unwrap_err();
        assert!(err.to_string().contains("default_termination_window"));
    }

    #[test]
    fn written_default_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("pod_config.json");

        write_default_config(&path).unwrap();
        let policy = load_config(&path).unwrap();
        assert_eq!(policy, Policy::default());
    }
}
