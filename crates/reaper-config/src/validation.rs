//! Configuration validation

use crate::schema::RawConfig;
use reaper_util::{ParseError, parse_window};
use std::collections::HashSet;
use thiserror::Error;

/// Validation error, naming the offending path in the policy file
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{path}: {source}")]
    InvalidWindow { path: String, source: ParseError },

    #[error("{0}: required field is missing")]
    MissingField(String),

    #[error("{0}: window must be greater than zero")]
    ZeroWindow(String),

    #[error("excluded_namespaces: empty namespace name")]
    EmptyExcludedNamespace,

    #[error("excluded_namespaces: duplicate namespace '{0}'")]
    DuplicateExcludedNamespace(String),
}

impl ValidationError {
    /// Path of the offending node in the policy file
    pub fn path(&self) -> &str {
        match self {
            Self::InvalidWindow { path, .. } => path,
            Self::MissingField(path) | Self::ZeroWindow(path) => path,
            Self::EmptyExcludedNamespace | Self::DuplicateExcludedNamespace(_) => {
                "excluded_namespaces"
            }
        }
    }
}

/// Validate a raw configuration
///
/// Every window string in the file is parsed; all problems are collected so
/// operators can fix a file in one pass.
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut seen = HashSet::new();
    for ns in &config.excluded_namespaces {
        if ns.trim().is_empty() {
            errors.push(ValidationError::EmptyExcludedNamespace);
        } else if !seen.insert(ns.as_str()) {
            errors.push(ValidationError::DuplicateExcludedNamespace(ns.clone()));
        }
    }

    const DEFAULT_PATH: &str = "default_termination_window";
    match &config.default_termination_window {
        None => errors.push(ValidationError::MissingField(DEFAULT_PATH.into())),
        Some(raw) => match parse_window(raw) {
            Ok(window) if window.is_zero() => {
                errors.push(ValidationError::ZeroWindow(DEFAULT_PATH.into()));
            }
            Ok(_) => {}
            Err(source) => errors.push(ValidationError::InvalidWindow {
                path: DEFAULT_PATH.into(),
                source,
            }),
        },
    }

    for (ns_name, ns) in &config.namespaces {
        if let Some(raw) = &ns.termination_window {
            check_window(
                &mut errors,
                format!("namespaces.{}.termination_window", ns_name),
                raw,
            );
        }

        for (pod_name, pod) in &ns.pods {
            check_window(
                &mut errors,
                format!("namespaces.{}.pods.{}.termination_window", ns_name, pod_name),
                &pod.termination_window,
            );
        }
    }

    errors
}

fn check_window(errors: &mut Vec<ValidationError>, path: String, raw: &str) {
    if let Err(source) = parse_window(raw) {
        errors.push(ValidationError::InvalidWindow { path, source });
    }
}
