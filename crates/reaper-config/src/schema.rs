//! Raw configuration schema (as parsed from JSON)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Namespaces seeded into a freshly bootstrapped policy file
pub const DEFAULT_EXCLUDED_NAMESPACES: &[&str] = &["kube-system", "kubeflow"];

/// Window applied when no namespace or pod override matches
pub const DEFAULT_TERMINATION_WINDOW: &str = "2h";

/// Raw configuration as parsed from the policy file
///
/// Unknown keys are ignored, so files carrying older bookkeeping sections
/// still load.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawConfig {
    /// Namespaces whose workloads are never evaluated
    #[serde(default)]
    pub excluded_namespaces: Vec<String>,

    /// Window applied when nothing more specific matches. Required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_termination_window: Option<String>,

    /// Per-namespace overrides
    #[serde(default)]
    pub namespaces: BTreeMap<String, RawNamespace>,
}

impl Default for RawConfig {
    /// The policy written when no file exists yet
    fn default() -> Self {
        Self {
            excluded_namespaces: DEFAULT_EXCLUDED_NAMESPACES
                .iter()
                .map(|ns| ns.to_string())
                .collect(),
            default_termination_window: Some(DEFAULT_TERMINATION_WINDOW.to_string()),
            namespaces: BTreeMap::new(),
        }
    }
}

/// Namespace-level override
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawNamespace {
    /// Window for every workload in the namespace without a pod override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination_window: Option<String>,

    /// Per-pod overrides, keyed by pod name
    #[serde(default)]
    pub pods: BTreeMap<String, RawPodOverride>,
}

/// Pod-level override
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawPodOverride {
    pub termination_window: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_layout() {
        let json = r#"{
            "excluded_namespaces": ["kube-system"],
            "default_termination_window": "2h",
            "namespaces": {
                "ns1": {
                    "termination_window": "1h",
                    "pods": { "p1": { "termination_window": "30m" } }
                },
                "ns2": { "pods": {} }
            }
        }"#;

        let config: RawConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.excluded_namespaces, vec!["kube-system"]);
        assert_eq!(config.namespaces.len(), 2);
        assert_eq!(
            config.namespaces["ns1"].pods["p1"].termination_window,
            "30m"
        );
        assert!(config.namespaces["ns2"].termination_window.is_none());
    }

    #[test]
    fn legacy_keys_are_ignored() {
        let json = r#"{
            "excluded_namespaces": [],
            "default_termination_window": "2h",
            "pod_timestamps": { "ns": { "p": { "last_seen_running": "x" } } }
        }"#;

        let config: RawConfig = serde_json::from_str(json).unwrap();
        assert!(config.namespaces.is_empty());
    }

    #[test]
    fn default_layout_matches_bootstrap_shape() {
        let value = serde_json::to_value(RawConfig::default()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "excluded_namespaces": ["kube-system", "kubeflow"],
                "default_termination_window": "2h",
                "namespaces": {}
            })
        );
    }
}
