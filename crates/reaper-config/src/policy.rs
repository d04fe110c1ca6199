//! Validated policy structures

use crate::schema::{DEFAULT_TERMINATION_WINDOW, RawConfig, RawNamespace};
use reaper_util::{TerminationWindow, WorkloadId, parse_window};
use std::collections::{HashMap, HashSet};

/// Validated lifetime policy ready for use by the reconciler
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    /// Namespaces whose workloads are never cached, evaluated or terminated
    pub excluded_namespaces: HashSet<String>,

    /// Window applied when no override matches. Always positive.
    pub default_window: TerminationWindow,

    /// Per-namespace overrides
    pub namespaces: HashMap<String, NamespacePolicy>,
}

/// Overrides for one namespace
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamespacePolicy {
    /// Overrides the default for every workload in the namespace
    pub window: Option<TerminationWindow>,

    /// Per-pod overrides, keyed by pod name
    pub pods: HashMap<String, TerminationWindow>,
}

/// Which level of the policy produced an effective window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSource {
    Pod,
    Namespace,
    Default,
}

impl WindowSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pod => "pod",
            Self::Namespace => "namespace",
            Self::Default => "default",
        }
    }
}

impl Policy {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let default_window = raw
            .default_termination_window
            .as_deref()
            .and_then(|w| parse_window(w).ok())
            .filter(|w| !w.is_zero())
            .unwrap_or_else(fallback_default_window);

        let namespaces = raw
            .namespaces
            .into_iter()
            .map(|(name, ns)| (name, convert_namespace(ns)))
            .collect();

        Self {
            excluded_namespaces: raw.excluded_namespaces.into_iter().collect(),
            default_window,
            namespaces,
        }
    }

    /// Whether workloads in `namespace` are exempt from enforcement
    pub fn is_excluded(&self, namespace: &str) -> bool {
        self.excluded_namespaces.contains(namespace)
    }

    /// Effective window for a workload: pod override, then namespace
    /// override, then the default.
    pub fn resolve_window(&self, id: &WorkloadId) -> TerminationWindow {
        self.resolve_window_with_source(id).0
    }

    /// Like [`Policy::resolve_window`], also reporting which level matched
    pub fn resolve_window_with_source(&self, id: &WorkloadId) -> (TerminationWindow, WindowSource) {
        let Some(ns) = self.namespaces.get(id.namespace()) else {
            return (self.default_window, WindowSource::Default);
        };

        if let Some(window) = ns.pods.get(id.name()) {
            (*window, WindowSource::Pod)
        } else if let Some(window) = ns.window {
            (window, WindowSource::Namespace)
        } else {
            (self.default_window, WindowSource::Default)
        }
    }

    /// Number of pod-level overrides across all namespaces
    pub fn pod_override_count(&self) -> usize {
        self.namespaces.values().map(|ns| ns.pods.len()).sum()
    }
}

impl Default for Policy {
    /// The bootstrap policy
    fn default() -> Self {
        Self::from_raw(RawConfig::default())
    }
}

fn convert_namespace(raw: RawNamespace) -> NamespacePolicy {
    NamespacePolicy {
        window: raw
            .termination_window
            .as_deref()
            .and_then(|w| parse_window(w).ok()),
        pods: raw
            .pods
            .into_iter()
            .filter_map(|(pod, o)| parse_window(&o.termination_window).ok().map(|w| (pod, w)))
            .collect(),
    }
}

fn fallback_default_window() -> TerminationWindow {
    parse_window(DEFAULT_TERMINATION_WINDOW).unwrap_or(TerminationWindow::from_hours(2))
}
