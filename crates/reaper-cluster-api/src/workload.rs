//! Workload and termination outcome types

use chrono::{DateTime, Utc};
use reaper_util::WorkloadId;
use serde::{Deserialize, Serialize};

/// A GPU-sharing workload as reported by discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredWorkload {
    pub id: WorkloadId,

    /// Creation time reported by the cluster
    pub created_at: DateTime<Utc>,

    /// Node the workload is scheduled on, when known
    pub node: Option<String>,
}

impl DiscoveredWorkload {
    pub fn new(id: WorkloadId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at,
            node: None,
        }
    }

    pub fn on_node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }
}

/// Result of a single deletion primitive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The resource existed and deletion was accepted
    Deleted,

    /// The resource does not exist
    NotFound,

    /// The resource kind does not apply here (e.g. not installed in the cluster)
    NotApplicable,

    /// Deletion was rejected
    Failed(String),
}

/// Which deletion stage produced a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationStage {
    HigherLevel,
    Workload,
}

/// Outcome of the two-stage termination of one workload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TerminationResult {
    /// The wrapping resource (e.g. a notebook) was deleted
    DeletedViaHigherLevel,

    /// No wrapping resource; the workload itself was deleted
    DeletedViaWorkload,

    /// Neither the wrapping resource nor the workload exist any more
    NotFound,

    /// Deletion was rejected; retried on the next cycle
    Failed {
        stage: TerminationStage,
        reason: String,
    },
}

impl TerminationResult {
    /// Whether the workload is gone (or going) after this attempt
    pub fn is_terminated(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}
