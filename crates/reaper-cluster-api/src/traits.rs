//! Cluster adapter traits

use async_trait::async_trait;
use reaper_util::WorkloadId;
use std::time::Duration;
use thiserror::Error;

use crate::{DeleteOutcome, DiscoveredWorkload, TerminationResult, TerminationStage};

/// Errors from cluster discovery
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("Cluster unreachable: {0}")]
    Unreachable(String),

    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ClusterResult<T> = Result<T, ClusterError>;

/// Lists GPU-sharing workloads.
///
/// Implementations report every namespace; exclusion is the reconciler's job.
#[async_trait]
pub trait WorkloadDiscovery: Send + Sync {
    async fn discover(&self) -> ClusterResult<Vec<DiscoveredWorkload>>;

    /// Check the cluster can be reached at all
    async fn probe(&self) -> ClusterResult<()> {
        Ok(())
    }
}

/// Deletes workloads, preferring the higher-level resource that wraps them
#[async_trait]
pub trait WorkloadTerminator: Send + Sync {
    /// Delete (or stop) the resource wrapping the workload, e.g. a notebook
    async fn delete_higher_level(&self, id: &WorkloadId) -> DeleteOutcome;

    /// Delete the workload itself
    async fn delete_workload(&self, id: &WorkloadId) -> DeleteOutcome;

    /// Two-stage termination: the higher-level resource first, the workload
    /// only when there is nothing above it.
    ///
    /// A rejected higher-level deletion does not fall through; deleting the
    /// pod under a live controller would only get it recreated.
    async fn terminate(&self, id: &WorkloadId) -> TerminationResult {
        match self.delete_higher_level(id).await {
            DeleteOutcome::Deleted => TerminationResult::DeletedViaHigherLevel,
            DeleteOutcome::Failed(reason) => TerminationResult::Failed {
                stage: TerminationStage::HigherLevel,
                reason,
            },
            DeleteOutcome::NotFound | DeleteOutcome::NotApplicable => {
                match self.delete_workload(id).await {
                    DeleteOutcome::Deleted => TerminationResult::DeletedViaWorkload,
                    DeleteOutcome::NotFound | DeleteOutcome::NotApplicable => {
                        TerminationResult::NotFound
                    }
                    DeleteOutcome::Failed(reason) => TerminationResult::Failed {
                        stage: TerminationStage::Workload,
                        reason,
                    },
                }
            }
        }
    }
}
