//! kubectl cluster adapter
//!
//! Implements discovery and termination against the cluster reachable
//! through the configured kubectl binary and kubeconfig.

use async_trait::async_trait;
use reaper_cluster_api::{
    ClusterError, ClusterResult, DeleteOutcome, DiscoveredWorkload, WorkloadDiscovery,
    WorkloadTerminator,
};
use reaper_util::{WorkloadId, format_timestamp};
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::{Kubectl, join_creation_times, notebook_name, parse_creation_times, parse_gpushare};

/// Annotation the notebook controller watches to scale a notebook to zero
pub const STOP_ANNOTATION: &str = "kubeflow-resource-stopped";

/// What to do with a notebook whose pod is past due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotebookAction {
    /// Delete the notebook resource
    #[default]
    Delete,

    /// Annotate the notebook as stopped, keeping its spec and volumes
    Stop,
}

impl FromStr for NotebookAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "delete" => Ok(Self::Delete),
            "stop" => Ok(Self::Stop),
            other => Err(format!("unknown notebook action '{}'", other)),
        }
    }
}

/// Cluster adapter backed by kubectl
pub struct KubectlCluster {
    kubectl: Kubectl,
    notebook_action: NotebookAction,
}

impl KubectlCluster {
    pub fn new(kubectl: Kubectl) -> Self {
        Self {
            kubectl,
            notebook_action: NotebookAction::default(),
        }
    }

    pub fn with_notebook_action(mut self, action: NotebookAction) -> Self {
        self.notebook_action = action;
        self
    }

    pub fn notebook_action(&self) -> NotebookAction {
        self.notebook_action
    }
}

#[async_trait]
impl WorkloadDiscovery for KubectlCluster {
    async fn discover(&self) -> ClusterResult<Vec<DiscoveredWorkload>> {
        let report = self.kubectl.run(&["inspect", "gpushare", "-d"]).await?;
        let pods = parse_gpushare(&report);
        debug!(count = pods.len(), "Parsed GPU-share allocations");

        if pods.is_empty() {
            return Ok(Vec::new());
        }

        let listing = self.kubectl.run(&["get", "pods", "-A", "-o", "json"]).await?;
        let times = parse_creation_times(&listing)
            .map_err(|e| ClusterError::Malformed(format!("pod listing: {}", e)))?;

        let workloads = join_creation_times(pods, &times);
        for w in &workloads {
            debug!(
                workload = %w.id,
                node = w.node.as_deref().unwrap_or("-"),
                created_at = %format_timestamp(&w.created_at),
                "Found GPU-share pod"
            );
        }

        Ok(workloads)
    }

    async fn probe(&self) -> ClusterResult<()> {
        let version = self
            .kubectl
            .run(&["version", "-o", "json"])
            .await
            .map_err(|e| ClusterError::Unreachable(e.to_string()))?;

        let parsed: serde_json::Value = serde_json::from_str(&version)
            .map_err(|e| ClusterError::Malformed(format!("kubectl version: {}", e)))?;

        match parsed.get("serverVersion") {
            Some(server) => {
                info!(
                    server = server.get("gitVersion").and_then(|v| v.as_str()).unwrap_or("unknown"),
                    "Cluster reachable"
                );
                Ok(())
            }
            None => Err(ClusterError::Unreachable(
                "kubectl reported no server version".into(),
            )),
        }
    }
}

#[async_trait]
impl WorkloadTerminator for KubectlCluster {
    async fn delete_higher_level(&self, id: &WorkloadId) -> DeleteOutcome {
        let notebook = notebook_name(id.name());

        let outcome = match self.notebook_action {
            NotebookAction::Delete => {
                info!(workload = %id, notebook, "Deleting notebook");
                self.kubectl
                    .run_delete(&[
                        "delete",
                        "notebook",
                        notebook,
                        "-n",
                        id.namespace(),
                        "--wait=false",
                    ])
                    .await
            }
            NotebookAction::Stop => {
                let annotation =
                    format!("{}={}", STOP_ANNOTATION, format_timestamp(&reaper_util::now()));
                info!(workload = %id, notebook, "Stopping notebook");
                self.kubectl
                    .run_delete(&[
                        "annotate",
                        "notebook",
                        notebook,
                        &annotation,
                        "-n",
                        id.namespace(),
                        "--overwrite",
                    ])
                    .await
            }
        };

        if let DeleteOutcome::Failed(reason) = &outcome {
            warn!(workload = %id, notebook, reason = %reason, "Notebook action rejected");
        }
        outcome
    }

    async fn delete_workload(&self, id: &WorkloadId) -> DeleteOutcome {
        info!(workload = %id, "Deleting pod");
        self.kubectl
            .run_delete(&[
                "delete",
                "pod",
                id.name(),
                "-n",
                id.namespace(),
                "--wait=false",
            ])
            .await
    }
}
