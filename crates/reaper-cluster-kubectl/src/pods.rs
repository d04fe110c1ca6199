//! Creation timestamps from `kubectl get pods -A -o json`

use chrono::{DateTime, Utc};
use reaper_cluster_api::DiscoveredWorkload;
use reaper_util::WorkloadId;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use crate::GpuSharePod;

#[derive(Debug, Deserialize)]
struct PodList {
    #[serde(default)]
    items: Vec<PodItem>,
}

#[derive(Debug, Deserialize)]
struct PodItem {
    metadata: PodMetadata,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PodMetadata {
    name: String,
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    creation_timestamp: Option<DateTime<Utc>>,
}

/// Map each listed pod to its creation time.
///
/// Pods without a namespace or timestamp are skipped.
pub fn parse_creation_times(
    json: &str,
) -> Result<HashMap<WorkloadId, DateTime<Utc>>, serde_json::Error> {
    let list: PodList = serde_json::from_str(json)?;

    Ok(list
        .items
        .into_iter()
        .filter_map(|item| {
            let meta = item.metadata;
            let namespace = meta.namespace?;
            let created = meta.creation_timestamp?;
            Some((WorkloadId::new(namespace, meta.name), created))
        })
        .collect())
}

/// Attach creation times to GPU-share pods.
///
/// A pod absent from `times` was deleted between the two kubectl calls and is
/// dropped.
pub fn join_creation_times(
    pods: Vec<GpuSharePod>,
    times: &HashMap<WorkloadId, DateTime<Utc>>,
) -> Vec<DiscoveredWorkload> {
    pods.into_iter()
        .filter_map(|pod| match times.get(&pod.id) {
            Some(created_at) => {
                let mut workload = DiscoveredWorkload::new(pod.id, *created_at);
                workload.node = pod.node;
                Some(workload)
            }
            None => {
                debug!(workload = %pod.id, "GPU-share pod missing from pod listing; skipping");
                None
            }
        })
        .collect()
}
