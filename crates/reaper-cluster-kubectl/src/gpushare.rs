//! Parser for `kubectl inspect gpushare -d` output

use reaper_util::WorkloadId;
use std::collections::HashSet;

/// Lines that close a node's pod table
const SECTION_TERMINATORS: &[&str] = &["IPADDRESS:", "Allocated :", "Total :", "Allocated/Total"];

/// A pod holding a GPU share, as listed by the gpushare plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuSharePod {
    pub id: WorkloadId,
    pub node: Option<String>,
}

/// Extract the pods listed under each node.
///
/// The detailed report looks like:
///
/// ```text
/// NAME:       gpu-node-1
/// IPADDRESS:  10.0.0.5
///
/// NAME            NAMESPACE  GPU0(Allocated)
/// my-notebook-0   team-a     4
/// trainer-7f9c    team-b     8
/// Allocated :     12 (75%)
/// Total :         16
/// ----------------------------------------------
/// ```
///
/// A pod listed twice (e.g. across GPU columns) is reported once.
pub fn parse_gpushare(output: &str) -> Vec<GpuSharePod> {
    let mut pods = Vec::new();
    let mut seen = HashSet::new();
    let mut current_node: Option<String> = None;
    let mut in_pod_table = false;

    for line in output.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with("---") {
            continue;
        }

        if line.starts_with("NAME:") {
            current_node = line.split_whitespace().nth(1).map(str::to_string);
            in_pod_table = false;
            continue;
        }

        if line.contains("NAMESPACE") && line.contains("GPU0(Allocated)") {
            in_pod_table = true;
            continue;
        }

        if SECTION_TERMINATORS.iter().any(|t| line.starts_with(t)) {
            in_pod_table = false;
            continue;
        }

        if !in_pod_table {
            continue;
        }

        let mut columns = line.split_whitespace();
        let (Some(name), Some(namespace)) = (columns.next(), columns.next()) else {
            continue;
        };

        let id = WorkloadId::new(namespace, name);
        if seen.insert(id.clone()) {
            pods.push(GpuSharePod {
                id,
                node: current_node.clone(),
            });
        }
    }

    pods
}
