//! Mock cluster for testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reaper_util::WorkloadId;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::{
    ClusterError, ClusterResult, DeleteOutcome, DiscoveredWorkload, WorkloadDiscovery,
    WorkloadTerminator,
};

/// A call observed by the mock, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Discover,
    DeleteHigherLevel(WorkloadId),
    DeleteWorkload(WorkloadId),
}

type TerminationHook = Box<dyn Fn(&WorkloadId) + Send + Sync>;

/// In-memory cluster implementing both discovery and termination
///
/// Deleting a workload (directly or through its notebook) removes it from
/// subsequent discovery results.
pub struct MockCluster {
    workloads: Arc<Mutex<Vec<DiscoveredWorkload>>>,
    notebooks: Arc<Mutex<HashSet<WorkloadId>>>,
    termination_failures: Arc<Mutex<HashMap<WorkloadId, String>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
    termination_hook: Mutex<Option<TerminationHook>>,
    lingering: Arc<Mutex<bool>>,

    /// Configure discovery to fail
    pub fail_discovery: Arc<Mutex<bool>>,
}

impl MockCluster {
    pub fn new() -> Self {
        Self {
            workloads: Arc::new(Mutex::new(Vec::new())),
            notebooks: Arc::new(Mutex::new(HashSet::new())),
            termination_failures: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            termination_hook: Mutex::new(None),
            lingering: Arc::new(Mutex::new(false)),
            fail_discovery: Arc::new(Mutex::new(false)),
        }
    }

    /// Add a bare pod
    pub fn add_pod(&self, namespace: &str, name: &str, created_at: DateTime<Utc>) -> WorkloadId {
        let id = WorkloadId::new(namespace, name);
        self.workloads
            .lock()
            .unwrap()
            .push(DiscoveredWorkload::new(id.clone(), created_at));
        id
    }

    /// Add a pod owned by a notebook
    pub fn add_notebook_pod(
        &self,
        namespace: &str,
        name: &str,
        created_at: DateTime<Utc>,
    ) -> WorkloadId {
        let id = self.add_pod(namespace, name, created_at);
        self.notebooks.lock().unwrap().insert(id.clone());
        id
    }

    /// Replace the creation time reported for an existing workload
    pub fn set_created_at(&self, id: &WorkloadId, created_at: DateTime<Utc>) {
        for w in self.workloads.lock().unwrap().iter_mut() {
            if &w.id == id {
                w.created_at = created_at;
            }
        }
    }

    /// Remove a workload without going through termination
    pub fn remove(&self, id: &WorkloadId) {
        self.workloads.lock().unwrap().retain(|w| &w.id != id);
        self.notebooks.lock().unwrap().remove(id);
    }

    /// Make deletions of `id` fail with `reason`
    pub fn fail_termination(&self, id: &WorkloadId, reason: impl Into<String>) {
        self.termination_failures
            .lock()
            .unwrap()
            .insert(id.clone(), reason.into());
    }

    pub fn clear_termination_failure(&self, id: &WorkloadId) {
        self.termination_failures.lock().unwrap().remove(id);
    }

    pub fn set_fail_discovery(&self, fail: bool) {
        *self.fail_discovery.lock().unwrap() = fail;
    }

    /// Accept deletions but keep the workload discoverable, like a pod that
    /// is still terminating
    pub fn set_lingering(&self, lingering: bool) {
        *self.lingering.lock().unwrap() = lingering;
    }

    /// Run `hook` at the start of every deletion call
    pub fn set_termination_hook(&self, hook: impl Fn(&WorkloadId) + Send + Sync + 'static) {
        *self.termination_hook.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn workload_ids(&self) -> Vec<WorkloadId> {
        self.workloads
            .lock()
            .unwrap()
            .iter()
            .map(|w| w.id.clone())
            .collect()
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn discover_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, MockCall::Discover))
            .count()
    }

    /// Workloads a deletion call has been issued for, in order, deduplicated
    pub fn termination_targets(&self) -> Vec<WorkloadId> {
        let mut targets: Vec<WorkloadId> = Vec::new();
        for call in self.calls() {
            let id = match call {
                MockCall::DeleteHigherLevel(id) | MockCall::DeleteWorkload(id) => id,
                MockCall::Discover => continue,
            };
            if targets.last() != Some(&id) {
                targets.push(id);
            }
        }
        targets
    }

    fn record(&self, call: MockCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn run_hook(&self, id: &WorkloadId) {
        if let Some(hook) = self.termination_hook.lock().unwrap().as_ref() {
            hook(id);
        }
    }

    fn failure_for(&self, id: &WorkloadId) -> Option<String> {
        self.termination_failures.lock().unwrap().get(id).cloned()
    }

    fn accept_deletion(&self, id: &WorkloadId) {
        if !*self.lingering.lock().unwrap() {
            self.remove(id);
        }
    }
}

impl Default for MockCluster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkloadDiscovery for MockCluster {
    async fn discover(&self) -> ClusterResult<Vec<DiscoveredWorkload>> {
        self.record(MockCall::Discover);

        if *self.fail_discovery.lock().unwrap() {
            return Err(ClusterError::Unreachable("Mock discovery failure".into()));
        }

        Ok(self.workloads.lock().unwrap().clone())
    }
}

#[async_trait]
impl WorkloadTerminator for MockCluster {
    async fn delete_higher_level(&self, id: &WorkloadId) -> DeleteOutcome {
        self.record(MockCall::DeleteHigherLevel(id.clone()));
        self.run_hook(id);

        if !self.notebooks.lock().unwrap().contains(id) {
            return DeleteOutcome::NotFound;
        }
        if let Some(reason) = self.failure_for(id) {
            return DeleteOutcome::Failed(reason);
        }

        self.accept_deletion(id);
        DeleteOutcome::Deleted
    }

    async fn delete_workload(&self, id: &WorkloadId) -> DeleteOutcome {
        self.record(MockCall::DeleteWorkload(id.clone()));
        self.run_hook(id);

        if !self.workloads.lock().unwrap().iter().any(|w| &w.id == id) {
            return DeleteOutcome::NotFound;
        }
        if let Some(reason) = self.failure_for(id) {
            return DeleteOutcome::Failed(reason);
        }

        self.accept_deletion(id);
        DeleteOutcome::Deleted
    }
}
