//! Reconciliation loop

use chrono::{DateTime, Utc};
use reaper_cluster_api::{TerminationResult, WorkloadDiscovery, WorkloadTerminator};
use reaper_config::{ConfigSource, Policy};
use reaper_util::{Clock, WorkloadId, age_since};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::{AgeCache, CycleReport, TerminationRecord, WorkloadVerdict};

/// Default pause between cycles
pub const DEFAULT_CYCLE_INTERVAL: Duration = Duration::from_secs(3);

/// Where the loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Waiting for the next cycle
    Idle,
    /// A cycle is in progress
    Cycling,
    /// Shutdown observed; no further cycles will start
    ShuttingDown,
}

/// Owns the policy and the age cache and drives cycles against the cluster
pub struct Reconciler {
    policy: Policy,
    cache: AgeCache,

    /// Workloads whose termination was accepted, with the creation time the
    /// cluster reported then. Cleared once they leave discovery.
    terminating: HashMap<WorkloadId, DateTime<Utc>>,

    config: Arc<dyn ConfigSource>,
    discovery: Arc<dyn WorkloadDiscovery>,
    terminator: Arc<dyn WorkloadTerminator>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    state: LoopState,
}

impl Reconciler {
    pub fn new(
        policy: Policy,
        config: Arc<dyn ConfigSource>,
        discovery: Arc<dyn WorkloadDiscovery>,
        terminator: Arc<dyn WorkloadTerminator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        info!(
            default_window = %policy.default_window,
            excluded_namespaces = policy.excluded_namespaces.len(),
            namespace_overrides = policy.namespaces.len(),
            "Reconciler initialized"
        );

        Self {
            policy,
            cache: AgeCache::new(),
            terminating: HashMap::new(),
            config,
            discovery,
            terminator,
            clock,
            interval: DEFAULT_CYCLE_INTERVAL,
            state: LoopState::Cycling,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn cache(&self) -> &AgeCache {
        &self.cache
    }

    /// Whether a termination of `id` was accepted and it is still discovered
    pub fn is_terminating(&self, id: &WorkloadId) -> bool {
        self.terminating.contains_key(id)
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run cycles until `shutdown` becomes true or its sender is dropped.
    ///
    /// The first cycle starts immediately. An in-flight termination is always
    /// allowed to finish.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_ms = self.interval.as_millis() as u64, "Reconciliation loop starting");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let report = self.run_cycle(&shutdown).await;
            report.log_summary();

            if report.shutdown_requested || *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        info!("Shutdown channel closed");
                        break;
                    }
                }
            }
        }

        self.state = LoopState::ShuttingDown;
        info!("Reconciliation loop stopped");
    }

    /// Run a single cycle: reload, discover, prune, evaluate, terminate
    pub async fn run_cycle(&mut self, shutdown: &watch::Receiver<bool>) -> CycleReport {
        let mut report = CycleReport::new(self.clock.now());

        if *shutdown.borrow() {
            self.state = LoopState::ShuttingDown;
            report.shutdown_requested = true;
            return report;
        }

        self.state = LoopState::Cycling;
        debug!(cycle = %report.cycle, "Starting cycle");

        self.reload_policy(&mut report);

        let workloads = match self.discovery.discover().await {
            Ok(workloads) => workloads,
            Err(e) => {
                error!(cycle = %report.cycle, error = %e, "Discovery failed; skipping cycle");
                report.discovery_error = Some(e.to_string());
                self.state = LoopState::Idle;
                return report;
            }
        };
        report.discovered = workloads.len();

        // Excluded workloads count as absent so a newly excluded namespace is dropped
        let current: HashSet<_> = workloads
            .iter()
            .filter(|w| !self.policy.is_excluded(w.id.namespace()))
            .map(|w| w.id.clone())
            .collect();
        report.pruned = self.cache.reconcile(&current);
        self.terminating.retain(|id, _| current.contains(id));

        let now = self.clock.now();
        for workload in &workloads {
            if self.policy.is_excluded(workload.id.namespace()) {
                debug!(workload = %workload.id, "Skipping workload in excluded namespace");
                report.excluded += 1;
                continue;
            }

            let created_at = self.cache.observe(&workload.id, workload.created_at, now);
            let (window, source) = self.policy.resolve_window_with_source(&workload.id);
            let verdict = WorkloadVerdict::new(
                workload.id.clone(),
                created_at,
                age_since(created_at, now),
                window,
                source,
            );
            verdict.log();
            report.verdicts.push(verdict);
        }

        let reported: HashMap<_, _> = workloads.iter().map(|w| (&w.id, w.created_at)).collect();
        let due: Vec<_> = report
            .past_due()
            .filter_map(|id| reported.get(id).map(|created_at| (id.clone(), *created_at)))
            .collect();
        for (id, created_at) in due {
            if *shutdown.borrow() {
                info!(cycle = %report.cycle, "Shutdown requested; not starting further terminations");
                report.shutdown_requested = true;
                break;
            }

            // Same pod still going away; a different creation time is a new pod
            if self.terminating.get(&id) == Some(&created_at) {
                debug!(workload = %id, "Termination already accepted; awaiting removal");
                report.awaiting_removal += 1;
                continue;
            }

            let result = self.terminator.terminate(&id).await;
            match &result {
                TerminationResult::DeletedViaHigherLevel => {
                    info!(workload = %id, "Terminated via notebook");
                }
                TerminationResult::DeletedViaWorkload => {
                    info!(workload = %id, "Terminated pod");
                }
                TerminationResult::NotFound => {
                    info!(workload = %id, "Workload already gone");
                }
                TerminationResult::Failed { stage, reason } => {
                    error!(
                        workload = %id,
                        stage = ?stage,
                        reason = %reason,
                        "Termination failed; will retry next cycle"
                    );
                }
            }

            if result.is_terminated() {
                self.cache.evict(&id);
                self.terminating.insert(id.clone(), created_at);
            } else {
                self.terminating.remove(&id);
            }
            report.terminations.push(TerminationRecord { id, result });
        }

        self.state = if report.shutdown_requested {
            LoopState::ShuttingDown
        } else {
            LoopState::Idle
        };
        report
    }

    fn reload_policy(&mut self, report: &mut CycleReport) {
        match self.config.load() {
            Ok(policy) => {
                if policy != self.policy {
                    info!(
                        default_window = %policy.default_window,
                        namespace_overrides = policy.namespaces.len(),
                        pod_overrides = policy.pod_override_count(),
                        "Policy reloaded"
                    );
                    self.policy = policy;
                }
            }
            Err(e) => {
                warn!(error = %e, "Policy reload failed; keeping previous policy");
                report.policy_reload_error = Some(e.to_string());
            }
        }
    }
}
