//! Per-cycle verdicts and reports

use chrono::{DateTime, Utc};
use reaper_cluster_api::TerminationResult;
use reaper_config::WindowSource;
use reaper_util::{CycleId, TerminationWindow, WorkloadId, format_duration};
use std::time::Duration;
use tracing::info;

/// Evaluation of one workload against its effective window
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadVerdict {
    pub id: WorkloadId,
    pub created_at: DateTime<Utc>,
    pub age: Duration,
    pub window: TerminationWindow,
    pub source: WindowSource,
    pub past_due: bool,
}

impl WorkloadVerdict {
    /// Past due iff age >= window
    pub fn new(
        id: WorkloadId,
        created_at: DateTime<Utc>,
        age: Duration,
        window: TerminationWindow,
        source: WindowSource,
    ) -> Self {
        let past_due = age >= window.as_duration();
        Self {
            id,
            created_at,
            age,
            window,
            source,
            past_due,
        }
    }

    /// Time left before the workload becomes past due
    pub fn remaining(&self) -> Duration {
        self.window.as_duration().saturating_sub(self.age)
    }

    /// How far past the window the workload is
    pub fn overshoot(&self) -> Duration {
        self.age.saturating_sub(self.window.as_duration())
    }

    pub(crate) fn log(&self) {
        if self.past_due {
            info!(
                workload = %self.id,
                age = %format_duration(self.age),
                window = %self.window,
                source = self.source.as_str(),
                exceeded_by = %format_duration(self.overshoot()),
                "Workload past due"
            );
        } else {
            info!(
                workload = %self.id,
                age = %format_duration(self.age),
                window = %self.window,
                source = self.source.as_str(),
                remaining = %format_duration(self.remaining()),
                "Workload within window"
            );
        }
    }
}

/// Termination attempt made during a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminationRecord {
    pub id: WorkloadId,
    pub result: TerminationResult,
}

/// What happened during one reconciliation cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle: CycleId,
    pub started_at: DateTime<Utc>,

    /// Set when the policy reload failed and the previous policy was used
    pub policy_reload_error: Option<String>,

    /// Set when discovery failed and the cycle was skipped
    pub discovery_error: Option<String>,

    pub discovered: usize,
    pub excluded: usize,
    pub pruned: usize,

    /// Past-due workloads whose earlier termination is still in progress
    pub awaiting_removal: usize,

    pub verdicts: Vec<WorkloadVerdict>,
    pub terminations: Vec<TerminationRecord>,

    /// Shutdown was observed; remaining terminations were not started
    pub shutdown_requested: bool,
}

impl CycleReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            cycle: CycleId::new(),
            started_at,
            policy_reload_error: None,
            discovery_error: None,
            discovered: 0,
            excluded: 0,
            pruned: 0,
            awaiting_removal: 0,
            verdicts: Vec::new(),
            terminations: Vec::new(),
            shutdown_requested: false,
        }
    }

    pub fn past_due(&self) -> impl Iterator<Item = &WorkloadId> {
        self.verdicts.iter().filter(|v| v.past_due).map(|v| &v.id)
    }

    pub fn past_due_count(&self) -> usize {
        self.past_due().count()
    }

    pub fn terminated_count(&self) -> usize {
        self.terminations
            .iter()
            .filter(|t| t.result.is_terminated())
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.terminations.len() - self.terminated_count()
    }

    pub fn verdict(&self, id: &WorkloadId) -> Option<&WorkloadVerdict> {
        self.verdicts.iter().find(|v| &v.id == id)
    }

    pub(crate) fn log_summary(&self) {
        info!(
            cycle = %self.cycle,
            discovered = self.discovered,
            excluded = self.excluded,
            pruned = self.pruned,
            awaiting_removal = self.awaiting_removal,
            past_due = self.past_due_count(),
            terminated = self.terminated_count(),
            failed = self.failed_count(),
            "Cycle complete"
        );
    }
}
