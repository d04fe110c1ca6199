//! Integration tests for reaperd
//!
//! These tests drive the reconciler end to end against a mock cluster, with
//! the policy read from a real file on disk.

use chrono::{DateTime, TimeZone, Utc};
use reaper_cluster_api::{MockCall, MockCluster, TerminationResult};
use reaper_config::{ConfigSource, FileConfigSource, MemoryConfigSource};
use reaper_core::{LoopState, Reconciler};
use reaper_util::{ManualClock, TerminationWindow, WorkloadId};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
}

fn minutes_ago(minutes: i64) -> DateTime<Utc> {
    t0() - chrono::Duration::minutes(minutes)
}

fn scenario_policy() -> String {
    json!({
        "excluded_namespaces": ["kube-system", "kubeflow"],
        "default_termination_window": "2h",
        "namespaces": {
            "ns1": {
                "termination_window": "1h",
                "pods": {
                    "p1": { "termination_window": "30m" }
                }
            }
        },
        "pod_timestamps": {}
    })
    .to_string()
}

fn reconciler_for(
    source: Arc<dyn ConfigSource>,
    cluster: &Arc<MockCluster>,
    clock: &Arc<ManualClock>,
) -> Reconciler {
    let policy = source.load().unwrap();
    Reconciler::new(policy, source, cluster.clone(), cluster.clone(), clock.clone())
}

#[tokio::test]
async fn test_window_precedence_scenario() {
    let cluster = Arc::new(MockCluster::new());
    let clock = Arc::new(ManualClock::new(t0()));
    let source = Arc::new(MemoryConfigSource::new(scenario_policy()));
    let mut reconciler = reconciler_for(source, &cluster, &clock);
    let (_tx, rx) = watch::channel(false);

    let p1 = cluster.add_pod("ns1", "p1", minutes_ago(45));
    let p2 = cluster.add_pod("ns1", "p2", minutes_ago(45));
    let p3 = cluster.add_pod("ns2", "p3", minutes_ago(180));
    let system = cluster.add_pod("kube-system", "coredns-0", minutes_ago(24 * 60));

    let report = reconciler.run_cycle(&rx).await;

    let v1 = report.verdict(&p1).unwrap();
    assert_eq!(v1.window, TerminationWindow::from_minutes(30));
    assert!(v1.past_due);

    let v2 = report.verdict(&p2).unwrap();
    assert_eq!(v2.window, TerminationWindow::from_hours(1));
    assert!(!v2.past_due);

    let v3 = report.verdict(&p3).unwrap();
    assert_eq!(v3.window, TerminationWindow::from_hours(2));
    assert!(v3.past_due);

    assert!(report.verdict(&system).is_none());
    assert_eq!(report.excluded, 1);

    assert_eq!(cluster.termination_targets(), vec![p1, p3]);
    assert_eq!(cluster.workload_ids(), vec![p2.clone(), system]);

    // p2 crosses its namespace window later on
    clock.advance(Duration::from_secs(15 * 60));
    cluster.clear_calls();
    let report = reconciler.run_cycle(&rx).await;

    assert!(report.verdict(&p2).unwrap().past_due);
    assert_eq!(cluster.termination_targets(), vec![p2]);
}

#[tokio::test]
async fn test_bootstrap_and_reload_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gpu-reaper").join("pod_config.json");

    let source = Arc::new(FileConfigSource::new(&path));
    let cluster = Arc::new(MockCluster::new());
    let clock = Arc::new(ManualClock::new(t0()));
    let mut reconciler = reconciler_for(source, &cluster, &clock);
    let (_tx, rx) = watch::channel(false);

    // Missing file was bootstrapped with the default policy
    assert!(path.exists());
    assert_eq!(reconciler.policy().default_window, TerminationWindow::from_hours(2));
    assert!(reconciler.policy().is_excluded("kubeflow"));

    let pod = cluster.add_pod("team", "trainer-0", minutes_ago(90));
    let report = reconciler.run_cycle(&rx).await;
    assert!(!report.verdict(&pod).unwrap().past_due);

    // Tighten the namespace window on disk; the next cycle picks it up
    std::fs::write(
        &path,
        json!({
            "excluded_namespaces": ["kube-system"],
            "default_termination_window": "2h",
            "namespaces": { "team": { "termination_window": "1h" } }
        })
        .to_string(),
    )
    .unwrap();

    let report = reconciler.run_cycle(&rx).await;
    assert!(report.policy_reload_error.is_none());
    assert!(report.verdict(&pod).unwrap().past_due);
    assert_eq!(report.terminations[0].result, TerminationResult::DeletedViaWorkload);
    assert!(!reconciler.policy().is_excluded("kubeflow"));

    // A broken edit keeps the last good policy and leaves the file alone
    std::fs::write(&path, r#"{ "default_termination_window": "soon" }"#).unwrap();
    let report = reconciler.run_cycle(&rx).await;
    assert!(report.policy_reload_error.is_some());
    assert_eq!(reconciler.policy().namespaces["team"].window, Some(TerminationWindow::from_hours(1)));
    assert!(std::fs::read_to_string(&path).unwrap().contains("soon"));
}

#[tokio::test]
async fn test_notebook_pods_removed_through_notebook() {
    let cluster = Arc::new(MockCluster::new());
    let clock = Arc::new(ManualClock::new(t0()));
    let source = Arc::new(MemoryConfigSource::new(scenario_policy()));
    let mut reconciler = reconciler_for(source, &cluster, &clock);
    let (_tx, rx) = watch::channel(false);

    let nb = cluster.add_notebook_pod("ns2", "jupyter-alice-0", minutes_ago(150));
    let bare = cluster.add_pod("ns2", "batch-job-x7k2p", minutes_ago(150));

    let report = reconciler.run_cycle(&rx).await;

    assert_eq!(report.terminated_count(), 2);
    assert_eq!(
        cluster.calls(),
        vec![
            MockCall::Discover,
            MockCall::DeleteHigherLevel(nb.clone()),
            MockCall::DeleteHigherLevel(bare.clone()),
            MockCall::DeleteWorkload(bare),
        ]
    );
    assert!(reconciler.cache().is_empty());
}

#[tokio::test]
async fn test_vanished_workload_does_not_inherit_age() {
    let cluster = Arc::new(MockCluster::new());
    let clock = Arc::new(ManualClock::new(t0()));
    let source = Arc::new(MemoryConfigSource::new(scenario_policy()));
    let mut reconciler = reconciler_for(source, &cluster, &clock);
    let (_tx, rx) = watch::channel(false);

    let id = cluster.add_pod("ns2", "worker-0", minutes_ago(100));
    reconciler.run_cycle(&rx).await;

    // Pod disappears for a cycle, then a new pod reuses the name
    cluster.remove(&id);
    let report = reconciler.run_cycle(&rx).await;
    assert_eq!(report.pruned, 1);

    clock.advance(Duration::from_secs(30 * 60));
    cluster.add_pod("ns2", "worker-0", t0() + chrono::Duration::minutes(25));
    let report = reconciler.run_cycle(&rx).await;

    let verdict = report.verdict(&WorkloadId::new("ns2", "worker-0")).unwrap();
    assert_eq!(verdict.age, Duration::from_secs(5 * 60));
    assert!(!verdict.past_due);
}

#[tokio::test]
async fn test_graceful_shutdown_during_terminations() {
    let cluster = Arc::new(MockCluster::new());
    let clock = Arc::new(ManualClock::new(t0()));
    let source = Arc::new(MemoryConfigSource::new(scenario_policy()));
    let mut reconciler = reconciler_for(source, &cluster, &clock)
        .with_interval(Duration::from_millis(10));
    let (tx, rx) = watch::channel(false);

    let first = cluster.add_pod("ns2", "a", minutes_ago(300));
    let second = cluster.add_pod("ns2", "b", minutes_ago(300));
    let third = cluster.add_pod("ns2", "c", minutes_ago(300));

    cluster.set_termination_hook(move |_| {
        let _ = tx.send(true);
    });

    reconciler.run(rx).await;

    assert_eq!(cluster.termination_targets(), vec![first]);
    assert_eq!(cluster.workload_ids(), vec![second, third]);
    assert_eq!(cluster.discover_count(), 1);
    assert_eq!(reconciler.state(), LoopState::ShuttingDown);
}

#[tokio::test]
async fn test_loop_survives_discovery_outage() {
    let cluster = Arc::new(MockCluster::new());
    let clock = Arc::new(ManualClock::new(t0()));
    let source = Arc::new(MemoryConfigSource::new(scenario_policy()));
    let mut reconciler = reconciler_for(source, &cluster, &clock)
        .with_interval(Duration::from_millis(5));
    let (tx, rx) = watch::channel(false);

    let pod = cluster.add_pod("ns2", "trainer-0", minutes_ago(300));
    cluster.set_fail_discovery(true);

    let outage = cluster.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        outage.set_fail_discovery(false);
        tokio::time::sleep(Duration::from_millis(100)).await;
        let _ = tx.send(true);
    });

    reconciler.run(rx).await;

    assert!(cluster.discover_count() >= 2);
    assert!(!cluster.workload_ids().contains(&pod));
}
