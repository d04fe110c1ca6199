//! reaperd - The gpu-reaper daemon
//!
//! Wires together:
//! - Policy file loading and per-cycle reload
//! - The kubectl cluster adapter
//! - The reconciliation loop
//! - Signal-driven graceful shutdown

mod logging;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use reaper_cluster_api::WorkloadDiscovery;
use reaper_cluster_kubectl::{Kubectl, KubectlCluster, NotebookAction};
use reaper_config::{ConfigSource, FileConfigSource};
use reaper_core::Reconciler;
use reaper_util::{MOCK_TIME_ENV_VAR, SystemClock, default_config_path, default_log_dir, is_mock_time_active};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum NotebookActionArg {
    /// Delete the notebook resource
    Delete,
    /// Annotate the notebook as stopped
    Stop,
}

impl From<NotebookActionArg> for NotebookAction {
    fn from(arg: NotebookActionArg) -> Self {
        match arg {
            NotebookActionArg::Delete => NotebookAction::Delete,
            NotebookActionArg::Stop => NotebookAction::Stop,
        }
    }
}

/// reaperd - Terminates GPU-sharing pods that outlive their window
#[derive(Parser, Debug)]
#[command(name = "reaperd")]
#[command(about = "Terminates GPU-sharing pods that outlive their window", long_about = None)]
struct Args {
    /// Policy file path (default: ~/.config/gpu-reaper/pod_config.json)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Seconds between reconciliation cycles
    #[arg(short, long, env = "REAPER_INTERVAL", default_value_t = 3,
          value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Also log to daily files in this directory (default directory when given without a value)
    #[arg(long, env = "REAPER_LOG_DIR", num_args = 0..=1)]
    log_dir: Option<Option<PathBuf>>,

    /// kubectl binary
    #[arg(long, env = "REAPER_KUBECTL", default_value = "kubectl")]
    kubectl: PathBuf,

    /// Deadline for each kubectl call, in seconds
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    kubectl_timeout: u64,

    /// What to do with a notebook whose pod is past due
    #[arg(long, value_enum, env = "REAPER_NOTEBOOK_ACTION", default_value_t = NotebookActionArg::Delete)]
    notebook_action: NotebookActionArg,
}

/// Main service state
struct Service {
    reconciler: Reconciler,
}

impl Service {
    async fn new(args: &Args) -> Result<Self> {
        let source = Arc::new(FileConfigSource::new(&args.config));
        let policy = source
            .load()
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        let mut excluded: Vec<&str> = policy.excluded_namespaces.iter().map(String::as_str).collect();
        excluded.sort_unstable();
        info!(
            config_path = %args.config.display(),
            default_window = %policy.default_window,
            excluded_namespaces = %excluded.join(", "),
            "Configuration loaded"
        );

        if is_mock_time_active() {
            warn!(env = MOCK_TIME_ENV_VAR, "Mock time is active; ages are computed against it");
        }

        let kubectl = Kubectl::new(&args.kubectl)
            .with_timeout(Duration::from_secs(args.kubectl_timeout));
        let cluster = Arc::new(
            KubectlCluster::new(kubectl).with_notebook_action(args.notebook_action.into()),
        );

        cluster
            .probe()
            .await
            .with_context(|| format!("Cluster unreachable via {:?}", args.kubectl))?;

        info!(
            notebook_action = ?cluster.notebook_action(),
            kubectl_timeout_secs = args.kubectl_timeout,
            "Cluster adapter initialized"
        );

        let reconciler = Reconciler::new(
            policy,
            source,
            cluster.clone(),
            cluster,
            Arc::new(SystemClock),
        )
        .with_interval(Duration::from_secs(args.interval));

        Ok(Self { reconciler })
    }

    async fn run(mut self) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
        let mut sighup =
            signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

        tokio::spawn(async move {
            let name = tokio::select! {
                _ = sigterm.recv() => "SIGTERM",
                _ = sigint.recv() => "SIGINT",
                _ = sighup.recv() => "SIGHUP",
            };
            info!(signal = name, "Received signal, shutting down gracefully");
            let _ = shutdown_tx.send(true);
        });

        info!("Service running");
        self.reconciler.run(shutdown_rx).await;

        info!("Service stopped");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_dir = args
        .log_dir
        .clone()
        .map(|dir| dir.unwrap_or_else(default_log_dir));
    let _log_guard = logging::init(&args.log_level, log_dir.as_deref())?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        log_dir = ?log_dir,
        "reaperd starting"
    );

    let service = Service::new(&args).await?;
    service.run().await
}
