//! kubectl invocation with a deadline

use reaper_cluster_api::{ClusterError, DeleteOutcome};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Default deadline for a single kubectl call
pub const DEFAULT_KUBECTL_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from running kubectl
#[derive(Debug, Error)]
pub enum KubectlError {
    #[error("Failed to run {binary}: {source}")]
    Spawn {
        binary: String,
        source: std::io::Error,
    },

    #[error("kubectl {args} timed out after {timeout:?}")]
    Timeout { args: String, timeout: Duration },

    #[error("kubectl {args} failed: {stderr}")]
    Failed { args: String, stderr: String },
}

impl From<KubectlError> for ClusterError {
    fn from(e: KubectlError) -> Self {
        match e {
            KubectlError::Spawn { source, .. } => ClusterError::Io(source),
            KubectlError::Timeout { timeout, .. } => ClusterError::Timeout(timeout),
            KubectlError::Failed { .. } => ClusterError::CommandFailed(e.to_string()),
        }
    }
}

/// Runs kubectl subcommands
#[derive(Debug, Clone)]
pub struct Kubectl {
    binary: PathBuf,
    timeout: Duration,
}

impl Kubectl {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout: DEFAULT_KUBECTL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run with `args`, returning stdout on a zero exit status
    pub async fn run(&self, args: &[&str]) -> Result<String, KubectlError> {
        let joined = args.join(" ");
        debug!(binary = %self.binary.display(), args = %joined, "Running kubectl");

        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(KubectlError::Spawn {
                    binary: self.binary.display().to_string(),
                    source,
                });
            }
            Err(_) => {
                return Err(KubectlError::Timeout {
                    args: joined,
                    timeout: self.timeout,
                });
            }
        };

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(KubectlError::Failed {
                args: joined,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    /// Run a deletion-style command and classify the result
    pub async fn run_delete(&self, args: &[&str]) -> DeleteOutcome {
        match self.run(args).await {
            Ok(_) => DeleteOutcome::Deleted,
            Err(KubectlError::Failed { stderr, .. }) => classify_delete_error(&stderr),
            Err(e) => DeleteOutcome::Failed(e.to_string()),
        }
    }
}

/// Map kubectl stderr from a delete/annotate call to an outcome
pub fn classify_delete_error(stderr: &str) -> DeleteOutcome {
    // The resource kind itself is unknown to the API server (CRD not installed)
    if stderr.contains("doesn't have a resource type")
        || stderr.contains("could not find the requested resource")
    {
        return DeleteOutcome::NotApplicable;
    }

    if stderr.contains("NotFound") || stderr.contains("not found") {
        return DeleteOutcome::NotFound;
    }

    DeleteOutcome::Failed(stderr.trim().to_string())
}
