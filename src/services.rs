use crate::config::{ErrorMode, VsphereEnv};
use crate::prelude::{AppState, Error, Result, Vsphere};
use crate::vsphere::types::{HostDescriptor, TaskRef, TaskStatus};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub mod latency;
pub mod scsi;
pub mod update;
pub mod version;

// -----------------------------------------------------------------------------

/// Records produced for a batch of targets, plus the number of targets whose
/// fault was absorbed in lenient mode.
///
#[derive(Debug, PartialEq)]
pub struct Batch<T> {
    pub records: Vec<T>,
    pub failed: usize,
}

impl<T> Default for Batch<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            failed: 0,
        }
    }
}

impl<T> Batch<T> {
    /// Applies the error policy to the outcome of one target.
    ///
    /// # Returns
    ///
    /// `Some(value)` on success, `None` when a target fault was absorbed, or
    /// the error itself in strict mode and for faults that concern the whole
    /// invocation.
    ///
    pub fn absorb<U>(&mut self, mode: ErrorMode, target: &str, result: Result<U>) -> Result<Option<U>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(error) if mode == ErrorMode::Lenient && error.is_target_fault() => {
                tracing::warn!(target: "service", target_name = target, %error, "Target skipped");
                self.failed += 1;
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    /// Transforms the records, keeping the failure count.
    ///
    pub fn map<U, F>(self, f: F) -> Batch<U>
    where
        F: FnMut(T) -> Option<U>,
    {
        Batch {
            records: self.records.into_iter().filter_map(f).collect(),
            failed: self.failed,
        }
    }
}

/// Collects host descriptors, either for the given names in order or the
/// whole inventory in a single query when no name is given.
///
pub async fn collect_hosts(state: &AppState, names: &[String]) -> Result<Batch<HostDescriptor>> {
    let vsphere = state.vsphere()?;
    let mut batch = Batch::default();

    if names.is_empty() {
        batch.records = vsphere.all_hosts().await?;
        tracing::debug!(target: "service", count = batch.records.len(), "All hosts listed");
        return Ok(batch);
    }

    for name in names {
        let result = vsphere.host_by_name(name).await;
        if let Some(host) = batch.absorb(state.error_mode, name, result)? {
            batch.records.push(host);
        }
    }

    Ok(batch)
}

// -----------------------------------------------------------------------------

/// Polling interval and deadline for reconfiguration tasks.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskWait {
    pub poll: Duration,
    pub timeout: Duration,
}

impl Default for TaskWait {
    fn default() -> Self {
        Self {
            poll: Duration::from_secs(1),
            timeout: Duration::from_secs(60),
        }
    }
}

impl From<&VsphereEnv> for TaskWait {
    fn from(settings: &VsphereEnv) -> Self {
        Self {
            poll: Duration::from_secs(settings.task_poll_sec),
            timeout: Duration::from_secs(settings.task_timeout_sec),
        }
    }
}

/// Polls a vCenter task until it is complete, with a timeout.
///
/// # Arguments
///
/// * `vsphere`: Client for interacting with the vSphere API.
/// * `task`: Task to monitor.
/// * `wait`: Interval between polling attempts and total time before
///   returning a timeout error.
///
/// # Returns
///
/// An empty `Result` on success, `Error::TaskFailed` with the message of the
/// fault the task ended with.
///
pub async fn wait_until_finish(
    vsphere: &Arc<dyn Vsphere + Send + Sync>,
    task: &TaskRef,
    wait: TaskWait,
) -> Result<()> {
    let start = Instant::now();

    loop {
        let elapsed = start.elapsed();
        if elapsed > wait.timeout {
            return Err(Error::Timeout(elapsed.as_secs_f32()));
        }

        match vsphere.task_status(task).await? {
            TaskStatus::Pending => tokio::time::sleep(wait.poll).await,
            TaskStatus::Completed => break,
            TaskStatus::Failed(error) => return Err(Error::TaskFailed(error)),
        }
    }

    Ok(())
}
