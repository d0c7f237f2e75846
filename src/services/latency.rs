use crate::prelude::{AppState, Result, Vsphere};
use crate::services::{self, Batch, TaskWait};
use crate::vsphere::types::{LatencyLevel, LatencyRecord};
use serde::Serialize;
use std::sync::Arc;

/// Result of a successful latency sensitivity change.
///
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencyChange {
    pub vm_name: String,
    pub previous: Option<LatencyLevel>,
    pub level: LatencyLevel,
}

/// Reads the latency sensitivity of the named VMs, or of every VM in one
/// inventory-wide query when no name is given.
///
pub async fn get_latency(state: &AppState, names: &[String]) -> Result<Batch<LatencyRecord>> {
    let vsphere = state.vsphere()?;
    let mut batch = Batch::default();

    if names.is_empty() {
        batch.records = vsphere.all_vm_latency().await?;
        return Ok(batch);
    }

    for name in names {
        let result = vsphere.vm_latency(name).await;
        if let Some(records) = batch.absorb(state.error_mode, name, result)? {
            batch.records.extend(records);
        }
    }

    Ok(batch)
}

/// Sets the latency sensitivity of every VM carrying one of `names`.
///
/// `level` is validated before any call to vCenter is made. Each VM is
/// reconfigured with a single request and the resulting task is awaited. Every
/// VM is its own target: a fault aborts that VM only, and changes already
/// made to other VMs of the same name are still reported.
///
pub async fn set_latency(state: &AppState, names: &[String], level: &str) -> Result<Batch<LatencyChange>> {
    let level: LatencyLevel = level.parse()?;
    let vsphere = state.vsphere()?;
    let mut batch = Batch::default();

    for name in names {
        let result = vsphere.vm_latency(name).await;
        let Some(vms) = batch.absorb(state.error_mode, name, result)? else {
            continue;
        };

        for vm in vms {
            let result = set_one(vsphere, &vm, level, state.task_wait).await;
            if let Some(change) = batch.absorb(state.error_mode, &vm.vm_name, result)? {
                batch.records.push(change);
            }
        }
    }

    Ok(batch)
}

#[tracing::instrument(level = "debug", target = "service", skip_all, fields(vm = %vm.vm, name = %vm.vm_name))]
async fn set_one(
    vsphere: &Arc<dyn Vsphere + Send + Sync>,
    vm: &LatencyRecord,
    level: LatencyLevel,
    wait: TaskWait,
) -> Result<LatencyChange> {
    let task = vsphere.reconfigure_latency(&vm.vm, level).await?;
    tracing::debug!(target: "service", task = %task.task, "Reconfiguration started, waiting for completion");

    services::wait_until_finish(vsphere, &task, wait).await?;
    tracing::info!(target: "service", %level, "Latency sensitivity updated");

    Ok(LatencyChange {
        vm_name: vm.vm_name.clone(),
        previous: vm.level,
        level,
    })
}
