pub mod client;
pub mod types;

// -----------------------------------------------------------------------------

use crate::prelude::Result;
use crate::vsphere::types::*;
use async_trait::async_trait;

/// Accessor for the virtualization management API.
///
/// The core only sees names, opaque object IDs and the small records defined
/// in [`types`]; it never depends on the shape of the vSphere object model.
///
#[async_trait]
pub trait Vsphere {
    async fn host_by_name(&self, name: &str) -> Result<HostDescriptor>;
    async fn all_hosts(&self) -> Result<Vec<HostDescriptor>>;
    async fn vm_latency(&self, name: &str) -> Result<Vec<LatencyRecord>>;
    async fn all_vm_latency(&self) -> Result<Vec<LatencyRecord>>;
    async fn reconfigure_latency(&self, vm: &Moid, level: LatencyLevel) -> Result<TaskRef>;
    async fn task_status(&self, task: &TaskRef) -> Result<TaskStatus>;
}
