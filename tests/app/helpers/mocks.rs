use async_trait::async_trait;
use esxi_toolkit::prelude::{Error, ReferenceDb, Result, Vsphere, VsphereError};
use esxi_toolkit::reference::types::{BuildRecord, ScsiCodeTables};
use esxi_toolkit::vsphere::types::*;
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Mutex;

/// In-memory reference database that counts requested URLs.
///
#[derive(Default)]
pub struct MockReference {
    pub releases: Vec<BuildRecord>,
    pub scsi: Value,
    pub unavailable: bool,
    pub requests: Mutex<Vec<String>>,
}

impl MockReference {
    pub fn with_releases(releases: Vec<BuildRecord>) -> Self {
        Self {
            releases,
            ..Default::default()
        }
    }

    pub fn with_scsi(scsi: Value) -> Self {
        Self {
            scsi,
            ..Default::default()
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn request(&self, url: &str) -> Result<()> {
        self.requests.lock().unwrap().push(url.to_owned());
        match self.unavailable {
            true => Err(Error::FetchStatus(url.to_owned(), StatusCode::BAD_GATEWAY)),
            false => Ok(()),
        }
    }
}

#[async_trait]
impl ReferenceDb for MockReference {
    async fn releases(&self, url: &str) -> Result<Vec<BuildRecord>> {
        self.request(url)?;
        Ok(self.releases.clone())
    }

    async fn scsi_codes(&self, url: &str) -> Result<ScsiCodeTables> {
        self.request(url)?;
        Ok(serde_json::from_value(self.scsi.clone())?)
    }
}

// -----------------------------------------------------------------------------

/// In-memory vCenter. Every trait call is recorded by name and argument.
///
#[derive(Default)]
pub struct MockVsphere {
    pub hosts: Vec<HostDescriptor>,
    pub vms: Vec<LatencyRecord>,
    pub rejected_vms: HashSet<String>,
    pub failing_tasks: HashSet<String>,
    pub calls: Mutex<Vec<String>>,
}

impl MockVsphere {
    pub fn with_hosts(hosts: Vec<HostDescriptor>) -> Self {
        Self {
            hosts,
            ..Default::default()
        }
    }

    pub fn with_vms(vms: &[(&str, &str, Option<LatencyLevel>)]) -> Self {
        Self {
            vms: vms
                .iter()
                .map(|(moid, name, level)| LatencyRecord {
                    vm: Moid::from(*moid),
                    vm_name: (*name).to_owned(),
                    level: *level,
                })
                .collect(),
            ..Default::default()
        }
    }

    /// Reconfiguration of this VM is refused by the API.
    ///
    pub fn reject(mut self, moid: &str) -> Self {
        self.rejected_vms.insert(moid.to_owned());
        self
    }

    /// Reconfiguration of this VM is accepted, but the task ends in error.
    ///
    pub fn fail_task(mut self, moid: &str) -> Self {
        self.failing_tasks.insert(format!("task-{moid}"));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn call(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Vsphere for MockVsphere {
    async fn host_by_name(&self, name: &str) -> Result<HostDescriptor> {
        self.call(format!("host_by_name {name}"));
        self.hosts
            .iter()
            .find(|host| host.name == name)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("host '{name}'")))
    }

    async fn all_hosts(&self) -> Result<Vec<HostDescriptor>> {
        self.call("all_hosts".to_owned());
        Ok(self.hosts.clone())
    }

    async fn vm_latency(&self, name: &str) -> Result<Vec<LatencyRecord>> {
        self.call(format!("vm_latency {name}"));
        let records: Vec<LatencyRecord> = self
            .vms
            .iter()
            .filter(|vm| vm.vm_name == name)
            .cloned()
            .collect();
        match records.is_empty() {
            true => Err(Error::NotFound(format!("VM '{name}'"))),
            false => Ok(records),
        }
    }

    async fn all_vm_latency(&self) -> Result<Vec<LatencyRecord>> {
        self.call("all_vm_latency".to_owned());
        Ok(self.vms.clone())
    }

    async fn reconfigure_latency(&self, vm: &Moid, level: LatencyLevel) -> Result<TaskRef> {
        self.call(format!("reconfigure_latency {vm} {level}"));
        if self.rejected_vms.contains(vm.as_str()) {
            return Err(Error::Vsphere(
                VsphereError::Reconfigure,
                StatusCode::BAD_REQUEST,
                "InvalidPowerState".to_owned(),
            ));
        }
        Ok(TaskRef::new(Moid::from(format!("task-{vm}").as_str())))
    }

    async fn task_status(&self, task: &TaskRef) -> Result<TaskStatus> {
        self.call(format!("task_status {}", task.task));
        match self.failing_tasks.contains(task.task.as_str()) {
            true => Ok(TaskStatus::Failed("A specified parameter was not correct".to_owned())),
            false => Ok(TaskStatus::Completed),
        }
    }
}
