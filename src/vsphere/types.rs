use crate::prelude::{Error, Result};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Characters kept verbatim in a path segment. Container view IDs carry
/// brackets and colons, regular IDs only these.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// Type-safe representation of a vSphere managed object ID (`vm-42`,
/// `host-10`, `task-311`).
///
/// The core never looks inside it, it only hands it back to the accessor.
///
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Moid(String);

impl Moid {
    /// Percent-encode the ID to make it safe for use in a URL path.
    ///
    pub fn encoded(&self) -> String {
        utf8_percent_encode(&self.0, PATH_SEGMENT).to_string()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Moid {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl Display for Moid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// -----------------------------------------------------------------------------

/// Host as seen by the inventory accessor.
///
/// # Fields
///
/// * `name`: Inventory name of the host.
/// * `build`: Hypervisor build number, absent for disconnected hosts.
///
#[derive(Debug, Clone, PartialEq)]
pub struct HostDescriptor {
    pub name: String,
    pub build: Option<u64>,
}

impl HostDescriptor {
    pub fn new(name: &str, build: Option<u64>) -> Self {
        Self {
            name: name.to_owned(),
            build,
        }
    }
}

/// Per-VM CPU scheduling latency hint.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LatencyLevel {
    Low,
    Normal,
    Medium,
    High,
}

impl LatencyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LatencyLevel::Low => "low",
            LatencyLevel::Normal => "normal",
            LatencyLevel::Medium => "medium",
            LatencyLevel::High => "high",
        }
    }
}

impl Display for LatencyLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LatencyLevel {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(LatencyLevel::Low),
            "normal" => Ok(LatencyLevel::Normal),
            "medium" => Ok(LatencyLevel::Medium),
            "high" => Ok(LatencyLevel::High),
            _ => Err(Error::Validation(format!(
                "latency level '{value}', expected one of low, normal, medium, high"
            ))),
        }
    }
}

/// Latency sensitivity of one virtual machine.
///
/// # Fields
///
/// * `vm`: Managed object ID of the VM, used for reconfiguration.
/// * `vm_name`: Inventory name of the VM.
/// * `level`: Current level, absent when the VM reports no configuration or
///   a level outside the four known values.
///
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencyRecord {
    #[serde(skip)]
    pub vm: Moid,
    pub vm_name: String,
    pub level: Option<LatencyLevel>,
}

/// Reference to a reconfiguration task running on vCenter.
///
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRef {
    pub task: Moid,
}

impl TaskRef {
    pub fn new(task: Moid) -> Self {
        Self { task }
    }
}

/// High-level status of a vCenter task.
///
#[derive(Debug, PartialEq)]
pub enum TaskStatus {
    Pending,
    Completed,
    Failed(String),
}

// -----------------------------------------------------------------------------
// Wire types of the vCenter REST API.

/// Item of `GET /api/vcenter/host`.
///
#[derive(Debug, Deserialize)]
pub struct HostSummary {
    pub host: Moid,
    pub name: String,
}

/// Item of `GET /api/vcenter/vm`.
///
#[derive(Debug, Deserialize)]
pub struct VmSummary {
    pub vm: Moid,
    pub name: String,
}

// -----------------------------------------------------------------------------
// Wire types of the VI/JSON API. Only the properties this crate reads are
// modeled, everything else is ignored on deserialization.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedObjectReference {
    #[serde(rename = "_typeName", default = "ManagedObjectReference::type_name")]
    pub type_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: Moid,
}

impl ManagedObjectReference {
    fn type_name() -> String {
        "ManagedObjectReference".to_owned()
    }
}

/// Subset of `ServiceContent`.
///
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceContent {
    pub root_folder: ManagedObjectReference,
    pub property_collector: ManagedObjectReference,
    pub view_manager: ManagedObjectReference,
}

/// `HostListSummary`, reduced to `config.product.build`.
///
#[derive(Debug, Default, Deserialize)]
pub struct HostListSummary {
    #[serde(default)]
    pub config: Option<HostConfigSummary>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HostConfigSummary {
    #[serde(default)]
    pub product: Option<AboutInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AboutInfo {
    #[serde(default)]
    pub build: Option<String>,
}

impl HostListSummary {
    pub fn build(&self) -> Option<u64> {
        self.config
            .as_ref()?
            .product
            .as_ref()?
            .build
            .as_deref()?
            .trim()
            .parse()
            .ok()
    }
}

/// `VirtualMachineConfigInfo`, reduced to the latency sensitivity.
///
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmConfigInfo {
    #[serde(default)]
    pub latency_sensitivity: Option<LatencySensitivity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencySensitivity {
    #[serde(rename = "_typeName", default = "LatencySensitivity::type_name")]
    pub type_name: String,
    pub level: String,
}

impl LatencySensitivity {
    fn type_name() -> String {
        "LatencySensitivity".to_owned()
    }

    pub fn new(level: LatencyLevel) -> Self {
        Self {
            type_name: Self::type_name(),
            level: level.as_str().to_owned(),
        }
    }

    /// Level as one of the four known values. vSphere also knows `custom`,
    /// which is reported as absent.
    ///
    pub fn known_level(&self) -> Option<LatencyLevel> {
        match self.level.parse() {
            Ok(level) => Some(level),
            Err(_) => {
                tracing::warn!(target: "vsphere", level = %self.level, "Unrecognized latency sensitivity level");
                None
            }
        }
    }
}

/// Subset of `TaskInfo`.
///
#[derive(Debug, Deserialize)]
pub struct TaskInfo {
    pub state: TaskState,
    #[serde(default)]
    pub error: Option<MethodFault>,
}

#[derive(Debug, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Queued,
    Running,
    Success,
    Error,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodFault {
    #[serde(default)]
    pub localized_message: Option<String>,
}

impl From<TaskInfo> for TaskStatus {
    fn from(info: TaskInfo) -> Self {
        match info.state {
            TaskState::Queued | TaskState::Running => TaskStatus::Pending,
            TaskState::Success => TaskStatus::Completed,
            TaskState::Error => TaskStatus::Failed(
                info.error
                    .and_then(|fault| fault.localized_message)
                    .unwrap_or_else(|| "Unexpected".to_owned()),
            ),
        }
    }
}

/// `RetrieveResult` of `PropertyCollector.RetrievePropertiesEx`.
///
#[derive(Debug, Default, Deserialize)]
pub struct RetrieveResult {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub objects: Vec<ObjectContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectContent {
    pub obj: ManagedObjectReference,
    #[serde(default)]
    pub prop_set: Vec<DynamicProperty>,
}

#[derive(Debug, Deserialize)]
pub struct DynamicProperty {
    pub name: String,
    pub val: Value,
}

impl ObjectContent {
    /// Returns the raw value of the property at `path`, if it was retrieved.
    ///
    pub fn property(&self, path: &str) -> Option<&Value> {
        self.prop_set
            .iter()
            .find(|property| property.name == path)
            .map(|property| &property.val)
    }

    pub fn name(&self) -> String {
        self.property("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned()
    }
}
