use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Wrapper the virten.net release database puts around its payload.
///
/// # Example JSON
///
/// ```json
/// { "data": { "esxiReleases": [ ... ] } }
/// ```
///
#[derive(Debug, Deserialize)]
pub struct ReleaseDocument {
    pub data: ReleaseData,
}

#[derive(Debug, Deserialize)]
pub struct ReleaseData {
    #[serde(rename = "esxiReleases")]
    pub releases: Vec<BuildRecord>,
}

/// One hypervisor release as published in the reference database.
///
/// # Fields
///
/// * `build`: Numeric build identifier, unique within one document.
/// * `friendly_name`: Marketing name, e.g. "VMware ESXi 7.0 Update 3e".
/// * `release_date`: Day the build was published.
/// * `minor_release`: Major.minor version line the build belongs to ("7.0").
/// * `update_release`: Update level inside the minor line ("7.0 U3e").
/// * `image_profile`: Name of the standard image profile.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRecord {
    #[serde(deserialize_with = "build_number")]
    pub build: u64,
    pub friendly_name: String,
    pub release_date: NaiveDate,
    pub minor_release: String,
    pub update_release: String,
    #[serde(default)]
    pub image_profile: String,
}

/// The database publishes builds as strings, older snapshots as numbers.
///
fn build_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(build) => Ok(build),
        Raw::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

// -----------------------------------------------------------------------------

/// Name and description of a single SCSI status or sense code.
///
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CodeEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Code tables keyed by the two character, zero-padded code.
///
/// Additional sense data is keyed twice: ASC first, then ASCQ.
///
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScsiCodeTables {
    pub host_status: HashMap<String, CodeEntry>,
    pub device_status: HashMap<String, CodeEntry>,
    pub plugin_status: HashMap<String, CodeEntry>,
    pub sense_key: HashMap<String, CodeEntry>,
    pub asc: HashMap<String, HashMap<String, CodeEntry>>,
    pub op_code: HashMap<String, CodeEntry>,
}
