//! SCSI status and sense code decoding.

use crate::prelude::{AppState, Error, Result};
use crate::reference::types::{CodeEntry, ScsiCodeTables};
use derive_more::Display;
use serde::Serialize;

pub const UNKNOWN_NAME: &str = "UNKNOWN";

/// Codes reported for one failed SCSI command. Every field is optional.
///
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ScsiCodes {
    pub host_status: Option<String>,
    pub device_status: Option<String>,
    pub plugin_status: Option<String>,
    pub sense_key: Option<String>,
    pub asc: Option<String>,
    pub ascq: Option<String>,
    pub op_code: Option<String>,
}

impl ScsiCodes {
    /// Extracts the codes from a vmkernel log line such as
    ///
    /// ```text
    /// Cmd 0x2a (0x45a2c1b3c0c0) to dev "naa.6000" failed H:0x0 D:0x2 P:0x0 Valid sense data: 0x5 0x24 0x0.
    /// ```
    ///
    /// Only the parts present in the line are filled in.
    ///
    pub fn from_sense_line(line: &str) -> Result<Self> {
        let tokens: Vec<&str> = line
            .split_whitespace()
            .map(|token| token.trim_end_matches(['.', ',', ';']))
            .collect();
        let after = |index: usize, offset: usize| tokens.get(index + offset).map(|token| (*token).to_owned());

        let mut codes = Self::default();
        for (index, token) in tokens.iter().enumerate() {
            if let Some(code) = token.strip_prefix("H:") {
                codes.host_status = Some(code.to_owned());
            } else if let Some(code) = token.strip_prefix("D:") {
                codes.device_status = Some(code.to_owned());
            } else if let Some(code) = token.strip_prefix("P:") {
                codes.plugin_status = Some(code.to_owned());
            } else if token.eq_ignore_ascii_case("cmd") {
                codes.op_code = after(index, 1);
            } else if token.eq_ignore_ascii_case("data:")
                && index > 0
                && tokens[index - 1].eq_ignore_ascii_case("sense")
            {
                codes.sense_key = after(index, 1);
                codes.asc = after(index, 2);
                codes.ascq = after(index, 3);
            }
        }

        if codes == Self::default() {
            return Err(Error::Validation(format!("no SCSI codes found in '{line}'")));
        }
        Ok(codes)
    }
}

/// Code table a decoded entry comes from.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    #[display("host status")]
    HostStatus,
    #[display("device status")]
    DeviceStatus,
    #[display("plugin status")]
    PluginStatus,
    #[display("sense key")]
    SenseKey,
    #[display("additional sense data")]
    AdditionalSense,
    #[display("operation code")]
    OpCode,
}

impl Category {
    fn fallback_description(&self) -> &'static str {
        match self {
            Category::HostStatus => "Unknown host status code",
            Category::DeviceStatus => "Unknown device status code",
            Category::PluginStatus => "Unknown plugin status code",
            Category::SenseKey => "Unknown sense key",
            Category::AdditionalSense => "Unknown additional sense code and qualifier",
            Category::OpCode => "Unknown operation code",
        }
    }
}

/// One decoded code.
///
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedEntry {
    pub category: Category,
    pub code: String,
    pub name: String,
    pub description: String,
}

impl DecodedEntry {
    fn new(category: Category, code: String, entry: Option<&CodeEntry>) -> Self {
        match entry {
            Some(entry) => Self {
                category,
                code,
                name: entry.name.clone(),
                description: entry.description.clone(),
            },
            None => Self {
                category,
                code,
                name: UNKNOWN_NAME.to_owned(),
                description: category.fallback_description().to_owned(),
            },
        }
    }
}

/// Brings a code into the key format of the tables: no `0x` prefix, lower
/// case, at least two characters padded with `0`. Blank input counts as
/// absent.
///
pub fn normalize_code(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() {
        return None;
    }
    Some(format!("{:0>2}", digits.to_ascii_lowercase()))
}

/// Decodes every supplied code, in the fixed order host status, device
/// status, plugin status, sense key, ASC/ASCQ, operation code. ASC and ASCQ
/// are decoded only as a pair.
///
pub fn decode(tables: &ScsiCodeTables, codes: &ScsiCodes) -> Vec<DecodedEntry> {
    let normalized = |code: &Option<String>| code.as_deref().and_then(normalize_code);
    let single = [
        (Category::HostStatus, &codes.host_status, &tables.host_status),
        (Category::DeviceStatus, &codes.device_status, &tables.device_status),
        (Category::PluginStatus, &codes.plugin_status, &tables.plugin_status),
        (Category::SenseKey, &codes.sense_key, &tables.sense_key),
    ];

    let mut entries: Vec<DecodedEntry> = single
        .into_iter()
        .filter_map(|(category, code, table)| {
            let code = normalized(code)?;
            let entry = table.get(&code);
            Some(DecodedEntry::new(category, code, entry))
        })
        .collect();

    if let (Some(asc), Some(ascq)) = (normalized(&codes.asc), normalized(&codes.ascq)) {
        let entry = tables.asc.get(&asc).and_then(|qualifiers| qualifiers.get(&ascq));
        entries.push(DecodedEntry::new(
            Category::AdditionalSense,
            format!("{asc}/{ascq}"),
            entry,
        ));
    }

    if let Some(code) = normalized(&codes.op_code) {
        let entry = tables.op_code.get(&code);
        entries.push(DecodedEntry::new(Category::OpCode, code, entry));
    }

    entries
}

/// Fetches the code tables and decodes `codes`.
///
pub async fn decode_codes(state: &AppState, codes: &ScsiCodes) -> Result<Vec<DecodedEntry>> {
    let tables = state.reference.scsi_codes(&state.urls.scsi_url).await?;
    let entries = decode(&tables, codes);
    tracing::debug!(target: "service", count = entries.len(), "SCSI codes decoded");
    Ok(entries)
}
