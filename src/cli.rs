use crate::config::ErrorMode;
use crate::output::Format;
use crate::services::scsi::ScsiCodes;
use crate::services::version::LatestPolicy;
use std::path::PathBuf;

#[derive(Debug, clap::Parser)]
#[command(
    name = "esxi",
    version,
    about = "Version lookups, SCSI code decoding and latency sensitivity for vSphere"
)]
pub struct Cli {
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        global = true,
        help = "Write diagnostic trace lines to stderr (-vv for more)"
    )]
    pub verbose: u8,
    #[arg(long, global = true, help = "YAML configuration file", env = "ESXI_CONFIG")]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, value_enum, help = "Override the configured error handling")]
    pub error_mode: Option<ErrorMode>,
    #[arg(long, global = true, value_enum, default_value_t = Format::Json, help = "Record output format")]
    pub format: Format,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Show the friendly version of hosts (all hosts when none is named).
    Version {
        hosts: Vec<String>,
    },
    /// Check whether a newer build of the same minor release exists.
    UpdateCheck {
        #[arg(long, value_enum, help = "Rule that picks the latest build of a minor release")]
        latest_policy: Option<LatestPolicy>,
        hosts: Vec<String>,
    },
    /// Look up raw build numbers without contacting vCenter.
    Build {
        #[arg(required = true)]
        builds: Vec<u64>,
    },
    /// Decode SCSI status and sense codes.
    Scsi(ScsiArgs),
    /// Read or change VM latency sensitivity.
    #[command(subcommand)]
    Latency(LatencyCommand),
}

#[derive(Debug, clap::Args)]
pub struct ScsiArgs {
    #[arg(long)]
    pub host_status: Option<String>,
    #[arg(long)]
    pub device_status: Option<String>,
    #[arg(long)]
    pub plugin_status: Option<String>,
    #[arg(long)]
    pub sense_key: Option<String>,
    #[arg(long)]
    pub asc: Option<String>,
    #[arg(long)]
    pub ascq: Option<String>,
    #[arg(long)]
    pub op_code: Option<String>,
    #[arg(
        long,
        conflicts_with_all = ["host_status", "device_status", "plugin_status", "sense_key", "asc", "ascq", "op_code"],
        help = "vmkernel log line to take the codes from"
    )]
    pub sense: Option<String>,
}

impl ScsiArgs {
    pub fn codes(self) -> crate::prelude::Result<ScsiCodes> {
        if let Some(line) = self.sense {
            return ScsiCodes::from_sense_line(&line);
        }

        Ok(ScsiCodes {
            host_status: self.host_status,
            device_status: self.device_status,
            plugin_status: self.plugin_status,
            sense_key: self.sense_key,
            asc: self.asc,
            ascq: self.ascq,
            op_code: self.op_code,
        })
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum LatencyCommand {
    /// Show latency sensitivity (all VMs when none is named).
    Get {
        vms: Vec<String>,
    },
    /// Set latency sensitivity to low, normal, medium or high.
    Set {
        #[arg(long)]
        level: String,
        #[arg(required = true)]
        vms: Vec<String>,
    },
}
