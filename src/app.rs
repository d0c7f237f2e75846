use crate::cli::{Command, LatencyCommand};
use crate::output::{self, Format};
use crate::prelude::{AppState, Error, Result};
use crate::services::version::LatestPolicy;
use crate::services::{Batch, latency, scsi, update, version};
use serde::Serialize;
use std::io::Write;

/// Runs one command against the external collaborators and writes its
/// records.
///
pub struct App {
    state: AppState,
    format: Format,
    latest_policy: LatestPolicy,
}

impl App {
    /// Builds the application, but does not run it.
    ///
    /// # Arguments
    ///
    /// * `state` - Handles to the reference database and vCenter.
    /// * `format` - Output format of the records.
    /// * `latest_policy` - Policy used by update checks unless the command
    ///   names its own.
    ///
    pub fn new(state: AppState, format: Format, latest_policy: LatestPolicy) -> Self {
        Self {
            state,
            format,
            latest_policy,
        }
    }

    /// Executes `command`, writing one record per resolved target or code to
    /// `writer` in input order.
    ///
    /// Records of targets that succeeded are written even when others failed
    /// in lenient mode; the call then returns `Error::Incomplete`.
    ///
    #[tracing::instrument(level = "debug", target = "app", skip(self, writer))]
    pub async fn run<W: Write>(&self, command: Command, writer: &mut W) -> Result<()> {
        match command {
            Command::Version { hosts } => {
                let batch = version::host_versions(&self.state, &hosts).await?;
                self.emit(writer, batch)
            }
            Command::UpdateCheck {
                latest_policy,
                hosts,
            } => {
                let policy = latest_policy.unwrap_or(self.latest_policy);
                let batch = update::check_updates(&self.state, &hosts, policy).await?;
                self.emit(writer, batch)
            }
            Command::Build { builds } => {
                let records = version::build_versions(&self.state, &builds).await?;
                output::write_records(writer, self.format, &records)
            }
            Command::Scsi(args) => {
                let codes = args.codes()?;
                let entries = scsi::decode_codes(&self.state, &codes).await?;
                output::write_records(writer, self.format, &entries)
            }
            Command::Latency(LatencyCommand::Get { vms }) => {
                let batch = latency::get_latency(&self.state, &vms).await?;
                self.emit(writer, batch)
            }
            Command::Latency(LatencyCommand::Set { level, vms }) => {
                let batch = latency::set_latency(&self.state, &vms, &level).await?;
                self.emit(writer, batch)
            }
        }
    }

    fn emit<T, W>(&self, writer: &mut W, batch: Batch<T>) -> Result<()>
    where
        T: Serialize,
        W: Write,
    {
        output::write_records(writer, self.format, &batch.records)?;

        match batch.failed {
            0 => Ok(()),
            failed => {
                tracing::error!(target: "app", failed, "Some targets failed");
                Err(Error::Incomplete(failed))
            }
        }
    }
}
