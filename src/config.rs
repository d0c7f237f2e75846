use crate::prelude::{Error, Result};
use crate::services::version::LatestPolicy;
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_RELEASES_URL: &str = "https://www.virten.net/repo/esxiReleases.json";
pub const DEFAULT_SCSI_URL: &str = "https://www.virten.net/repo/scsiCodes.json";

/// Represents the application's configuration.
///
#[derive(Debug, Deserialize)]
pub struct Config {
    pub reference: ReferenceEnv,
    #[serde(default)]
    pub vsphere: Option<VsphereEnv>,
    pub error_mode: ErrorMode,
    pub latest_policy: LatestPolicy,
}

impl Config {
    /// Loads the configuration from built-in defaults, an optional YAML file
    /// and `ESXI_`-prefixed environment variables, in that order of
    /// precedence (later wins). Nested keys use `__`, e.g.
    /// `ESXI_VSPHERE__URL`.
    ///
    /// # Arguments
    ///
    /// * `file`: Configuration file. When given it must exist.
    ///
    pub fn load(file: Option<&Path>) -> Result<Self> {
        match dotenv::dotenv() {
            Ok(path) => tracing::info!(target: "config", path = %path.display(), ".env loaded."),
            Err(error) if error.not_found() => tracing::debug!(target: "config", "No .env file."),
            Err(error) => return Err(error.into()),
        }

        Self::build(file, environment())
    }

    fn build(file: Option<&Path>, environment: config::Environment) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("reference.releases_url", DEFAULT_RELEASES_URL)?
            .set_default("reference.update_url", DEFAULT_RELEASES_URL)?
            .set_default("reference.scsi_url", DEFAULT_SCSI_URL)?
            .set_default("error_mode", "lenient")?
            .set_default("latest_policy", "first-in-table")?;
        if let Some(file) = file {
            builder = builder.add_source(config::File::from(file).required(true));
        }

        let config = builder
            .add_source(environment)
            .build()?
            .try_deserialize::<Config>()?;
        if let Some(vsphere) = &config.vsphere {
            vsphere.validate()?;
        }

        tracing::info!(target: "config", ?config, "Configuration loaded.");

        Ok(config)
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("ESXI")
        .prefix_separator("_")
        .separator("__")
}

// -----------------------------------------------------------------------------

/// Locations of the reference documents.
///
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceEnv {
    pub releases_url: String,
    pub update_url: String,
    pub scsi_url: String,
}

/// All settings required to work with vCenter.
///
#[derive(Debug, Clone, Deserialize)]
pub struct VsphereEnv {
    pub url: String,
    pub username: String,
    pub password: SecretString,
    #[serde(default = "default_api_release")]
    pub api_release: String,
    #[serde(default)]
    pub accept_invalid_certs: bool,
    #[serde(default = "default_task_timeout_sec")]
    pub task_timeout_sec: u64,
    #[serde(default = "default_task_poll_sec")]
    pub task_poll_sec: u64,
}

impl VsphereEnv {
    fn validate(&self) -> Result<()> {
        if self.task_poll_sec == 0 {
            return Err(Error::Validation("vsphere.task_poll_sec must be at least 1".to_owned()));
        }
        if self.task_timeout_sec == 0 {
            return Err(Error::Validation("vsphere.task_timeout_sec must be at least 1".to_owned()));
        }
        Ok(())
    }
}

fn default_api_release() -> String {
    "8.0.1.0".to_owned()
}

fn default_task_timeout_sec() -> u64 {
    60
}

fn default_task_poll_sec() -> u64 {
    1
}

// -----------------------------------------------------------------------------

/// How faults of individual targets are handled.
///
/// * `Strict`: the first fault ends the invocation.
/// * `Lenient`: the fault is logged, the remaining targets are processed and
///   the invocation reports how many targets failed at the end.
///
/// Reference fetch failures end the invocation in both modes.
///
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    Strict,
    #[default]
    Lenient,
}
