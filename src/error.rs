use derive_more::Display;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Defines the application's custom error types.
///
#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid value: {0}")]
    Validation(String),
    #[error("Missing setting: {0}")]
    MissingSetting(String),
    #[error("Timeout after: {0} seconds")]
    Timeout(f32),
    #[error("Reconfiguration task failed: {0}")]
    TaskFailed(String),
    #[error("{0} target(s) failed")]
    Incomplete(usize),
    #[error("Failed to fetch reference data from '{0}': {1}")]
    Fetch(String, reqwest::Error),
    #[error("Reference data request to '{0}' failed: status {1}")]
    FetchStatus(String, reqwest::StatusCode),
    #[error("vSphere API error: {0} failed: status {1}, body: {2}")]
    Vsphere(VsphereError, reqwest::StatusCode, String),
    #[error("Header convert error: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Environment error: {0}")]
    Environment(#[from] dotenv::Error),
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Failed to set logger: {0}")]
    Logger(#[from] tracing::log::SetLoggerError),
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] tracing::dispatcher::SetGlobalDefaultError),
    #[error("IO error: {0}")]
    InputOutput(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl Error {
    /// Whether the error belongs to a single target rather than to the whole
    /// invocation. Only these are eligible for lenient handling.
    ///
    pub fn is_target_fault(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_)
                | Error::Vsphere(..)
                | Error::TaskFailed(_)
                | Error::Timeout(_)
        )
    }
}

/// Represents errors related to vSphere API operations.
///
#[derive(Debug, Display)]
pub enum VsphereError {
    Login,
    Inventory,
    Properties,
    Reconfigure,
    Task,
}
