use crate::config::{Config, ErrorMode, ReferenceEnv};
use crate::prelude::{Error, ReferenceDb, Result, Vsphere};
use crate::reference::client::ReferenceClient;
use crate::services::TaskWait;
use crate::vsphere::client::VsphereClient;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Holds the handles to both external collaborators and the per-invocation
/// settings every service needs.
///
#[derive(Clone)]
pub struct AppState {
    pub reference: Arc<dyn ReferenceDb + Send + Sync>,
    pub vsphere: Option<Arc<dyn Vsphere + Send + Sync>>,
    pub urls: ReferenceEnv,
    pub error_mode: ErrorMode,
    pub task_wait: TaskWait,
}

impl AppState {
    /// Builds the state with the real HTTP clients. The vSphere client is
    /// only created when connection settings are present.
    ///
    pub fn from_config(config: &Config) -> Result<Self> {
        let (vsphere, task_wait) = match &config.vsphere {
            Some(settings) => (
                Some(Arc::new(VsphereClient::new(settings)?) as Arc<dyn Vsphere + Send + Sync>),
                TaskWait::from(settings),
            ),
            None => (None, TaskWait::default()),
        };

        Ok(Self {
            reference: Arc::new(ReferenceClient::new()),
            vsphere,
            urls: config.reference.clone(),
            error_mode: config.error_mode,
            task_wait,
        })
    }

    /// Returns the vSphere accessor or an error naming the missing settings.
    ///
    pub fn vsphere(&self) -> Result<&Arc<dyn Vsphere + Send + Sync>> {
        self.vsphere.as_ref().ok_or_else(|| {
            Error::MissingSetting("vsphere.url, vsphere.username, vsphere.password".to_owned())
        })
    }
}

impl Debug for AppState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("Reference", &"Arc<dyn ReferenceDb>")
            .field("Vsphere", &self.vsphere.as_ref().map(|_| "Arc<dyn Vsphere>"))
            .field("Urls", &self.urls)
            .field("ErrorMode", &self.error_mode)
            .field("TaskWait", &self.task_wait)
            .finish()
    }
}
