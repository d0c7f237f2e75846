pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod reference;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod vsphere;

pub mod prelude {
    pub use crate::error::{Error, Result, VsphereError};
    pub use crate::state::AppState;

    pub use crate::reference::ReferenceDb;
    pub use crate::vsphere::Vsphere;
}
