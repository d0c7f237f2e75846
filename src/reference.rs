pub mod client;
pub mod types;

// -----------------------------------------------------------------------------

use crate::prelude::Result;
use crate::reference::types::{BuildRecord, ScsiCodeTables};
use async_trait::async_trait;

/// Remote reference database. Every call downloads the whole document again.
///
#[async_trait]
pub trait ReferenceDb {
    async fn releases(&self, url: &str) -> Result<Vec<BuildRecord>>;
    async fn scsi_codes(&self, url: &str) -> Result<ScsiCodeTables>;
}
