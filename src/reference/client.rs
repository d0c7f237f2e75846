use crate::prelude::{Error, ReferenceDb, Result};
use crate::reference::types::{BuildRecord, ReleaseDocument, ScsiCodeTables};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;

/// Downloads reference documents over plain HTTP(S) using `reqwest`.
///
/// Nothing is cached between calls and failed requests are not retried: a
/// failure here is fatal to the whole invocation.
///
#[derive(Default)]
pub struct ReferenceClient {
    client: OnceCell<Client>,
}

impl ReferenceClient {
    pub fn new() -> Self {
        Self::default()
    }

    async fn get_client(&self) -> Result<&Client> {
        self.client
            .get_or_try_init(|| async {
                Client::builder()
                    .user_agent(concat!("esxi-toolkit/", env!("CARGO_PKG_VERSION")))
                    .build()
                    .map_err(Error::from)
            })
            .await
    }

    /// Performs a single GET against `url` and decodes the JSON body.
    ///
    /// # Types
    ///
    /// * `D`: Type of the document, which must be deserializable.
    ///
    /// # Returns
    ///
    /// The decoded document, `Error::FetchStatus` for a non-success status or
    /// `Error::Fetch` when the endpoint is unreachable or the body is not the
    /// expected JSON.
    ///
    async fn fetch<D>(&self, url: &str) -> Result<D>
    where
        D: DeserializeOwned,
    {
        let client = self.get_client().await?;
        tracing::debug!(target: "reference", url, "Fetching reference document");

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|error| Error::Fetch(url.to_owned(), error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::FetchStatus(url.to_owned(), status));
        }

        response
            .json::<D>()
            .await
            .map_err(|error| Error::Fetch(url.to_owned(), error))
    }
}

#[async_trait]
impl ReferenceDb for ReferenceClient {
    async fn releases(&self, url: &str) -> Result<Vec<BuildRecord>> {
        let document: ReleaseDocument = self.fetch(url).await?;
        tracing::debug!(target: "reference", count = document.data.releases.len(), "Release table loaded");
        Ok(document.data.releases)
    }

    async fn scsi_codes(&self, url: &str) -> Result<ScsiCodeTables> {
        self.fetch(url).await
    }
}
