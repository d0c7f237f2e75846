use crate::prelude::{AppState, Result};
use crate::reference::types::BuildRecord;
use crate::services::version::{LatestPolicy, ReleaseTable, UNKNOWN, UpdateResolution};
use crate::services::{self, Batch};
use serde::Serialize;

/// Update check result for one host.
///
/// `update_available` is `None` when the current build is not in the table.
///
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecord {
    pub host: String,
    pub current_build: u64,
    pub current_update_release: String,
    pub current_release_date: String,
    pub current_image_profile: String,
    pub latest_build: Option<u64>,
    pub latest_update_release: String,
    pub latest_release_date: String,
    pub latest_image_profile: String,
    pub update_available: Option<bool>,
}

impl UpdateRecord {
    pub fn new(host: &str, build: u64, resolution: &UpdateResolution<'_>) -> Self {
        let text = |record: Option<&BuildRecord>, get: fn(&BuildRecord) -> String| {
            record.map(get).unwrap_or_else(|| UNKNOWN.to_owned())
        };
        let (current, latest) = (resolution.current, resolution.latest);

        Self {
            host: host.to_owned(),
            current_build: build,
            current_update_release: text(current, |record| record.update_release.clone()),
            current_release_date: text(current, |record| record.release_date.to_string()),
            current_image_profile: text(current, |record| record.image_profile.clone()),
            latest_build: latest.map(|record| record.build),
            latest_update_release: text(latest, |record| record.update_release.clone()),
            latest_release_date: text(latest, |record| record.release_date.to_string()),
            latest_image_profile: text(latest, |record| record.image_profile.clone()),
            update_available: resolution.update_available,
        }
    }
}

/// Checks every host for a newer build within its minor release.
///
pub async fn check_updates(
    state: &AppState,
    names: &[String],
    policy: LatestPolicy,
) -> Result<Batch<UpdateRecord>> {
    let releases = state.reference.releases(&state.urls.update_url).await?;
    let table = ReleaseTable::new(releases);
    tracing::debug!(target: "service", builds = table.len(), ?policy, "Update table loaded");

    let hosts = services::collect_hosts(state, names).await?;

    Ok(hosts.map(|host| {
        let Some(build) = host.build else {
            tracing::debug!(target: "service", host = %host.name, "Host reports no build, skipped");
            return None;
        };
        let resolution = table.resolve_latest(build, policy);
        Some(UpdateRecord::new(&host.name, build, &resolution))
    }))
}
