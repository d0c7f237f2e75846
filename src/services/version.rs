//! Build number resolution against the release table.

use crate::prelude::{AppState, Result};
use crate::reference::types::BuildRecord;
use crate::services::{self, Batch};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sentinel for metadata of a build the table does not know.
///
pub const UNKNOWN: &str = "Unknown";

/// Rule that picks the "latest" build of a minor release group.
///
/// * `FirstInTable`: the first record of the group in document order. The
///   published table lists newest builds first, so this is what the table
///   itself considers latest. It is not necessarily the highest build.
/// * `HighestBuild`: the numerically highest build of the group.
///
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LatestPolicy {
    #[default]
    FirstInTable,
    HighestBuild,
}

/// Release records indexed by build and grouped by minor release.
///
/// Builds are unique: a repeated build keeps its first occurrence.
///
#[derive(Debug, Default)]
pub struct ReleaseTable {
    records: Vec<BuildRecord>,
    by_build: HashMap<u64, usize>,
    by_minor_release: HashMap<String, Vec<usize>>,
}

impl ReleaseTable {
    pub fn new(releases: Vec<BuildRecord>) -> Self {
        let mut table = Self::default();

        for record in releases {
            if table.by_build.contains_key(&record.build) {
                tracing::warn!(target: "service", build = record.build, "Duplicate build in release table, keeping the first");
                continue;
            }
            let index = table.records.len();
            table.by_build.insert(record.build, index);
            table
                .by_minor_release
                .entry(record.minor_release.clone())
                .or_default()
                .push(index);
            table.records.push(record);
        }

        table
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Exact lookup by build number.
    ///
    pub fn resolve_version(&self, build: u64) -> Option<&BuildRecord> {
        self.by_build.get(&build).map(|&index| &self.records[index])
    }

    /// Records of one minor release group, in table order.
    ///
    pub fn group(&self, minor_release: &str) -> impl Iterator<Item = &BuildRecord> {
        self.by_minor_release
            .get(minor_release)
            .into_iter()
            .flatten()
            .map(|&index| &self.records[index])
    }

    /// Selects the latest record of a minor release group under `policy`.
    ///
    pub fn latest_in(&self, minor_release: &str, policy: LatestPolicy) -> Option<&BuildRecord> {
        let mut group = self.group(minor_release);
        match policy {
            LatestPolicy::FirstInTable => group.next(),
            LatestPolicy::HighestBuild => group.max_by_key(|record| record.build),
        }
    }

    /// Resolves `build` and the latest build of its minor release.
    ///
    /// An unknown build leaves every part of the resolution empty, including
    /// `update_available`.
    ///
    pub fn resolve_latest(&self, build: u64, policy: LatestPolicy) -> UpdateResolution<'_> {
        let Some(current) = self.resolve_version(build) else {
            return UpdateResolution::default();
        };
        let latest = self.latest_in(&current.minor_release, policy);

        UpdateResolution {
            current: Some(current),
            latest,
            update_available: latest.map(|latest| latest.build != build),
        }
    }
}

/// Outcome of [`ReleaseTable::resolve_latest`].
///
#[derive(Debug, Default, PartialEq)]
pub struct UpdateResolution<'a> {
    pub current: Option<&'a BuildRecord>,
    pub latest: Option<&'a BuildRecord>,
    pub update_available: Option<bool>,
}

// -----------------------------------------------------------------------------

/// Friendly version metadata of one build, optionally tied to a host.
///
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub build: u64,
    pub friendly_name: String,
    pub release_date: String,
    pub minor_release: String,
    pub update_release: String,
    pub image_profile: String,
}

impl VersionRecord {
    pub fn new(host: Option<&str>, build: u64, record: Option<&BuildRecord>) -> Self {
        let field = |get: fn(&BuildRecord) -> String| record.map(get).unwrap_or_else(|| UNKNOWN.to_owned());

        Self {
            host: host.map(str::to_owned),
            build,
            friendly_name: field(|record| record.friendly_name.clone()),
            release_date: field(|record| record.release_date.to_string()),
            minor_release: field(|record| record.minor_release.clone()),
            update_release: field(|record| record.update_release.clone()),
            image_profile: field(|record| record.image_profile.clone()),
        }
    }
}

/// Resolves the build of every host. Hosts without a build are skipped.
///
pub async fn host_versions(state: &AppState, names: &[String]) -> Result<Batch<VersionRecord>> {
    let releases = state.reference.releases(&state.urls.releases_url).await?;
    let table = ReleaseTable::new(releases);

    let hosts = services::collect_hosts(state, names).await?;

    Ok(hosts.map(|host| {
        let Some(build) = host.build else {
            tracing::debug!(target: "service", host = %host.name, "Host reports no build, skipped");
            return None;
        };
        let record = table.resolve_version(build);
        tracing::debug!(target: "service", host = %host.name, build, found = record.is_some(), "Build resolved");
        Some(VersionRecord::new(Some(&host.name), build, record))
    }))
}

/// Resolves raw build numbers without contacting vCenter.
///
pub async fn build_versions(state: &AppState, builds: &[u64]) -> Result<Vec<VersionRecord>> {
    let releases = state.reference.releases(&state.urls.releases_url).await?;
    let table = ReleaseTable::new(releases);

    Ok(builds
        .iter()
        .map(|&build| VersionRecord::new(None, build, table.resolve_version(build)))
        .collect())
}
