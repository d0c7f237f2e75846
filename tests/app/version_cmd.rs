use crate::helpers::mocks::{MockReference, MockVsphere};
use crate::helpers::{TestApp, releases};
use esxi_toolkit::cli::Command;
use esxi_toolkit::prelude::Error;
use esxi_toolkit::services::version::LatestPolicy;
use esxi_toolkit::vsphere::types::HostDescriptor;
use serde_json::{Value, json};

fn hosts() -> Vec<HostDescriptor> {
    vec![
        HostDescriptor::new("esx01", Some(110)),
        HostDescriptor::new("esx02", Some(999)),
        HostDescriptor::new("esx03", None),
        HostDescriptor::new("esx04", Some(200)),
    ]
}

fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_owned()).collect()
}

#[tokio::test]
async fn version_for_named_hosts_keeps_input_order() {
    // Arrange
    let app = TestApp::new(
        MockReference::with_releases(releases()),
        MockVsphere::with_hosts(hosts()),
    );

    // Act
    let (result, records) = app
        .run(Command::Version {
            hosts: names(&["esx04", "esx01"]),
        })
        .await;

    // Assert
    assert!(result.is_ok());
    let hosts: Vec<&Value> = records.iter().map(|record| &record["host"]).collect();
    assert_eq!(hosts, vec!["esx04", "esx01"]);
    assert_eq!(records[1]["build"], 110);
    assert_eq!(records[1]["updateRelease"], "6.0 U1");
    assert_eq!(records[1]["releaseDate"], "2023-04-18");
    assert_eq!(
        app.vsphere.calls(),
        vec!["host_by_name esx04", "host_by_name esx01"]
    );
}

#[tokio::test]
async fn version_for_all_hosts_uses_one_inventory_query() {
    // Arrange
    let app = TestApp::new(
        MockReference::with_releases(releases()),
        MockVsphere::with_hosts(hosts()),
    );

    // Act
    let (result, records) = app.run(Command::Version { hosts: vec![] }).await;

    // Assert
    assert!(result.is_ok());
    assert_eq!(app.vsphere.calls(), vec!["all_hosts"]);
    // esx03 has no build and produces no record.
    assert_eq!(records.len(), 3);
    assert_eq!(
        records[1],
        json!({
            "host": "esx02",
            "build": 999,
            "friendlyName": "Unknown",
            "releaseDate": "Unknown",
            "minorRelease": "Unknown",
            "updateRelease": "Unknown",
            "imageProfile": "Unknown"
        })
    );
    assert_eq!(
        app.reference.requests(),
        vec!["http://reference.test/releases.json"]
    );
}

#[tokio::test]
async fn lenient_mode_reports_remaining_hosts() {
    // Arrange
    let app = TestApp::new(
        MockReference::with_releases(releases()),
        MockVsphere::with_hosts(hosts()),
    );

    // Act
    let (result, records) = app
        .run(Command::Version {
            hosts: names(&["missing", "esx01"]),
        })
        .await;

    // Assert
    assert!(matches!(result, Err(Error::Incomplete(1))));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["host"], "esx01");
}

#[tokio::test]
async fn strict_mode_stops_at_first_fault() {
    // Arrange
    let app = TestApp::new(
        MockReference::with_releases(releases()),
        MockVsphere::with_hosts(hosts()),
    )
    .strict();

    // Act
    let (result, records) = app
        .run(Command::Version {
            hosts: names(&["missing", "esx01"]),
        })
        .await;

    // Assert
    assert!(matches!(result, Err(Error::NotFound(_))));
    assert!(records.is_empty());
    assert_eq!(app.vsphere.calls(), vec!["host_by_name missing"]);
}

#[tokio::test]
async fn fetch_failure_is_fatal() {
    // Arrange
    let app = TestApp::new(MockReference::unavailable(), MockVsphere::with_hosts(hosts()));

    // Act
    let (result, records) = app.run(Command::Version { hosts: vec![] }).await;

    // Assert
    assert!(matches!(result, Err(Error::FetchStatus(..))));
    assert!(records.is_empty());
    assert!(app.vsphere.calls().is_empty());
}

#[tokio::test]
async fn update_check_with_explicit_policies() {
    // Arrange
    let app = TestApp::new(
        MockReference::with_releases(releases()),
        MockVsphere::with_hosts(vec![HostDescriptor::new("esx01", Some(100))]),
    );

    // Act
    let (_, first_in_table) = app
        .run(Command::UpdateCheck {
            latest_policy: Some(LatestPolicy::FirstInTable),
            hosts: vec![],
        })
        .await;
    let (_, highest_build) = app
        .run(Command::UpdateCheck {
            latest_policy: Some(LatestPolicy::HighestBuild),
            hosts: vec![],
        })
        .await;

    // Assert
    assert_eq!(first_in_table[0]["latestBuild"], 100);
    assert_eq!(first_in_table[0]["updateAvailable"], false);
    assert_eq!(highest_build[0]["latestBuild"], 110);
    assert_eq!(highest_build[0]["latestUpdateRelease"], "6.0 U1");
    assert_eq!(highest_build[0]["updateAvailable"], true);
    assert_eq!(
        app.reference.requests(),
        vec![
            "http://reference.test/update.json",
            "http://reference.test/update.json"
        ]
    );
}

#[tokio::test]
async fn update_check_for_unknown_build_leaves_availability_unset() {
    // Arrange
    let app = TestApp::new(
        MockReference::with_releases(releases()),
        MockVsphere::with_hosts(vec![HostDescriptor::new("esx01", Some(42))]),
    );

    // Act
    let (result, records) = app
        .run(Command::UpdateCheck {
            latest_policy: None,
            hosts: names(&["esx01"]),
        })
        .await;

    // Assert
    assert!(result.is_ok());
    assert_eq!(records[0]["currentBuild"], 42);
    assert_eq!(records[0]["currentUpdateRelease"], "Unknown");
    assert_eq!(records[0]["latestBuild"], Value::Null);
    assert_eq!(records[0]["latestUpdateRelease"], "Unknown");
    assert_eq!(records[0]["updateAvailable"], Value::Null);
}

#[tokio::test]
async fn build_lookup_works_without_vsphere() {
    // Arrange
    let app = TestApp::new(MockReference::with_releases(releases()), MockVsphere::default())
        .without_vsphere();

    // Act
    let (result, records) = app
        .run(Command::Build {
            builds: vec![200, 7],
        })
        .await;

    // Assert
    assert!(result.is_ok());
    assert_eq!(records.len(), 2);
    assert!(records[0].get("host").is_none());
    assert_eq!(records[0]["minorRelease"], "6.5");
    assert_eq!(records[1]["friendlyName"], "Unknown");
}

#[tokio::test]
async fn inventory_commands_need_vsphere_settings() {
    let app = TestApp::new(MockReference::with_releases(releases()), MockVsphere::default())
        .without_vsphere();

    let (result, _) = app.run(Command::Version { hosts: vec![] }).await;

    assert!(matches!(result, Err(Error::MissingSetting(_))));
}
