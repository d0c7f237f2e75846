use crate::helpers::TestApp;
use crate::helpers::mocks::{MockReference, MockVsphere};
use esxi_toolkit::cli::{Command, LatencyCommand};
use esxi_toolkit::prelude::Error;
use esxi_toolkit::vsphere::types::LatencyLevel;
use serde_json::{Value, json};

fn inventory() -> MockVsphere {
    MockVsphere::with_vms(&[
        ("vm-1", "db01", Some(LatencyLevel::Normal)),
        ("vm-2", "web01", None),
        ("vm-3", "app01", Some(LatencyLevel::High)),
    ])
}

fn set(level: &str, vms: &[&str]) -> Command {
    Command::Latency(LatencyCommand::Set {
        level: level.to_owned(),
        vms: vms.iter().map(|vm| (*vm).to_owned()).collect(),
    })
}

#[tokio::test]
async fn get_all_uses_one_bulk_query() {
    // Arrange
    let app = TestApp::new(MockReference::default(), inventory());

    // Act
    let (result, records) = app
        .run(Command::Latency(LatencyCommand::Get { vms: vec![] }))
        .await;

    // Assert
    assert!(result.is_ok());
    assert_eq!(app.vsphere.calls(), vec!["all_vm_latency"]);
    assert_eq!(
        records,
        vec![
            json!({"vmName": "db01", "level": "normal"}),
            json!({"vmName": "web01", "level": null}),
            json!({"vmName": "app01", "level": "high"}),
        ]
    );
}

#[tokio::test]
async fn get_named_vms_per_object() {
    // Arrange
    let app = TestApp::new(MockReference::default(), inventory());

    // Act
    let (result, records) = app
        .run(Command::Latency(LatencyCommand::Get {
            vms: vec!["app01".to_owned(), "ghost".to_owned(), "db01".to_owned()],
        }))
        .await;

    // Assert
    assert!(matches!(result, Err(Error::Incomplete(1))));
    let names: Vec<&Value> = records.iter().map(|record| &record["vmName"]).collect();
    assert_eq!(names, vec!["app01", "db01"]);
    assert_eq!(
        app.vsphere.calls(),
        vec!["vm_latency app01", "vm_latency ghost", "vm_latency db01"]
    );
}

#[tokio::test]
async fn invalid_level_is_rejected_before_any_call() {
    // Arrange
    let app = TestApp::new(MockReference::default(), inventory());

    // Act
    let (result, records) = app.run(set("invalid", &["db01"])).await;

    // Assert
    assert!(matches!(result, Err(Error::Validation(_))));
    assert!(records.is_empty());
    assert!(app.vsphere.calls().is_empty());
}

#[tokio::test]
async fn set_reconfigures_and_waits_for_task() {
    // Arrange
    let app = TestApp::new(MockReference::default(), inventory());

    // Act
    let (result, records) = app.run(set("HIGH", &["db01", "web01"])).await;

    // Assert
    assert!(result.is_ok());
    assert_eq!(
        records,
        vec![
            json!({"vmName": "db01", "previous": "normal", "level": "high"}),
            json!({"vmName": "web01", "previous": null, "level": "high"}),
        ]
    );
    assert_eq!(
        app.vsphere.calls(),
        vec![
            "vm_latency db01",
            "reconfigure_latency vm-1 high",
            "task_status task-vm-1",
            "vm_latency web01",
            "reconfigure_latency vm-2 high",
            "task_status task-vm-2",
        ]
    );
}

#[tokio::test]
async fn api_fault_aborts_only_that_vm_in_lenient_mode() {
    // Arrange
    let app = TestApp::new(MockReference::default(), inventory().reject("vm-1"));

    // Act
    let (result, records) = app.run(set("low", &["db01", "app01"])).await;

    // Assert
    assert!(matches!(result, Err(Error::Incomplete(1))));
    assert_eq!(
        records,
        vec![json!({"vmName": "app01", "previous": "high", "level": "low"})]
    );
}

#[tokio::test]
async fn api_fault_stops_batch_in_strict_mode() {
    // Arrange
    let app = TestApp::new(MockReference::default(), inventory().reject("vm-1")).strict();

    // Act
    let (result, records) = app.run(set("low", &["db01", "app01"])).await;

    // Assert
    assert!(matches!(result, Err(Error::Vsphere(..))));
    assert!(records.is_empty());
    assert!(!app.vsphere.calls().contains(&"vm_latency app01".to_owned()));
}

#[tokio::test]
async fn failed_task_is_reported() {
    // Arrange
    let app = TestApp::new(MockReference::default(), inventory().fail_task("vm-2")).strict();

    // Act
    let (result, _) = app.run(set("medium", &["web01"])).await;

    // Assert
    match result.unwrap_err() {
        Error::TaskFailed(message) => assert_eq!(message, "A specified parameter was not correct"),
        error => panic!("unexpected error: {}", error),
    }
}

#[tokio::test]
async fn latency_never_fetches_reference_data() {
    let app = TestApp::new(MockReference::default(), inventory());

    let (result, _) = app.run(set("normal", &["db01"])).await;

    assert!(result.is_ok());
    assert!(app.reference.requests().is_empty());
}

#[tokio::test]
async fn changes_before_a_fault_are_reported_for_shared_names() {
    // Arrange
    let vsphere = MockVsphere::with_vms(&[
        ("vm-1", "dup", Some(LatencyLevel::Normal)),
        ("vm-2", "dup", None),
        ("vm-3", "dup", Some(LatencyLevel::Low)),
    ])
    .reject("vm-2");
    let app = TestApp::new(MockReference::default(), vsphere);

    // Act
    let (result, records) = app.run(set("high", &["dup"])).await;

    // Assert
    assert!(matches!(result, Err(Error::Incomplete(1))));
    assert_eq!(
        records,
        vec![
            json!({"vmName": "dup", "previous": "normal", "level": "high"}),
            json!({"vmName": "dup", "previous": "low", "level": "high"}),
        ]
    );
    assert_eq!(
        app.vsphere.calls(),
        vec![
            "vm_latency dup",
            "reconfigure_latency vm-1 high",
            "task_status task-vm-1",
            "reconfigure_latency vm-2 high",
            "reconfigure_latency vm-3 high",
            "task_status task-vm-3",
        ]
    );
}

#[tokio::test]
async fn shared_name_fault_stops_in_strict_mode() {
    // Arrange
    let vsphere = MockVsphere::with_vms(&[
        ("vm-1", "dup", Some(LatencyLevel::Normal)),
        ("vm-2", "dup", None),
        ("vm-3", "dup", Some(LatencyLevel::Low)),
    ])
    .reject("vm-2");
    let app = TestApp::new(MockReference::default(), vsphere).strict();

    // Act
    let (result, _) = app.run(set("high", &["dup"])).await;

    // Assert
    assert!(matches!(result, Err(Error::Vsphere(..))));
    assert!(!app.vsphere.calls().contains(&"reconfigure_latency vm-3 high".to_owned()));
}
