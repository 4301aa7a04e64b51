//! Integration tests for the update cycle state machine.

mod support;

use std::sync::Arc;

use fleetsim_api::models::{Credential, DeploymentStatus};
use fleetsim_client::{CredentialSlot, CycleError, CycleOutcome, UpdateWorker};
use fleetsim_common::DeviceAddress;

use support::{test_settings, MockApi};

fn worker_fixture(api: Arc<MockApi>, state_dir: &std::path::Path) -> (UpdateWorker, CredentialSlot) {
    api.set_valid_token("tok");
    let slot = CredentialSlot::new();
    slot.install(Credential::new("tok"));

    let worker = UpdateWorker::new(
        api,
        DeviceAddress::generate(),
        slot.clone(),
        Arc::new(test_settings(state_dir)),
    );
    (worker, slot)
}

#[tokio::test(start_paused = true)]
async fn cycle_reports_statuses_in_strict_order() {
    let dir = tempfile::tempdir().unwrap();
    let api = Arc::new(MockApi::new());
    // One empty poll first: the worker must stay in polling and retry
    api.queue_no_update();
    api.queue_update("dep-1");

    let (worker, _slot) = worker_fixture(Arc::clone(&api), dir.path());
    let outcome = worker.run_cycle().await.unwrap();

    assert_eq!(outcome, CycleOutcome::Success);
    let statuses = api.statuses();
    assert_eq!(
        statuses,
        vec![
            ("dep-1".to_string(), DeploymentStatus::Installing),
            ("dep-1".to_string(), DeploymentStatus::Downloading),
            ("dep-1".to_string(), DeploymentStatus::Rebooting),
            ("dep-1".to_string(), DeploymentStatus::Success),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn rejection_during_installing_aborts_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let api = Arc::new(MockApi::new());
    api.queue_update("dep-1");
    api.revoke_when_reporting(DeploymentStatus::Installing);

    let (worker, _slot) = worker_fixture(Arc::clone(&api), dir.path());
    let err = worker.run_cycle().await.unwrap_err();

    assert!(matches!(err, CycleError::CredentialRejected));
    // No later phase may be reported once the rejection lands
    assert!(api.statuses().is_empty());
}

#[tokio::test(start_paused = true)]
async fn forced_failure_reports_failure_with_log() {
    let dir = tempfile::tempdir().unwrap();
    let api = Arc::new(MockApi::new());
    api.queue_update("dep-2");

    api.set_valid_token("tok");
    let slot = CredentialSlot::new();
    slot.install(Credential::new("tok"));
    let mut settings = test_settings(dir.path());
    settings.fail_message = Some("disk full".to_string());

    let worker = UpdateWorker::new(
        api.clone(),
        DeviceAddress::generate(),
        slot,
        Arc::new(settings),
    );
    let outcome = worker.run_cycle().await.unwrap();

    assert_eq!(outcome, CycleOutcome::Failure);
    let statuses: Vec<DeploymentStatus> = api.statuses().into_iter().map(|(_, s)| s).collect();
    assert_eq!(
        statuses,
        vec![
            DeploymentStatus::Installing,
            DeploymentStatus::Downloading,
            DeploymentStatus::Rebooting,
            DeploymentStatus::Failure,
        ]
    );

    let logs = api.logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].0, "dep-2");
    assert_eq!(logs[0].1.messages.len(), 1);
    assert_eq!(logs[0].1.messages[0].message, "disk full");
}

#[tokio::test(start_paused = true)]
async fn downloaded_image_is_stored_when_configured() {
    let dir = tempfile::tempdir().unwrap();
    let api = Arc::new(MockApi::new());
    api.queue_update("dep-12345678");

    api.set_valid_token("tok");
    let slot = CredentialSlot::new();
    slot.install(Credential::new("tok"));
    let mut settings = test_settings(dir.path());
    settings.store_images = true;

    let worker = UpdateWorker::new(
        api.clone(),
        DeviceAddress::generate(),
        slot,
        Arc::new(settings),
    );
    worker.run_cycle().await.unwrap();

    // Image files are named after the deployment id prefix
    let stored = dir.path().join("dep-1234.image");
    assert!(stored.exists());
}
