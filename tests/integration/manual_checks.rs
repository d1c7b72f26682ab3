//! Orchestrator-level manual check fan-out.

use std::time::Duration;

use fleetwatch::orchestrator::{CheckTarget, start_monitoring};
use fleetwatch::poller::MetricKind;
use tokio_test::assert_ok;
use wiremock::MockServer;

use crate::helpers::*;

/// Give freshly spawned loops time to run their startup polls.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn all_target_combines_every_server_into_one_message() {
    let agent_a = MockServer::start().await;
    let agent_b = MockServer::start().await;
    mount_disk(&agent_a, 50.0, 100).await;
    mount_disk(&agent_b, 75.0, 100).await;

    let mut profile_a = bare_profile("a", &agent_a.uri());
    profile_a.disk = Some(disk_config(99.0));
    let mut profile_b = bare_profile("b", &agent_b.uri());
    profile_b.disk = Some(disk_config(99.0));

    let notifier = RecordingNotifier::new();
    let monitor = start_monitoring(&[profile_a, profile_b], None, notifier.clone());
    settle().await;
    assert!(notifier.messages().is_empty(), "startup polls stay quiet");

    assert_ok!(
        monitor
            .trigger_manual_check(&CheckTarget::All, MetricKind::Disk)
            .await
    );

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1, "one combined report");
    assert!(messages[0].contains("Test a"));
    assert!(messages[0].contains("Test b"));
    assert!(messages[0].contains("`50.0 %`"));
    assert!(messages[0].contains("`75.0 %`"));

    monitor.shutdown().await;
}

#[tokio::test]
async fn single_server_target_reports_only_that_server() {
    let agent_a = MockServer::start().await;
    let agent_b = MockServer::start().await;
    mount_disk(&agent_a, 50.0, 100).await;
    mount_disk(&agent_b, 75.0, 100).await;

    let mut profile_a = bare_profile("a", &agent_a.uri());
    profile_a.disk = Some(disk_config(99.0));
    let mut profile_b = bare_profile("b", &agent_b.uri());
    profile_b.disk = Some(disk_config(99.0));

    let notifier = RecordingNotifier::new();
    let monitor = start_monitoring(&[profile_a, profile_b], None, notifier.clone());
    settle().await;

    monitor
        .trigger_manual_check(&CheckTarget::Server("b".into()), MetricKind::Disk)
        .await
        .unwrap();

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Test b"));
    assert!(!messages[0].contains("Test a"));

    monitor.shutdown().await;
}

#[tokio::test]
async fn unknown_server_or_unconfigured_kind_is_an_error() {
    let agent = MockServer::start().await;
    mount_disk(&agent, 50.0, 100).await;

    let mut profile = bare_profile("a", &agent.uri());
    profile.disk = Some(disk_config(99.0));

    let notifier = RecordingNotifier::new();
    let monitor = start_monitoring(&[profile], None, notifier.clone());
    settle().await;

    assert!(
        monitor
            .trigger_manual_check(&CheckTarget::Server("nope".into()), MetricKind::Disk)
            .await
            .is_err()
    );

    // no cpu_ram loop was configured for this server
    assert!(
        monitor
            .trigger_manual_check(&CheckTarget::All, MetricKind::CpuRam)
            .await
            .is_err()
    );

    assert!(notifier.messages().is_empty());

    monitor.shutdown().await;
}

#[tokio::test]
async fn manual_updates_check_reports_fresh_pending_packages() {
    let agent = MockServer::start().await;
    // startup poll sees an empty set, the manual check a pending package
    mount_updates(&agent, &[], 1).await;
    mount_updates(&agent, &["openssl"], 100).await;

    let mut profile = bare_profile("a", &agent.uri());
    profile.updates = Some(updates_config());

    let notifier = RecordingNotifier::new();
    let monitor = start_monitoring(&[profile], None, notifier.clone());
    settle().await;
    assert!(notifier.messages().is_empty());

    monitor
        .trigger_manual_check(&CheckTarget::All, MetricKind::Updates)
        .await
        .unwrap();

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("openssl"));

    monitor.shutdown().await;
}

#[tokio::test]
async fn manual_backup_check_reports_even_on_success() {
    let agent = MockServer::start().await;
    mount_backup(&agent, "success").await;

    let mut profile = bare_profile("a", &agent.uri());
    profile.backups = Some(fleetwatch::config::BackupsConfig {
        time: "07:00".into(),
    });

    let notifier = RecordingNotifier::new();
    let monitor = start_monitoring(&[profile], None, notifier.clone());
    settle().await;

    monitor
        .trigger_manual_check(&CheckTarget::All, MetricKind::Backups)
        .await
        .unwrap();

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Backup completed successfully"));

    monitor.shutdown().await;
}
