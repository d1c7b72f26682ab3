//! End-to-end metric scenarios: real HTTP fetches against a mock agent,
//! driven sample by sample through the check strategies.

use fleetwatch::checks::{BackupsCheck, CpuRamCheck, DiskCheck, ProcessesCheck, UpdatesCheck};
use fleetwatch::poller::MetricCheck;
use pretty_assertions::assert_eq;
use wiremock::MockServer;

use crate::helpers::*;

/// Fetch one sample and run it through the analyzer, returning the verdict.
async fn step<C: MetricCheck>(check: &mut C) -> bool {
    let sample = check.fetch().await.expect("agent fetch should succeed");
    check.analyze(&sample)
}

#[tokio::test]
async fn cpu_alarm_fires_after_exactly_four_critical_samples() {
    let agent = MockServer::start().await;
    // 4 critical samples, then sustained calm
    mount_cpu_ram(&agent, 96.0, 10.0, 4).await;
    mount_cpu_ram(&agent, 10.0, 10.0, 100).await;

    let profile = bare_profile("a", &agent.uri());
    let mut check = CpuRamCheck::new(&profile, cpu_ram_config());

    let mut verdicts = Vec::new();
    for _ in 0..6 {
        verdicts.push(step(&mut check).await);
    }

    // one ALARM notification after the 4th sample, one recovery after the
    // 5th, silence otherwise
    assert_eq!(verdicts, vec![false, false, false, true, true, false]);
}

#[tokio::test]
async fn cpu_alarm_report_carries_the_overload_label() {
    let agent = MockServer::start().await;
    mount_cpu_ram(&agent, 96.0, 10.0, 100).await;

    let profile = bare_profile("a", &agent.uri());
    let mut check = CpuRamCheck::new(&profile, cpu_ram_config());

    let mut last_sample = None;
    for _ in 0..4 {
        let sample = check.fetch().await.unwrap();
        check.analyze(&sample);
        last_sample = Some(sample);
    }

    let report = check.format(&last_sample.unwrap());
    assert!(report.contains("OVERLOAD"));
    assert!(report.contains("`96.0 %`"));
    assert!(report.contains("`0.42`"));
}

#[tokio::test]
async fn disk_notifies_on_cross_up_and_cross_down_only() {
    let agent = MockServer::start().await;
    mount_disk(&agent, 50.0, 1).await;
    mount_disk(&agent, 95.0, 2).await;
    mount_disk(&agent, 50.0, 100).await;

    let profile = bare_profile("a", &agent.uri());
    let mut check = DiskCheck::new(&profile, disk_config(90.0));

    let mut verdicts = Vec::new();
    for _ in 0..4 {
        verdicts.push(step(&mut check).await);
    }

    assert_eq!(verdicts, vec![false, true, false, true]);
}

#[tokio::test]
async fn updates_notify_on_set_changes_in_both_directions() {
    let agent = MockServer::start().await;
    mount_updates(&agent, &[], 1).await;
    mount_updates(&agent, &["openssl", "zlib"], 2).await;
    mount_updates(&agent, &[], 100).await;

    let profile = bare_profile("a", &agent.uri());
    let mut check = UpdatesCheck::new(&profile, updates_config());

    let mut verdicts = Vec::new();
    for _ in 0..4 {
        verdicts.push(step(&mut check).await);
    }

    // appearing packages and the drain back to empty both notify; repeats
    // are silent
    assert_eq!(verdicts, vec![false, true, false, true]);
}

#[tokio::test]
async fn processes_notify_when_a_failure_appears_across_sources() {
    let agent = MockServer::start().await;

    mount_processes(
        &agent,
        serde_json::json!([{ "name": "nginx", "active": "active", "sub": "running" }]),
        serde_json::json!([{ "name": "api", "status": "online" }]),
        1,
    )
    .await;
    mount_processes(
        &agent,
        serde_json::json!([
            { "name": "nginx", "active": "active", "sub": "running" },
            { "name": "redis", "active": "failed", "sub": "failed" }
        ]),
        serde_json::json!([{ "name": "api", "status": "online" }]),
        100,
    )
    .await;

    let profile = bare_profile("a", &agent.uri());
    let mut check = ProcessesCheck::new(&profile, processes_config());

    assert!(!step(&mut check).await, "healthy baseline is silent");
    assert!(step(&mut check).await, "new failure is a change");
    assert!(!step(&mut check).await, "same failure again is silent");

    let sample = check.fetch().await.unwrap();
    let report = check.format(&sample);
    assert!(report.contains("redis"));
    assert!(report.contains("• PM2: ✅ ok"));
}

#[tokio::test]
async fn miner_signature_match_notifies_and_is_flagged() {
    let agent = MockServer::start().await;

    mount_processes(
        &agent,
        serde_json::json!([{ "name": "nginx", "active": "active", "sub": "running" }]),
        serde_json::json!([{ "name": "XMRig", "status": "online" }]),
        100,
    )
    .await;

    let profile = bare_profile("a", &agent.uri());
    let mut check = ProcessesCheck::new(&profile, processes_config());

    assert!(step(&mut check).await, "a miner appearing is a change");

    let sample = check.fetch().await.unwrap();
    let report = check.format(&sample);
    assert!(report.contains("miners detected"));
    assert!(report.contains("XMRig"));
}

#[tokio::test]
async fn backup_failure_notifies_success_stays_quiet() {
    let failed_agent = MockServer::start().await;
    mount_backup(&failed_agent, "failed").await;

    let profile = bare_profile("a", &failed_agent.uri());
    let mut check = BackupsCheck::new(
        &profile,
        chrono::NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
    );

    let report = check.fetch().await.unwrap();
    assert!(check.analyze(&report), "scheduled check notifies on failure");

    let rendered = check.format(&report);
    assert!(rendered.contains("❌ *Backup failed*"));
    assert!(rendered.contains("❌☁️ Cloud upload failed"));

    let ok_agent = MockServer::start().await;
    mount_backup(&ok_agent, "success").await;

    let profile = bare_profile("b", &ok_agent.uri());
    let mut check = BackupsCheck::new(
        &profile,
        chrono::NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
    );

    let report = check.fetch().await.unwrap();
    assert!(!check.analyze(&report), "scheduled check is silent on success");
}
