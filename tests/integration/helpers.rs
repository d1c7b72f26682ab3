//! Test helpers shared by the integration modules.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fleetwatch::config::{
    CpuRamConfig, DiskConfig, IntervalTable, ProcessesConfig, ServerProfile, UpdatesConfig,
};
use fleetwatch::notify::{Notifier, NotifyError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Notifier double that records every delivered message.
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            messages: Mutex::new(Vec::new()),
        })
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, text: &str) -> Result<(), NotifyError> {
        self.messages.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// A profile pointing at a mock agent, with no metric loops configured.
/// Tests opt into the loops they exercise.
pub fn bare_profile(id: &str, base_url: &str) -> ServerProfile {
    ServerProfile {
        id: id.to_string(),
        name: format!("Test {id}"),
        base_url: base_url.trim_end_matches('/').to_string(),
        token: "test-token".to_string(),
        cpu_ram: None,
        disk: None,
        processes: None,
        updates: None,
        backups: None,
        miner_signatures: vec!["xmrig".to_string(), "minerd".to_string()],
    }
}

pub fn cpu_ram_config() -> CpuRamConfig {
    CpuRamConfig {
        cpu_high: 50.0,
        cpu_low: 30.0,
        ram_high: 85.0,
        ram_low: 80.0,
        intervals: IntervalTable {
            normal: 180,
            warning: 60,
            critical: 10,
        },
    }
}

pub fn disk_config(threshold: f64) -> DiskConfig {
    DiskConfig {
        threshold,
        interval: 3600,
        total_gb: 40.0,
    }
}

pub fn processes_config() -> ProcessesConfig {
    ProcessesConfig { interval: 3600 }
}

pub fn updates_config() -> UpdatesConfig {
    UpdatesConfig { interval: 3600 }
}

/// Mount a `/cpu_ram` response serving at most `times` requests. Mocks
/// mounted earlier win, so stacking calls builds a response sequence.
pub async fn mount_cpu_ram(server: &MockServer, cpu: f64, ram: f64, times: u64) {
    Mock::given(method("GET"))
        .and(path("/cpu_ram"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "cpu": cpu,
            "ram": ram,
            "load": { "1min": 0.42, "5min": 0.33, "15min": 0.25 }
        })))
        .up_to_n_times(times)
        .mount(server)
        .await;
}

pub async fn mount_disk(server: &MockServer, disk_percent: f64, times: u64) {
    Mock::given(method("GET"))
        .and(path("/disk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "disk_percent": disk_percent
        })))
        .up_to_n_times(times)
        .mount(server)
        .await;
}

pub async fn mount_updates(server: &MockServer, packages: &[&str], times: u64) {
    Mock::given(method("GET"))
        .and(path("/updates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "updates": packages
        })))
        .up_to_n_times(times)
        .mount(server)
        .await;
}

/// Mount both process sources in one go.
pub async fn mount_processes(
    server: &MockServer,
    services: serde_json::Value,
    pm2: serde_json::Value,
    times: u64,
) {
    Mock::given(method("GET"))
        .and(path("/processes_systemctl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "services": services
        })))
        .up_to_n_times(times)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/processes_pm2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "processes": pm2
        })))
        .up_to_n_times(times)
        .mount(server)
        .await;
}

pub async fn mount_backup(server: &MockServer, status: &str) {
    let ok = status == "success";
    let upload = if ok { "ok" } else { "error" };

    Mock::given(method("GET"))
        .and(path("/backup_json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": status,
            "started_at": "2024-05-10 03:00:00",
            "finished_at": "2024-05-10 03:05:00",
            "parts": {
                "database": { "ok": ok, "size_bytes": 1048576 }
            },
            "upload": upload
        })))
        .mount(server)
        .await;
}
