pub mod analyzers;
pub mod checks;
pub mod config;
pub mod fetch;
pub mod notify;
pub mod orchestrator;
pub mod poller;
pub mod render;
pub mod sites;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuRamSample {
    pub cpu: f64,
    pub ram: f64,
    #[serde(default)]
    pub load: Option<LoadAverages>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadAverages {
    #[serde(rename = "1min")]
    pub one: f64,
    #[serde(rename = "5min")]
    pub five: f64,
    #[serde(rename = "15min")]
    pub fifteen: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskSample {
    pub disk_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemdUnits {
    pub services: Vec<SystemdUnit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemdUnit {
    pub name: String,
    #[serde(default)]
    pub active: Option<String>,
    #[serde(default)]
    pub sub: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pm2Listing {
    pub processes: Vec<Pm2Process>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pm2Process {
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatesSample {
    pub updates: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupReport {
    pub status: String,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub finished_at: Option<String>,
    #[serde(default)]
    pub parts: BTreeMap<String, BackupPart>,
    #[serde(default)]
    pub upload: Option<String>,
}

impl BackupReport {
    pub fn succeeded(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupPart {
    pub ok: bool,
    #[serde(default)]
    pub size_bytes: Option<u64>,
}

/// Which manager reported a process entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessSource {
    /// systemd service manager
    Sct,
    /// pm2 process manager
    Pm2,
}

impl fmt::Display for ProcessSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessSource::Sct => write!(f, "SCT"),
            ProcessSource::Pm2 => write!(f, "PM2"),
        }
    }
}

/// A process entry normalized across both sources: the reported name plus
/// whether its status string resolved to "failed".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcessEntry {
    pub name: String,
    pub source: ProcessSource,
    pub failed: bool,
}

impl ProcessEntry {
    pub fn from_systemd(unit: &SystemdUnit) -> Self {
        let active = unit.active.as_deref().unwrap_or_default().to_lowercase();
        let sub = unit.sub.as_deref().unwrap_or_default().to_lowercase();
        ProcessEntry {
            name: unit.name.trim().to_string(),
            source: ProcessSource::Sct,
            failed: active == "failed" || sub == "failed",
        }
    }

    pub fn from_pm2(process: &Pm2Process) -> Self {
        let status = process.status.as_deref().unwrap_or_default().to_lowercase();
        ProcessEntry {
            name: process.name.trim().to_string(),
            source: ProcessSource::Pm2,
            failed: status == "failed",
        }
    }
}
