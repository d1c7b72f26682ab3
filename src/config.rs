use chrono::NaiveTime;
use tracing::trace;

/// Operator channel credentials.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: i64,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub telegram: TelegramConfig,

    pub servers: Option<Vec<ServerConfig>>,

    /// Website liveness watcher (optional - no watcher if absent)
    pub sites: Option<SitesConfig>,

    /// Global miner-signature suspect list, applied to every server
    #[serde(default)]
    pub miners: Vec<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ServerConfig {
    pub id: String,
    pub name: Option<String>,
    pub base_url: String,
    pub token: String,
    pub cpu_ram: Option<CpuRamConfig>,
    pub disk: Option<DiskConfig>,
    pub processes: Option<ProcessesConfig>,
    pub updates: Option<UpdatesConfig>,
    pub backups: Option<BackupsConfig>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct CpuRamConfig {
    pub cpu_high: f64,
    pub cpu_low: f64,
    pub ram_high: f64,
    pub ram_low: f64,
    #[serde(default)]
    pub intervals: IntervalTable,
}

/// Poll cadence per severity tier, in seconds. Polling accelerates under
/// stress: the critical tier is the shortest.
#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub struct IntervalTable {
    #[serde(default = "default_normal_interval")]
    pub normal: u64,
    #[serde(default = "default_warning_interval")]
    pub warning: u64,
    #[serde(default = "default_critical_interval")]
    pub critical: u64,
}

impl Default for IntervalTable {
    fn default() -> Self {
        IntervalTable {
            normal: default_normal_interval(),
            warning: default_warning_interval(),
            critical: default_critical_interval(),
        }
    }
}

fn default_normal_interval() -> u64 {
    180
}

fn default_warning_interval() -> u64 {
    60
}

fn default_critical_interval() -> u64 {
    10
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct DiskConfig {
    pub threshold: f64,
    #[serde(default = "default_disk_interval")]
    pub interval: u64,
    /// Disk capacity, used for rendering "used/total" in reports
    pub total_gb: f64,
}

fn default_disk_interval() -> u64 {
    3600
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ProcessesConfig {
    #[serde(default = "default_processes_interval")]
    pub interval: u64,
}

fn default_processes_interval() -> u64 {
    300
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct UpdatesConfig {
    #[serde(default = "default_updates_interval")]
    pub interval: u64,
}

fn default_updates_interval() -> u64 {
    3600
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct BackupsConfig {
    /// Daily wall-clock check time, "HH:MM"
    pub time: String,
}

impl BackupsConfig {
    /// Parse the configured check time. An unparsable value disables the
    /// backups loop for that server; it never brings the process down.
    pub fn schedule(&self) -> anyhow::Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.time, "%H:%M")
            .map_err(|e| anyhow::anyhow!("invalid backup time '{}': {e}", self.time))
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct SitesConfig {
    #[serde(default = "default_sites_interval")]
    pub interval: u64,
    pub urls: Vec<String>,
}

fn default_sites_interval() -> u64 {
    3600
}

const MIN_SITES_INTERVAL: u64 = 30;

impl SitesConfig {
    /// Sweep interval with the 30s floor applied.
    pub fn effective_interval(&self) -> u64 {
        self.interval.max(MIN_SITES_INTERVAL)
    }
}

/// A server's fully resolved monitoring profile. Immutable after load;
/// every polling loop gets a clone at spawn time.
#[derive(Debug, Clone)]
pub struct ServerProfile {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub token: String,
    pub cpu_ram: Option<CpuRamConfig>,
    pub disk: Option<DiskConfig>,
    pub processes: Option<ProcessesConfig>,
    pub updates: Option<UpdatesConfig>,
    pub backups: Option<BackupsConfig>,
    pub miner_signatures: Vec<String>,
}

impl Config {
    pub fn resolve(&self) -> Vec<ServerProfile> {
        let Some(servers) = &self.servers else {
            return Vec::new();
        };

        servers
            .iter()
            .map(|server| ServerProfile {
                id: server.id.clone(),
                name: server.name.clone().unwrap_or_else(|| server.id.clone()),
                base_url: server.base_url.trim_end_matches('/').to_string(),
                token: server.token.clone(),
                cpu_ram: server.cpu_ram.clone(),
                disk: server.disk.clone(),
                processes: server.processes.clone(),
                updates: server.updates.clone(),
                backups: server.backups.clone(),
                miner_signatures: self.miners.clone(),
            })
            .collect()
    }
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|_| anyhow::anyhow!("Invalid configuration file provided!"))
        .inspect(|config: &Config| trace!("loaded config for {} servers", config.servers.as_ref().map_or(0, Vec::len)))
}
