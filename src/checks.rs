//! The per-metric strategies plugged into the generic poller.
//!
//! Each check owns its server's state record for that metric and wires a
//! fetcher endpoint to the matching analyzer and report block.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Local, NaiveTime};

use crate::analyzers::{
    backups,
    cpu_ram::CpuRamState,
    disk::DiskState,
    processes::ProcessesState,
    updates::UpdatesState,
};
use crate::config::{CpuRamConfig, DiskConfig, ProcessesConfig, ServerProfile, UpdatesConfig};
use crate::fetch::MetricFetcher;
use crate::poller::{MetricCheck, MetricKind};
use crate::render;
use crate::{BackupReport, CpuRamSample, DiskSample, ProcessEntry, UpdatesSample};

pub struct CpuRamCheck {
    fetcher: MetricFetcher,
    server_name: String,
    config: CpuRamConfig,
    state: CpuRamState,
}

impl CpuRamCheck {
    pub fn new(profile: &ServerProfile, config: CpuRamConfig) -> Self {
        Self {
            fetcher: MetricFetcher::new(profile),
            server_name: profile.name.clone(),
            config,
            state: CpuRamState::default(),
        }
    }
}

#[async_trait]
impl MetricCheck for CpuRamCheck {
    type Sample = CpuRamSample;

    fn kind(&self) -> MetricKind {
        MetricKind::CpuRam
    }

    fn next_delay(&self) -> Duration {
        self.state.poll_interval(&self.config.intervals)
    }

    async fn fetch(&self) -> Result<CpuRamSample> {
        self.fetcher.cpu_ram().await
    }

    fn analyze(&mut self, sample: &CpuRamSample) -> bool {
        self.state.observe(sample.cpu, sample.ram, &self.config)
    }

    fn format(&self, sample: &CpuRamSample) -> String {
        render::cpu_ram_block(&self.server_name, self.state.status(), sample)
    }
}

pub struct DiskCheck {
    fetcher: MetricFetcher,
    server_name: String,
    config: DiskConfig,
    state: DiskState,
}

impl DiskCheck {
    pub fn new(profile: &ServerProfile, config: DiskConfig) -> Self {
        Self {
            fetcher: MetricFetcher::new(profile),
            server_name: profile.name.clone(),
            config,
            state: DiskState::default(),
        }
    }
}

#[async_trait]
impl MetricCheck for DiskCheck {
    type Sample = DiskSample;

    fn kind(&self) -> MetricKind {
        MetricKind::Disk
    }

    fn next_delay(&self) -> Duration {
        Duration::from_secs(self.config.interval)
    }

    async fn fetch(&self) -> Result<DiskSample> {
        self.fetcher.disk().await
    }

    fn analyze(&mut self, sample: &DiskSample) -> bool {
        self.state
            .observe(sample.disk_percent, self.config.threshold)
            .should_notify()
    }

    fn format(&self, sample: &DiskSample) -> String {
        render::disk_block(
            &self.server_name,
            self.state.alerted(),
            sample.disk_percent,
            self.config.total_gb,
        )
    }
}

pub struct ProcessesCheck {
    fetcher: MetricFetcher,
    server_name: String,
    config: ProcessesConfig,
    miner_signatures: Vec<String>,
    state: ProcessesState,
}

impl ProcessesCheck {
    pub fn new(profile: &ServerProfile, config: ProcessesConfig) -> Self {
        Self {
            fetcher: MetricFetcher::new(profile),
            server_name: profile.name.clone(),
            config,
            miner_signatures: profile.miner_signatures.clone(),
            state: ProcessesState::default(),
        }
    }
}

#[async_trait]
impl MetricCheck for ProcessesCheck {
    type Sample = Vec<ProcessEntry>;

    fn kind(&self) -> MetricKind {
        MetricKind::Processes
    }

    fn next_delay(&self) -> Duration {
        Duration::from_secs(self.config.interval)
    }

    async fn fetch(&self) -> Result<Vec<ProcessEntry>> {
        self.fetcher.processes().await
    }

    fn analyze(&mut self, sample: &Vec<ProcessEntry>) -> bool {
        self.state.observe(sample, &self.miner_signatures)
    }

    fn absorb_manual(&mut self, sample: &Vec<ProcessEntry>) {
        self.state.observe(sample, &self.miner_signatures);
    }

    fn format(&self, _sample: &Vec<ProcessEntry>) -> String {
        render::processes_block(&self.server_name, self.state.failed(), self.state.miners())
    }
}

pub struct UpdatesCheck {
    fetcher: MetricFetcher,
    server_name: String,
    config: UpdatesConfig,
    state: UpdatesState,
}

impl UpdatesCheck {
    pub fn new(profile: &ServerProfile, config: UpdatesConfig) -> Self {
        Self {
            fetcher: MetricFetcher::new(profile),
            server_name: profile.name.clone(),
            config,
            state: UpdatesState::default(),
        }
    }
}

#[async_trait]
impl MetricCheck for UpdatesCheck {
    type Sample = UpdatesSample;

    fn kind(&self) -> MetricKind {
        MetricKind::Updates
    }

    fn next_delay(&self) -> Duration {
        Duration::from_secs(self.config.interval)
    }

    async fn fetch(&self) -> Result<UpdatesSample> {
        self.fetcher.updates().await
    }

    fn analyze(&mut self, sample: &UpdatesSample) -> bool {
        self.state.observe(&sample.updates)
    }

    fn absorb_manual(&mut self, sample: &UpdatesSample) {
        self.state.observe(&sample.updates);
    }

    fn format(&self, _sample: &UpdatesSample) -> String {
        render::updates_block(&self.server_name, self.state.packages())
    }
}

pub struct BackupsCheck {
    fetcher: MetricFetcher,
    server_name: String,
    check_at: NaiveTime,
}

impl BackupsCheck {
    pub fn new(profile: &ServerProfile, check_at: NaiveTime) -> Self {
        Self {
            fetcher: MetricFetcher::new(profile),
            server_name: profile.name.clone(),
            check_at,
        }
    }
}

#[async_trait]
impl MetricCheck for BackupsCheck {
    type Sample = BackupReport;

    fn kind(&self) -> MetricKind {
        MetricKind::Backups
    }

    fn next_delay(&self) -> Duration {
        backups::delay_until(Local::now(), self.check_at)
    }

    // the first check waits for its daily slot
    fn poll_at_start(&self) -> bool {
        false
    }

    async fn fetch(&self) -> Result<BackupReport> {
        self.fetcher.backup_report().await
    }

    fn analyze(&mut self, report: &BackupReport) -> bool {
        backups::is_failure(report)
    }

    fn format(&self, report: &BackupReport) -> String {
        render::backup_block(&self.server_name, report)
    }
}
