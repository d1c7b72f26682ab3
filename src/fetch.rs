//! Stateless HTTP access to a server's monitoring agent.
//!
//! One fetcher per server, one method per agent endpoint. The fetcher holds
//! a reused HTTP client; every request authenticates with the server's
//! shared-secret query token. Errors are returned to the polling loop which
//! treats them as "no data this tick".

use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::{trace, warn};

use crate::{
    BackupReport, CpuRamSample, DiskSample, Pm2Listing, ProcessEntry, SystemdUnits, UpdatesSample,
    config::ServerProfile,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
pub struct MetricFetcher {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl MetricFetcher {
    pub fn new(profile: &ServerProfile) -> Self {
        Self {
            client: reqwest::Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .read_timeout(READ_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            base_url: profile.base_url.clone(),
            token: profile.token.clone(),
        }
    }

    pub async fn cpu_ram(&self) -> Result<CpuRamSample> {
        self.get_json("cpu_ram").await
    }

    pub async fn disk(&self) -> Result<DiskSample> {
        self.get_json("disk").await
    }

    /// Query both process sources and merge their entries. A single failing
    /// source is tolerated (its entries are simply absent this tick); only
    /// when both are unavailable does the fetch count as failed.
    pub async fn processes(&self) -> Result<Vec<ProcessEntry>> {
        let mut entries = Vec::new();
        let mut failed_sources = 0;

        match self.get_json::<SystemdUnits>("processes_systemctl").await {
            Ok(units) => entries.extend(units.services.iter().map(ProcessEntry::from_systemd)),
            Err(e) => {
                warn!("systemctl listing failed: {e:#}");
                failed_sources += 1;
            }
        }

        match self.get_json::<Pm2Listing>("processes_pm2").await {
            Ok(listing) => entries.extend(listing.processes.iter().map(ProcessEntry::from_pm2)),
            Err(e) => {
                warn!("pm2 listing failed: {e:#}");
                failed_sources += 1;
            }
        }

        if failed_sources == 2 {
            anyhow::bail!("both process sources unavailable");
        }

        Ok(entries)
    }

    pub async fn updates(&self) -> Result<UpdatesSample> {
        self.get_json("updates").await
    }

    pub async fn backup_report(&self) -> Result<BackupReport> {
        self.get_json("backup_json").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}/{path}", self.base_url);

        trace!("requesting {url}");

        let response = self
            .client
            .get(&url)
            .query(&[("token", self.token.as_str())])
            .send()
            .await
            .context("failed to send HTTP request")?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP error: {}", response.status());
        }

        let body = response
            .text()
            .await
            .context("failed to read response body")?;

        serde_json::from_str(&body).context("failed to parse response JSON")
    }
}
