//! Loop supervision and the manual-check surface.
//!
//! `start_monitoring` spawns one polling actor per configured
//! (server, metric) pair plus the site watcher, handing each a clone of the
//! injected notifier. The returned handle is the seam a command/UI layer
//! would call for on-demand reports.

use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use tracing::{debug, error, instrument, warn};

use crate::checks::{BackupsCheck, CpuRamCheck, DiskCheck, ProcessesCheck, UpdatesCheck};
use crate::config::{ServerProfile, SitesConfig};
use crate::notify::Notifier;
use crate::poller::{MetricKind, PollerHandle};
use crate::sites::SiteHandle;

/// Target of a manual check: one server or every configured one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckTarget {
    All,
    Server(String),
}

pub struct Orchestrator {
    pollers: Vec<PollerHandle>,
    sites: Option<SiteHandle>,
    notifier: Arc<dyn Notifier>,
}

/// Spawn every monitoring loop and return the supervising handle. Loops
/// run until `shutdown`; a server whose backup time cannot be parsed gets
/// all its other loops, only the backups loop is disabled.
pub fn start_monitoring(
    profiles: &[ServerProfile],
    sites: Option<&SitesConfig>,
    notifier: Arc<dyn Notifier>,
) -> Orchestrator {
    let mut pollers = Vec::new();

    for profile in profiles {
        debug!(server = %profile.id, "starting monitors");

        if let Some(config) = &profile.cpu_ram {
            pollers.push(PollerHandle::spawn(
                profile.id.clone(),
                profile.name.clone(),
                CpuRamCheck::new(profile, config.clone()),
                notifier.clone(),
            ));
        }

        if let Some(config) = &profile.disk {
            pollers.push(PollerHandle::spawn(
                profile.id.clone(),
                profile.name.clone(),
                DiskCheck::new(profile, config.clone()),
                notifier.clone(),
            ));
        }

        if let Some(config) = &profile.processes {
            pollers.push(PollerHandle::spawn(
                profile.id.clone(),
                profile.name.clone(),
                ProcessesCheck::new(profile, config.clone()),
                notifier.clone(),
            ));
        }

        if let Some(config) = &profile.updates {
            pollers.push(PollerHandle::spawn(
                profile.id.clone(),
                profile.name.clone(),
                UpdatesCheck::new(profile, config.clone()),
                notifier.clone(),
            ));
        }

        if let Some(config) = &profile.backups {
            match config.schedule() {
                Ok(check_at) => pollers.push(PollerHandle::spawn(
                    profile.id.clone(),
                    profile.name.clone(),
                    BackupsCheck::new(profile, check_at),
                    notifier.clone(),
                )),
                Err(e) => {
                    error!(server = %profile.id, "backups loop disabled: {e}");
                }
            }
        }
    }

    let sites = sites.map(|config| SiteHandle::spawn(config, notifier.clone()));

    Orchestrator {
        pollers,
        sites,
        notifier,
    }
}

impl Orchestrator {
    pub fn poller_count(&self) -> usize {
        self.pollers.len()
    }

    /// Run a one-shot check for `kind` against the target server(s) and
    /// send the combined report to the operator channel. Servers that fail
    /// to produce a report are skipped; if none respond, nothing is sent.
    #[instrument(skip(self))]
    pub async fn trigger_manual_check(&self, target: &CheckTarget, kind: MetricKind) -> Result<()> {
        let selected: Vec<&PollerHandle> = self
            .pollers
            .iter()
            .filter(|handle| {
                handle.kind == kind
                    && match target {
                        CheckTarget::All => true,
                        CheckTarget::Server(id) => &handle.server_id == id,
                    }
            })
            .collect();

        if selected.is_empty() {
            anyhow::bail!("no {kind} monitor matches {target:?}");
        }

        let results = join_all(selected.iter().map(|handle| handle.check_now())).await;

        let mut blocks = Vec::new();
        for (handle, result) in selected.iter().zip(results) {
            match result {
                Ok(block) => blocks.push(block),
                Err(e) => {
                    warn!(server = %handle.server_id, "manual {kind} check failed: {e:#}");
                }
            }
        }

        if blocks.is_empty() {
            warn!("manual {kind} check: no server returned data");
            return Ok(());
        }

        if let Err(e) = self.notifier.notify(&blocks.join("\n\n")).await {
            error!("failed to deliver manual {kind} report: {e}");
        }

        Ok(())
    }

    /// Check every configured site once and send the snapshot report.
    #[instrument(skip(self))]
    pub async fn trigger_sites_check(&self) -> Result<()> {
        let Some(sites) = &self.sites else {
            anyhow::bail!("no site watcher configured");
        };

        let snapshot = sites.check_now().await?;
        if let Err(e) = self.notifier.notify(&snapshot).await {
            error!("failed to deliver sites report: {e}");
        }

        Ok(())
    }

    /// Cooperatively stop every loop.
    pub async fn shutdown(&self) {
        for handle in &self.pollers {
            handle.shutdown().await;
        }

        if let Some(sites) = &self.sites {
            sites.shutdown().await;
        }
    }
}
