//! Website liveness watcher.
//!
//! One actor sweeps the whole URL list sequentially each tick; a slow URL
//! delays the rest of that tick's checks. Liveness means exactly HTTP 200.
//! Certificate verification is deliberately disabled to match the relaxed
//! check this watcher replaces; see DESIGN.md before tightening it.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use crate::analyzers::sites::{SiteStates, SiteTransition};
use crate::config::SitesConfig;
use crate::notify::Notifier;
use crate::poller::PollerCommand;
use crate::render;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct SiteWatcher {
    client: reqwest::Client,
    urls: Vec<String>,
    interval: Duration,
    states: SiteStates,
    command_rx: mpsc::Receiver<PollerCommand>,
    notifier: Arc<dyn Notifier>,
}

async fn check_site(client: &reqwest::Client, url: &str) -> bool {
    match client.get(url).send().await {
        Ok(response) => response.status() == reqwest::StatusCode::OK,
        Err(e) => {
            warn!(site = %url, "request failed: {e}");
            false
        }
    }
}

impl SiteWatcher {
    pub fn new(
        config: &SitesConfig,
        command_rx: mpsc::Receiver<PollerCommand>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .danger_accept_invalid_certs(true)
                .build()
                .expect("Failed to build HTTP client"),
            urls: config.urls.clone(),
            interval: Duration::from_secs(config.effective_interval()),
            states: SiteStates::default(),
            command_rx,
            notifier,
        }
    }

    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!("starting site watcher for {} urls", self.urls.len());

        self.sweep().await;

        loop {
            tokio::select! {
                _ = sleep(self.interval) => {
                    self.sweep().await;
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        PollerCommand::CheckNow { respond_to } => {
                            debug!("received CheckNow command");
                            let snapshot = self.snapshot().await;
                            let _ = respond_to.send(Ok(snapshot));
                        }

                        PollerCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }

                else => {
                    warn!("command channel closed, shutting down");
                    break;
                }
            }
        }

        debug!("site watcher stopped");
    }

    /// One sequential pass over every URL, notifying on edges only.
    async fn sweep(&mut self) {
        let urls = self.urls.clone();

        for url in &urls {
            let is_up = check_site(&self.client, url).await;
            if is_up {
                info!(site = %url, "reachable");
            } else {
                warn!(site = %url, "unreachable");
            }

            let message = match self.states.observe(url, is_up) {
                SiteTransition::WentDown => Some(render::site_problem(url)),
                SiteTransition::Recovered => Some(render::site_recovered(url)),
                SiteTransition::Steady => None,
            };

            if let Some(message) = message {
                if let Err(e) = self.notifier.notify(&message).await {
                    error!(site = %url, "failed to deliver notification: {e}");
                }
            }
        }
    }

    /// Check every URL once and render a ✅/❌ line per site. Does not feed
    /// the edge detector - a snapshot is a read, not an observation.
    async fn snapshot(&self) -> String {
        let mut results = Vec::with_capacity(self.urls.len());
        for url in &self.urls {
            let is_up = check_site(&self.client, url).await;
            results.push((url.clone(), is_up));
        }

        render::sites_snapshot(&results)
    }
}

/// Handle for controlling the site watcher.
#[derive(Clone)]
pub struct SiteHandle {
    sender: mpsc::Sender<PollerCommand>,
}

impl SiteHandle {
    pub fn spawn(config: &SitesConfig, notifier: Arc<dyn Notifier>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = SiteWatcher::new(config, cmd_rx, notifier);
        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    /// Check every URL once and return the rendered snapshot.
    pub async fn check_now(&self) -> Result<String> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(PollerCommand::CheckNow { respond_to: tx })
            .await
            .context("failed to send CheckNow command")?;

        rx.await.context("failed to receive response")?
    }

    pub async fn shutdown(&self) {
        let _ = self.sender.send(PollerCommand::Shutdown).await;
    }
}
