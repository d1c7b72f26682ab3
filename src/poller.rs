//! Generic per-metric polling actor.
//!
//! Every (server, metric) pair runs one `MetricPoller` task driving the
//! same fetch → analyze → notify → sleep cycle; the differences between
//! metric kinds live entirely in their `MetricCheck` strategy. The actor
//! exclusively owns its metric state (inside the check), so no cross-task
//! synchronization is needed.
//!
//! ## Message Flow
//!
//! ```text
//! sleep(state-derived delay) → fetch → analyze → notify? → repeat
//!     ↑
//!     └─── Commands (CheckNow, Shutdown)
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

use crate::notify::Notifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    CpuRam,
    Disk,
    Processes,
    Updates,
    Backups,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricKind::CpuRam => "cpu_ram",
            MetricKind::Disk => "disk",
            MetricKind::Processes => "processes",
            MetricKind::Updates => "updates",
            MetricKind::Backups => "backups",
        };
        write!(f, "{name}")
    }
}

/// Commands accepted by a metric poller (and by the site watcher, which
/// shares the protocol).
#[derive(Debug)]
pub enum PollerCommand {
    /// Fetch fresh data and return a formatted report block, bypassing the
    /// schedule. Manual checks always report, success or failure.
    CheckNow {
        respond_to: oneshot::Sender<Result<String>>,
    },

    /// Gracefully stop the loop.
    Shutdown,
}

/// Per-metric strategy plugged into the generic poller: how to fetch a
/// sample, how to update the metric's state machine, and how to render a
/// report block.
#[async_trait]
pub trait MetricCheck: Send + 'static {
    type Sample: Send + Sync;

    fn kind(&self) -> MetricKind;

    /// Delay before the next scheduled poll, derived from the metric's
    /// *current* state.
    fn next_delay(&self) -> Duration;

    /// Whether the loop polls once immediately at startup. The backups
    /// check waits for its daily slot instead.
    fn poll_at_start(&self) -> bool {
        true
    }

    async fn fetch(&self) -> Result<Self::Sample>;

    /// Feed the sample to the state machine. Returns whether the observed
    /// transition warrants a notification.
    fn analyze(&mut self, sample: &Self::Sample) -> bool;

    /// Hook for manual checks that should absorb the fresh sample into the
    /// loop state (processes and updates do; the rest are read-only).
    fn absorb_manual(&mut self, _sample: &Self::Sample) {}

    /// Render the report block for this server.
    fn format(&self, sample: &Self::Sample) -> String;
}

pub struct MetricPoller<C: MetricCheck> {
    check: C,
    server_name: String,
    command_rx: mpsc::Receiver<PollerCommand>,
    notifier: Arc<dyn Notifier>,
}

impl<C: MetricCheck> MetricPoller<C> {
    pub fn new(
        check: C,
        server_name: String,
        command_rx: mpsc::Receiver<PollerCommand>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            check,
            server_name,
            command_rx,
            notifier,
        }
    }

    /// Run the actor until a Shutdown command arrives or the command
    /// channel closes. Fetch, analyzer and delivery failures are logged and
    /// absorbed; none of them terminate the loop.
    #[instrument(skip(self), fields(server = %self.server_name, metric = %self.check.kind()))]
    pub async fn run(mut self) {
        debug!("starting metric poller");

        if self.check.poll_at_start() {
            self.poll_once().await;
        }

        loop {
            let delay = self.check.next_delay();

            tokio::select! {
                _ = sleep(delay) => {
                    self.poll_once().await;
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        PollerCommand::CheckNow { respond_to } => {
                            debug!("received CheckNow command");
                            let result = self.manual_check().await;
                            let _ = respond_to.send(result);
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

        debug!("metric poller stopped");
    }

    async fn poll_once(&mut self) {
        let sample = match self.check.fetch().await {
            Ok(sample) => sample,
            Err(e) => {
                // no data this tick: state untouched, retry after the
                // current state's delay
                warn!("fetch failed: {e:#}");
                return;
            }
        };

        if self.check.analyze(&sample) {
            let message = self.check.format(&sample);
            if let Err(e) = self.notifier.notify(&message).await {
                error!("failed to deliver notification: {e}");
            }
        }
    }

    async fn manual_check(&mut self) -> Result<String> {
        let sample = self.check.fetch().await?;
        self.check.absorb_manual(&sample);
        Ok(self.check.format(&sample))
    }
}

/// Handle for controlling a spawned metric poller.
#[derive(Clone)]
pub struct PollerHandle {
    sender: mpsc::Sender<PollerCommand>,
    pub server_id: String,
    pub kind: MetricKind,
}

impl PollerHandle {
    /// Spawn the poller as a tokio task and return its handle.
    pub fn spawn<C: MetricCheck>(
        server_id: String,
        server_name: String,
        check: C,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let kind = check.kind();

        let actor = MetricPoller::new(check, server_name, cmd_rx, notifier);
        tokio::spawn(actor.run());

        Self {
            sender: cmd_tx,
            server_id,
            kind,
        }
    }

    /// Trigger an immediate check and wait for its formatted report.
    pub async fn check_now(&self) -> Result<String> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(PollerCommand::CheckNow { respond_to: tx })
            .await
            .context("failed to send CheckNow command")?;

        rx.await.context("failed to receive response")?
    }

    /// Gracefully shut down the poller.
    pub async fn shutdown(&self) {
        let _ = self.sender.send(PollerCommand::Shutdown).await;
    }
}
