// Host-side scheduler: fires one attempt per interval while the bot is running
use super::controller::{BotHandle, WeakBotHandle};
use super::error::BotError;
use super::types::{AttemptReport, BotState, Session};
use tokio::sync::{mpsc, watch};
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Drives periodic attempts for a [`BotHandle`]
///
/// The first attempt fires one full interval after `start`, and each following one an
/// interval after the previous attempt completed, so attempts never come closer than
/// the configured interval. Any start, stop or restart cancels the pending wait.
///
/// The scheduler only holds a weak handle, so it ends with shutdown or once every
/// [`BotHandle`] has been dropped.
pub struct IntervalScheduler {
    handle: WeakBotHandle,
    session_rx: watch::Receiver<Session>,
    reports: Option<mpsc::Sender<AttemptReport>>,
}

impl IntervalScheduler {
    pub fn new(handle: &BotHandle) -> Self {
        Self {
            handle: handle.downgrade(),
            session_rx: handle.subscribe(),
            reports: None,
        }
    }

    /// Forward every scheduled report to `tx`; reports are dropped when it is full
    pub fn with_reports(mut self, tx: mpsc::Sender<AttemptReport>) -> Self {
        self.reports = Some(tx);
        self
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) {
        log::debug!("⏱️ Interval scheduler started");

        loop {
            let session = self.session_rx.borrow_and_update().clone();
            if session.closed {
                break;
            }

            let run = match session.state {
                BotState::Idle => {
                    if self.session_rx.changed().await.is_err() {
                        break;
                    }
                    continue;
                }
                BotState::Running(run) => run,
            };

            log::debug!("⏱️ Next attempt in {}s", run.interval_secs);
            tokio::select! {
                changed = self.session_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                _ = sleep(run.interval()) => {}
            }

            // Upgrade only to enqueue; holding the handle while waiting would keep the bot alive
            let Some(handle) = self.handle.upgrade() else {
                break;
            };
            let queued = handle.scheduled_attempt(session.generation, &run);
            drop(handle);
            let pending = match queued {
                Ok(pending) => pending,
                Err(BotError::WorkerBusy { capacity }) => {
                    log::warn!("Worker busy ({capacity} queued), skipping this cycle");
                    continue;
                }
                Err(e) => {
                    log::warn!("Scheduler stopping: {e}");
                    break;
                }
            };

            match pending.await {
                Ok(report) => {
                    log::info!("🤖 Scheduled attempt: {}", report.summary());
                    self.forward(report);
                }
                Err(e) => {
                    log::warn!("Scheduler stopping: {e}");
                    break;
                }
            }
        }

        log::debug!("⏱️ Interval scheduler ended");
    }

    fn forward(&self, report: AttemptReport) {
        let Some(tx) = &self.reports else {
            return;
        };
        match tx.try_send(report) {
            Ok(()) | Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(_)) => log::warn!("Report subscriber lagging, dropping report"),
        }
    }
}
