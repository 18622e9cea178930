// Bot loop controller: one worker task runs capture -> reduce -> search -> tap, one attempt at a time
use super::channels::{create_command_channel, create_session_channel};
use super::config::{BotConfig, validate_confidence, validate_interval};
use super::error::{AttemptError, BotError, BotResult};
use super::ports::{ActionPort, BotPorts, CapturePort, TemplateLoader};
use super::types::{
    AttemptOutcome, AttemptReport, AttemptRequest, BotState, RunConfig, Session, WorkerCommand,
};
use crate::template_matching::{MatchResult, TemplateMatcher, reduce};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use tokio::runtime::Handle;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, timeout};

/// Worker side. Owns the ports and processes queued attempts serially.
pub struct BotController<C, L, A> {
    capture: C,
    loader: Arc<L>,
    action: A,
    config: BotConfig,
    session: watch::Receiver<Session>,
}

impl<C, L, A> BotController<C, L, A>
where
    C: CapturePort,
    L: TemplateLoader,
    A: ActionPort,
{
    /// Spawn the worker on the current Tokio runtime and return the control handle.
    ///
    /// Panics when called outside a runtime, like `tokio::spawn`.
    pub fn spawn(ports: BotPorts<C, L, A>, config: BotConfig) -> BotHandle {
        let (command_tx, command_rx) = create_command_channel(&config);
        let (session_tx, session_rx) = create_session_channel();
        let capacity = config.command_buffer.max(1);

        let controller = BotController {
            capture: ports.capture,
            loader: Arc::new(ports.loader),
            action: ports.action,
            config,
            session: session_rx,
        };
        let runtime = Handle::current();
        runtime.spawn(controller.run(command_rx));

        BotHandle {
            command_tx,
            session: Arc::new(session_tx),
            runtime,
            capacity,
        }
    }

    /// Runs until shutdown or until every [`BotHandle`] is gone
    async fn run(self, mut command_rx: mpsc::Receiver<WorkerCommand>) {
        log::debug!("🎮 Bot worker started");
        while let Some(command) = command_rx.recv().await {
            // Anything still queued after shutdown is dropped with its reply channel
            if self.session.borrow().closed {
                break;
            }
            match command {
                WorkerCommand::Attempt { request, reply } => {
                    let report = self.process_attempt(request).await;
                    log::debug!("🤖 Attempt finished: {}", report.summary());
                    if reply.send(report).is_err() {
                        log::debug!("Attempt caller went away before the result arrived");
                    }
                }
                WorkerCommand::Shutdown => break,
            }
        }
        log::debug!("🎮 Bot worker ended");
    }

    /// A scheduled attempt is stale once its session is no longer the live one.
    /// Dropping every handle ends the session too.
    fn is_stale(&self, request: &AttemptRequest) -> bool {
        match request.generation {
            Some(generation) => {
                self.session.has_changed().is_err() || !self.session.borrow().accepts(generation)
            }
            None => false,
        }
    }

    async fn process_attempt(&self, request: AttemptRequest) -> AttemptReport {
        let started = Instant::now();
        let report = |result: MatchResult, outcome: AttemptOutcome| AttemptReport {
            result,
            outcome,
            elapsed: started.elapsed(),
            scheduled: request.generation.is_some(),
        };

        if self.is_stale(&request) {
            return report(MatchResult::not_found(), AttemptOutcome::Discarded);
        }

        let result = match self.locate(&request).await {
            Ok(result) => result,
            Err(e) => {
                log::warn!("⚠️ Attempt for '{}' failed: {}", request.template_ref, e);
                return report(MatchResult::not_found(), AttemptOutcome::NoMatch(Some(e)));
            }
        };

        let Some((x, y)) = result.tap_point() else {
            log::debug!("👀 {}", result.describe());
            return report(result, AttemptOutcome::NoMatch(None));
        };

        // Stop may have landed while we were capturing or searching
        if self.is_stale(&request) {
            log::info!("⏹️ Session stopped, discarding match at ({x}, {y})");
            return report(result, AttemptOutcome::Discarded);
        }

        match self.action.tap(x, y).await {
            Ok(()) => {
                log::info!("🎯 Tapped ({x}, {y}) for '{}'", request.template_ref);
                if let Err(e) = self.action.feedback().await {
                    log::warn!("Feedback signal failed: {e}");
                }
                report(result, AttemptOutcome::Tapped)
            }
            Err(e) => {
                log::warn!("❌ Tap at ({x}, {y}) failed: {e}");
                report(result, AttemptOutcome::TapFailed(e))
            }
        }
    }

    /// Capture the screen and search it for the template
    async fn locate(&self, request: &AttemptRequest) -> Result<MatchResult, AttemptError> {
        let bound = self.config.capture_timeout;
        let screen = match timeout(bound, self.capture.capture(bound)).await {
            Ok(Ok(image)) => image,
            Ok(Err(e)) => {
                return Err(AttemptError::CaptureUnavailable {
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                return Err(AttemptError::CaptureUnavailable {
                    reason: format!("capture timed out after {bound:?}"),
                });
            }
        };
        log::debug!("📸 Captured {}x{}", screen.width(), screen.height());

        let loader = Arc::clone(&self.loader);
        let template_ref = request.template_ref.clone();
        let confidence = request.confidence;

        // Decoding and correlation are CPU-bound; awaiting here keeps attempts serial
        tokio::task::spawn_blocking(move || -> Result<MatchResult, AttemptError> {
            let template = loader.load(&template_ref).map_err(|e| {
                AttemptError::TemplateUnresolved {
                    reference: template_ref.clone(),
                    reason: e.to_string(),
                }
            })?;

            let screen_field = reduce(&screen);
            drop(screen);
            let template_field = reduce(&template);
            drop(template);

            let best = TemplateMatcher::best_candidate(&screen_field, &template_field)?;
            Ok(MatchResult::from_candidate(
                best,
                template_field.width(),
                template_field.height(),
                confidence,
            ))
        })
        .await
        .map_err(|e| AttemptError::SearchAborted {
            reason: e.to_string(),
        })?
    }
}

/// Caller side. Cheap to clone; no method waits on the worker.
#[derive(Clone)]
pub struct BotHandle {
    command_tx: mpsc::Sender<WorkerCommand>,
    session: Arc<watch::Sender<Session>>,
    runtime: Handle,
    capacity: usize,
}

impl BotHandle {
    /// Enter the running state. Does not capture; a scheduler drives the attempts.
    ///
    /// Starting while already running replaces the parameters and begins a new
    /// session, so attempts issued for the old one are discarded.
    pub fn start(
        &self,
        template_ref: impl Into<String>,
        interval_secs: u64,
        confidence: f64,
    ) -> BotResult<u64> {
        let template_ref = template_ref.into();
        if template_ref.trim().is_empty() {
            return Err(BotError::EmptyTemplateRef);
        }
        let interval_secs = validate_interval(interval_secs)?;
        let confidence = validate_confidence(confidence)?;
        if self.session.borrow().closed {
            return Err(BotError::WorkerClosed);
        }

        let run = RunConfig {
            template_ref,
            interval_secs,
            confidence,
        };
        log::info!(
            "🚀 Bot started: '{}' every {}s at confidence {:.2}",
            run.template_ref,
            run.interval_secs,
            run.confidence
        );

        let mut generation = 0;
        self.session.send_modify(|session| {
            session.generation += 1;
            session.state = BotState::Running(run);
            generation = session.generation;
        });
        Ok(generation)
    }

    /// Return to idle. An attempt in flight finishes but its action is suppressed.
    ///
    /// Returns whether the bot was running.
    pub fn stop(&self) -> bool {
        let was_running = self.session.send_if_modified(|session| {
            if session.state.is_running() {
                session.state = BotState::Idle;
                true
            } else {
                false
            }
        });
        if was_running {
            log::info!("⏹️ Bot stopped");
        }
        was_running
    }

    pub fn is_running(&self) -> bool {
        self.session.borrow().state.is_running()
    }

    pub fn state(&self) -> BotState {
        self.session.borrow().state.clone()
    }

    /// Watch session changes (start, stop, shutdown)
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    /// A handle that does not keep the worker alive
    pub fn downgrade(&self) -> WeakBotHandle {
        WeakBotHandle {
            command_tx: self.command_tx.downgrade(),
            session: Arc::downgrade(&self.session),
            runtime: self.runtime.clone(),
            capacity: self.capacity,
        }
    }

    /// Queue a one-shot attempt, independent of the running state
    pub fn attempt(
        &self,
        template_ref: impl Into<String>,
        confidence: f64,
    ) -> BotResult<PendingAttempt> {
        let template_ref = template_ref.into();
        if template_ref.trim().is_empty() {
            return Err(BotError::EmptyTemplateRef);
        }
        let confidence = validate_confidence(confidence)?;
        self.enqueue(AttemptRequest {
            template_ref,
            confidence,
            generation: None,
        })
    }

    /// Like [`attempt`](Self::attempt) but hands the report to `callback` on a
    /// separate task once the worker is done
    pub fn attempt_with<F>(
        &self,
        template_ref: impl Into<String>,
        confidence: f64,
        callback: F,
    ) -> BotResult<()>
    where
        F: FnOnce(BotResult<AttemptReport>) + Send + 'static,
    {
        let pending = self.attempt(template_ref, confidence)?;
        self.runtime.spawn(async move { callback(pending.await) });
        Ok(())
    }

    /// Queue an attempt on behalf of running session `generation`
    pub fn scheduled_attempt(&self, generation: u64, run: &RunConfig) -> BotResult<PendingAttempt> {
        self.enqueue(AttemptRequest {
            template_ref: run.template_ref.clone(),
            confidence: run.confidence,
            generation: Some(generation),
        })
    }

    fn enqueue(&self, request: AttemptRequest) -> BotResult<PendingAttempt> {
        let (reply, rx) = oneshot::channel();
        match self
            .command_tx
            .try_send(WorkerCommand::Attempt { request, reply })
        {
            Ok(()) => Ok(PendingAttempt { rx }),
            Err(TrySendError::Full(_)) => Err(BotError::WorkerBusy {
                capacity: self.capacity,
            }),
            Err(TrySendError::Closed(_)) => Err(BotError::WorkerClosed),
        }
    }

    /// Stop and let the worker exit once its current attempt is done.
    /// Queued attempts resolve to [`BotError::WorkerClosed`].
    pub fn shutdown(&self) {
        self.session.send_modify(|session| {
            session.state = BotState::Idle;
            session.closed = true;
        });
        // If the queue is full the worker notices `closed` at its next command
        let _ = self.command_tx.try_send(WorkerCommand::Shutdown);
        log::info!("🛑 Bot shutting down");
    }
}

/// Non-owning [`BotHandle`]; the worker exits once only weak handles remain
#[derive(Clone)]
pub struct WeakBotHandle {
    command_tx: mpsc::WeakSender<WorkerCommand>,
    session: Weak<watch::Sender<Session>>,
    runtime: Handle,
    capacity: usize,
}

impl WeakBotHandle {
    pub fn upgrade(&self) -> Option<BotHandle> {
        Some(BotHandle {
            command_tx: self.command_tx.upgrade()?,
            session: self.session.upgrade()?,
            runtime: self.runtime.clone(),
            capacity: self.capacity,
        })
    }
}

/// Resolves to the report of a queued attempt
#[must_use = "the attempt runs regardless, but its report is lost if this is dropped"]
pub struct PendingAttempt {
    rx: oneshot::Receiver<AttemptReport>,
}

impl Future for PendingAttempt {
    type Output = BotResult<AttemptReport>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.map_err(|_| BotError::WorkerClosed))
    }
}
