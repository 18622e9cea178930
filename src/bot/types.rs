// Types and enums for the bot loop
use super::error::{AttemptError, PortError};
use crate::template_matching::MatchResult;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::oneshot;

/// Parameters of a running session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunConfig {
    pub template_ref: String,
    pub interval_secs: u64,
    pub confidence: f64,
}

impl RunConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub enum BotState {
    #[default]
    Idle,
    Running(RunConfig),
}

impl BotState {
    pub fn is_running(&self) -> bool {
        matches!(self, BotState::Running(_))
    }
}

/// The single piece of shared mutable state, published through a watch channel
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub state: BotState,
    /// Bumped on every start; scheduled attempts from an older generation are stale
    pub generation: u64,
    /// Set once the controller is shutting down for good
    pub closed: bool,
}

impl Session {
    /// True while `generation` is the live running session
    pub fn accepts(&self, generation: u64) -> bool {
        self.state.is_running() && self.generation == generation
    }
}

/// One unit of work for the worker
#[derive(Debug, Clone)]
pub struct AttemptRequest {
    pub template_ref: String,
    pub confidence: f64,
    /// `Some` for attempts issued by a scheduler on behalf of a running session
    pub generation: Option<u64>,
}

#[derive(Debug)]
pub enum WorkerCommand {
    Attempt {
        request: AttemptRequest,
        reply: oneshot::Sender<AttemptReport>,
    },
    Shutdown,
}

/// How an attempt ended
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AttemptOutcome {
    /// Match found and the tap was dispatched
    Tapped,
    /// Match found but the action port refused the tap
    TapFailed(PortError),
    /// Nothing to act on this cycle; carries the reason when scoring never happened
    NoMatch(Option<AttemptError>),
    /// The session stopped before the action phase, so nothing was dispatched
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptReport {
    pub result: MatchResult,
    pub outcome: AttemptOutcome,
    pub elapsed: Duration,
    pub scheduled: bool,
}

impl AttemptReport {
    pub fn tapped(&self) -> bool {
        self.outcome == AttemptOutcome::Tapped
    }

    /// One-line summary for logs and the CLI
    pub fn summary(&self) -> String {
        let what = match &self.outcome {
            AttemptOutcome::Tapped => format!("tapped ({},{})", self.result.x, self.result.y),
            AttemptOutcome::TapFailed(e) => format!("match found, tap failed: {e}"),
            AttemptOutcome::NoMatch(Some(e)) => format!("no match: {e}"),
            AttemptOutcome::NoMatch(None) => format!("no match: {}", self.result.describe()),
            AttemptOutcome::Discarded => "discarded (session stopped)".to_string(),
        };
        format!("{what} in {}ms", self.elapsed.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(generation: u64) -> Session {
        Session {
            state: BotState::Running(RunConfig {
                template_ref: "t.png".to_string(),
                interval_secs: 5,
                confidence: 0.8,
            }),
            generation,
            closed: false,
        }
    }

    #[test]
    fn test_session_default_is_idle() {
        let session = Session::default();
        assert_eq!(session.state, BotState::Idle);
        assert!(!session.accepts(0));
    }

    #[test]
    fn test_session_accepts_only_live_generation() {
        let session = running(3);
        assert!(session.accepts(3));
        assert!(!session.accepts(2));
    }

    #[test]
    fn test_report_summary() {
        let report = AttemptReport {
            result: MatchResult {
                found: true,
                x: 45,
                y: 65,
                score: Some(1.0),
            },
            outcome: AttemptOutcome::Tapped,
            elapsed: Duration::from_millis(12),
            scheduled: false,
        };
        assert!(report.tapped());
        assert_eq!(report.summary(), "tapped (45,65) in 12ms");

        let failed = AttemptReport {
            outcome: AttemptOutcome::TapFailed(PortError::Rejected("busy".to_string())),
            ..report
        };
        assert!(!failed.tapped());
        assert!(failed.summary().starts_with("match found, tap failed"));
    }
}
