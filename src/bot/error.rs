use crate::template_matching::MatchError;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Why a single attempt ended without a score worth acting on.
///
/// Every variant is local and recoverable: the attempt resolves to "no match this
/// cycle" and a running session carries on.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum AttemptError {
    #[error("Screen capture unavailable: {reason}")]
    CaptureUnavailable { reason: String },

    #[error("Template '{reference}' could not be resolved: {reason}")]
    TemplateUnresolved { reference: String, reason: String },

    #[error(
        "Template {template_width}x{template_height} larger than screen {screen_width}x{screen_height}"
    )]
    DegenerateGeometry {
        template_width: u32,
        template_height: u32,
        screen_width: u32,
        screen_height: u32,
    },

    #[error("Template {width}x{height} has zero variance")]
    DegenerateTemplate { width: u32, height: u32 },

    #[error("Search task aborted: {reason}")]
    SearchAborted { reason: String },
}

impl From<MatchError> for AttemptError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::DegenerateGeometry {
                template_width,
                template_height,
                screen_width,
                screen_height,
            } => AttemptError::DegenerateGeometry {
                template_width,
                template_height,
                screen_width,
                screen_height,
            },
            MatchError::DegenerateTemplate { width, height } => {
                AttemptError::DegenerateTemplate { width, height }
            }
        }
    }
}

/// Failure reported by a host collaborator (capture, template loading, action)
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum PortError {
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rejected: {0}")]
    Rejected(String),
}

/// Misuse of the control surface
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BotError {
    #[error("Confidence must be within [0, 1], got {0}")]
    InvalidConfidence(f64),

    #[error("Interval must be at least one second, got {0}")]
    InvalidInterval(u64),

    #[error("Template reference is empty")]
    EmptyTemplateRef,

    #[error("Attempt queue is full ({capacity} pending)")]
    WorkerBusy { capacity: usize },

    #[error("Bot worker has shut down")]
    WorkerClosed,
}

pub type BotResult<T> = Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_error_maps_to_taxonomy() {
        let err: AttemptError = MatchError::DegenerateTemplate {
            width: 3,
            height: 4,
        }
        .into();
        assert_eq!(
            err,
            AttemptError::DegenerateTemplate {
                width: 3,
                height: 4
            }
        );

        let err: AttemptError = MatchError::DegenerateGeometry {
            template_width: 50,
            template_height: 10,
            screen_width: 40,
            screen_height: 40,
        }
        .into();
        assert!(matches!(
            err,
            AttemptError::DegenerateGeometry {
                template_width: 50,
                screen_width: 40,
                ..
            }
        ));
    }

    #[test]
    fn test_error_messages() {
        let err = AttemptError::TemplateUnresolved {
            reference: "btn.png".to_string(),
            reason: "missing".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Template 'btn.png' could not be resolved: missing"
        );
        assert_eq!(
            BotError::InvalidConfidence(1.5).to_string(),
            "Confidence must be within [0, 1], got 1.5"
        );
    }
}
