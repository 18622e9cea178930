//! Configuration for the bot controller

use super::error::{BotError, BotResult};
use std::time::Duration;

/// Hard upper bound on a single screen capture
pub const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
pub struct BotConfig {
    /// A capture that has not produced an image by then counts as unavailable
    pub capture_timeout: Duration,
    /// Seconds between scheduled attempts when the caller gives none
    pub default_interval_secs: u64,
    /// Minimum correlation when the caller gives none
    pub default_confidence: f64,
    /// Attempts that may queue behind the one in flight
    pub command_buffer: usize,
    /// Reports buffered for a slow subscriber before new ones are dropped
    pub report_buffer: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            capture_timeout: DEFAULT_CAPTURE_TIMEOUT,
            default_interval_secs: 120,
            default_confidence: 0.8,
            command_buffer: 32,
            report_buffer: 32,
        }
    }
}

impl BotConfig {
    pub fn with_capture_timeout(mut self, timeout: Duration) -> Self {
        self.capture_timeout = timeout;
        self
    }
}

pub fn validate_confidence(confidence: f64) -> BotResult<f64> {
    if (0.0..=1.0).contains(&confidence) {
        Ok(confidence)
    } else {
        Err(BotError::InvalidConfidence(confidence))
    }
}

pub fn validate_interval(interval_secs: u64) -> BotResult<u64> {
    if interval_secs >= 1 {
        Ok(interval_secs)
    } else {
        Err(BotError::InvalidInterval(interval_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BotConfig::default();
        assert_eq!(config.capture_timeout, Duration::from_secs(3));
        assert_eq!(config.default_interval_secs, 120);
        assert_eq!(config.default_confidence, 0.8);
        assert_eq!(config.command_buffer, 32);
    }

    #[test]
    fn test_confidence_bounds() {
        assert_eq!(validate_confidence(0.0), Ok(0.0));
        assert_eq!(validate_confidence(1.0), Ok(1.0));
        assert!(validate_confidence(-0.01).is_err());
        assert!(validate_confidence(1.01).is_err());
        assert!(validate_confidence(f64::NAN).is_err());
    }

    #[test]
    fn test_interval_bounds() {
        assert_eq!(validate_interval(1), Ok(1));
        assert_eq!(validate_interval(0), Err(BotError::InvalidInterval(0)));
    }
}
