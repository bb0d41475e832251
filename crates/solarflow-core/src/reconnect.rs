//! Reconnection policy for the telemetry stream.
//!
//! The policy itself is plain data; the loop that applies it lives in
//! [`crate::streaming`].

use std::time::Duration;

use crate::error::{Error, Result};

/// How the snapshot stream retries a lost Home Assistant connection.
///
/// Attempt `n` (0-based) waits `min(initial_delay * backoff_multiplier^n, max_delay)`.
/// The attempt counter starts over after every successful connection.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectOptions {
    /// Consecutive failures tolerated before giving up; `None` retries forever.
    pub max_attempts: Option<u32>,
    /// Wait before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for any single wait.
    pub max_delay: Duration,
    /// Growth factor between consecutive waits.
    pub backoff_multiplier: f64,
    /// `false` waits `initial_delay` every time.
    pub use_exponential_backoff: bool,
}

impl Default for ReconnectOptions {
    fn default() -> Self {
        Self {
            max_attempts: None,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            use_exponential_backoff: true,
        }
    }
}

impl ReconnectOptions {
    /// Never reconnect: the first failure ends the stream.
    pub fn disabled() -> Self {
        Self {
            max_attempts: Some(0),
            ..Default::default()
        }
    }

    /// Retry after the same delay every time.
    pub fn fixed_delay(delay: Duration) -> Self {
        Self {
            initial_delay: delay,
            use_exponential_backoff: false,
            ..Default::default()
        }
    }

    /// Set maximum number of reconnection attempts.
    #[must_use]
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Set initial delay before first reconnection attempt.
    #[must_use]
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set maximum delay between attempts.
    #[must_use]
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set backoff multiplier for exponential backoff.
    #[must_use]
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Wait before retry number `attempt` (0-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if !self.use_exponential_backoff {
            return self.initial_delay;
        }

        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay_ms = self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        if !delay_ms.is_finite() || delay_ms >= self.max_delay.as_millis() as f64 {
            return self.max_delay;
        }

        Duration::from_millis(delay_ms as u64).min(self.max_delay)
    }

    /// Whether another attempt is allowed after `failures` consecutive failures.
    pub fn allows_attempt(&self, failures: u32) -> bool {
        self.max_attempts.is_none_or(|max| failures <= max)
    }

    /// Reject a multiplier below 1, a zero initial delay or a cap below it.
    pub fn validate(&self) -> Result<()> {
        if self.backoff_multiplier.is_nan() || self.backoff_multiplier < 1.0 {
            return Err(Error::InvalidConfig(
                "backoff_multiplier must be >= 1.0".to_string(),
            ));
        }
        if self.initial_delay.is_zero() {
            return Err(Error::InvalidConfig(
                "initial_delay must be > 0".to_string(),
            ));
        }
        if self.max_delay < self.initial_delay {
            return Err(Error::InvalidConfig(
                "max_delay must be >= initial_delay".to_string(),
            ));
        }
        Ok(())
    }
}

/// State of the telemetry connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Subscribed and receiving data.
    Connected,
    /// Not connected yet.
    #[default]
    Disconnected,
    /// Waiting before the next connection attempt.
    Reconnecting,
    /// Gave up after the maximum number of attempts.
    Failed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Connected => write!(f, "Connected"),
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Reconnecting => write!(f, "Reconnecting"),
            ConnectionState::Failed => write!(f, "Failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconnect_options_default() {
        let opts = ReconnectOptions::default();
        assert!(opts.max_attempts.is_none());
        assert!(opts.use_exponential_backoff);
        assert_eq!(opts.initial_delay, Duration::from_secs(1));
        assert_eq!(opts.max_delay, Duration::from_secs(60));
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_delay_calculation() {
        let opts = ReconnectOptions::default();

        assert_eq!(opts.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(opts.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(opts.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(opts.delay_for_attempt(3), Duration::from_secs(8));
        assert_eq!(opts.delay_for_attempt(5), Duration::from_secs(32));
    }

    #[test]
    fn test_delay_capped_at_max() {
        let opts = ReconnectOptions::default().max_delay(Duration::from_secs(10));

        // 2^10 = 1024 seconds, but capped at 10
        assert_eq!(opts.delay_for_attempt(10), Duration::from_secs(10));
        assert_eq!(opts.delay_for_attempt(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn test_fixed_delay() {
        let opts = ReconnectOptions::fixed_delay(Duration::from_secs(5));
        assert_eq!(opts.delay_for_attempt(0), Duration::from_secs(5));
        assert_eq!(opts.delay_for_attempt(5), Duration::from_secs(5));
    }

    #[test]
    fn test_attempt_budget() {
        let unlimited = ReconnectOptions::default();
        assert!(unlimited.allows_attempt(1_000_000));

        let limited = ReconnectOptions::default().max_attempts(3);
        assert!(limited.allows_attempt(3));
        assert!(!limited.allows_attempt(4));

        let disabled = ReconnectOptions::disabled();
        assert!(disabled.allows_attempt(0));
        assert!(!disabled.allows_attempt(1));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(
            ReconnectOptions::default()
                .backoff_multiplier(0.5)
                .validate()
                .is_err()
        );
        assert!(
            ReconnectOptions::default()
                .backoff_multiplier(f64::NAN)
                .validate()
                .is_err()
        );
        assert!(
            ReconnectOptions::default()
                .initial_delay(Duration::ZERO)
                .validate()
                .is_err()
        );
        assert!(
            ReconnectOptions::default()
                .initial_delay(Duration::from_secs(10))
                .max_delay(Duration::from_secs(5))
                .validate()
                .is_err()
        );
    }
}
