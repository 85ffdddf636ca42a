//! Retry policy for document fetches.

use std::time::Duration;

use crate::error::DownloadError;
use crate::models::config::DownloadConfig;

/// Exponential backoff schedule with a bounded attempt budget.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per document, including the first.
    pub attempts: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub base_delay: Duration,
    /// Cap applied to every delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &DownloadConfig) -> Self {
        Self {
            attempts: config.attempts.max(1),
            base_delay: Duration::from_millis(config.backoff_base_ms),
            max_delay: Duration::from_millis(config.backoff_max_ms),
        }
    }

    /// A policy that fetches exactly once; used by backfill runs that must
    /// not hammer an upstream already known to be degraded.
    pub fn once() -> Self {
        Self {
            attempts: 1,
            ..Self::default()
        }
    }

    /// Backoff before retry number `attempt` (zero-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&DownloadConfig::default())
    }
}

impl DownloadError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Transport failures and server-side statuses are retryable; client
    /// errors other than 429 are not, and local I/O failures never are.
    pub fn is_retryable(&self) -> bool {
        match self {
            DownloadError::Request(e) => !e.is_builder(),
            DownloadError::Http { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            DownloadError::Io(_) | DownloadError::GateClosed => false,
        }
    }
}
