//! Retry policy with exponential backoff.
//!
//! Transient failures (timeouts, flaky CDP sessions, temporary network
//! hiccups) are retried. Permanent failures are surfaced immediately:
//! a domain that does not resolve will not start resolving two seconds
//! later, and hammering a challenge wall only gets the IP burned.

use crate::error::{Result, ScanError};
use sirene_browser::FetchError;
use std::future::Future;
use std::time::Duration;

/// Network error codes that never recover within one batch.
const PERMANENT_NET_ERRORS: [&str; 6] = [
    "ERR_NAME_NOT_RESOLVED",
    "ERR_CONNECTION_REFUSED",
    "ERR_CONNECTION_RESET",
    "ERR_CERT_",
    "ERR_SSL_",
    "ERR_ADDRESS_UNREACHABLE",
];

/// How many attempts to make and how long to wait between them.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, first try included
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles each retry
    pub base_delay: Duration,
    /// Ceiling on the computed delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Backoff delay after the given 0-based attempt.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Whether another attempt could plausibly succeed.
#[must_use]
pub fn is_retryable(err: &ScanError) -> bool {
    match err {
        ScanError::Blocked { .. } | ScanError::InvalidInput(_) => false,
        ScanError::Fetch(fetch_err) => match fetch_err {
            FetchError::Timeout(_) | FetchError::Chromium(_) => true,
            FetchError::NotFound(_) | FetchError::InvalidProxy(_) => false,
            FetchError::Navigation(msg) => {
                !PERMANENT_NET_ERRORS.iter().any(|code| msg.contains(code))
            }
        },
    }
}

/// Run `op` until it succeeds, the error is permanent, or the policy's
/// attempt budget runs out. The closure receives the 0-based attempt
/// number.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if !is_retryable(&e) || attempt + 1 >= attempts {
                    return Err(e);
                }
                let delay = policy.backoff(attempt);
                tracing::warn!(
                    "attempt {}/{} failed ({}), retrying in {:?}",
                    attempt + 1,
                    attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
