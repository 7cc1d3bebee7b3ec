//! Retry policy for upstream calls.

use std::time::Duration;

use rand::Rng;

/// Statuses retried by default: rate limiting and transient server errors.
pub const DEFAULT_RETRY_ON: [u16; 5] = [429, 500, 502, 503, 504];

/// Timeout and retry settings for one upstream call.
///
/// `max_retries` counts additional attempts, so `max_retries = 1` means at
/// most two requests.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Deadline for each attempt, including reading the body
    pub timeout: Duration,
    /// Attempts allowed after the first one
    pub max_retries: u32,
    /// Base wait between attempts
    pub retry_delay: Duration,
    /// Upper bound of the random extra wait added to `retry_delay`
    pub max_jitter: Duration,
    /// Response statuses that trigger another attempt
    pub retry_on: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 1,
            retry_delay: Duration::from_millis(1000),
            max_jitter: Duration::from_millis(500),
            retry_on: DEFAULT_RETRY_ON.to_vec(),
        }
    }
}

impl RetryPolicy {
    /// One retry on the default statuses; for calls that are safe to repeat.
    pub fn idempotent(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    /// Single attempt, nothing retried. Used for swap execution, where a
    /// repeated request could move funds twice.
    pub fn no_retry(timeout: Duration) -> Self {
        Self {
            timeout,
            max_retries: 0,
            retry_on: Vec::new(),
            ..Self::default()
        }
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn max_jitter(mut self, jitter: Duration) -> Self {
        self.max_jitter = jitter;
        self
    }

    pub fn retry_on(mut self, statuses: impl Into<Vec<u16>>) -> Self {
        self.retry_on = statuses.into();
        self
    }

    /// Whether a response with `status` should be retried.
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_on.contains(&status)
    }

    /// `retry_delay` plus a uniform random jitter in `[0, max_jitter]`.
    pub fn backoff(&self) -> Duration {
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        self.retry_delay + Duration::from_millis(jitter)
    }
}
