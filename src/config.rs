use std::time::Duration;

/// How the worker treats non-2xx responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryPolicy {
    /// Retry every failure identically, including 4xx. The default.
    #[default]
    Uniform,
    /// Treat 4xx other than 408 and 429 as permanent: no retry.
    TransientOnly,
}

/// Tunables for delivery and retry behavior.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Total send budget per attempt record, initial send included.
    pub max_attempts: u32,
    /// Retry delay is `base_delay * attempt_count`, so it strictly
    /// increases: 1s, 2s, ... with the default.
    pub base_delay: Duration,
    /// Per-request timeout for delivery POSTs.
    pub request_timeout: Duration,
    /// Number of concurrent drain loops sharing the queue.
    pub worker_count: usize,
    pub retry_policy: RetryPolicy,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            request_timeout: Duration::from_secs(10),
            worker_count: 1,
            retry_policy: RetryPolicy::Uniform,
        }
    }
}

impl DispatcherConfig {
    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count.max(1);
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }
}
