//! Retry policy
//!
//! Only idempotent reads are repeated, and only after failures where the
//! request never produced an answer. An API error is Consul's decision and
//! is returned as is.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::error::{ConsulError, Result};

/// Whether a request may be safely repeated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Read,
    Write,
}

/// Bounded exponential backoff
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Growth factor per retry; values below 1 are treated as 1
    pub multiplier: f64,
    /// Add up to 25% random extra delay
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn with_max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before retry number `retry` (0-based), before jitter
    pub fn base_backoff(&self, retry: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(retry.min(32) as i32);
        let millis = self.initial_backoff.as_millis() as f64 * factor;
        let capped = millis.min(self.max_backoff.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    fn backoff(&self, retry: u32) -> Duration {
        let base = self.base_backoff(retry);
        if !self.jitter || base.is_zero() {
            return base;
        }
        let extra = rand::rng().random_range(0..=base.as_millis() as u64 / 4);
        base + Duration::from_millis(extra)
    }

    /// Whether `err` on attempt `retry` (0-based) warrants another attempt
    pub fn should_retry(&self, kind: OperationKind, err: &ConsulError, retry: u32) -> bool {
        kind == OperationKind::Read && err.is_retryable() && retry < self.max_retries
    }
}

/// Run `op` under `policy`, sleeping between attempts
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    kind: OperationKind,
    what: &str,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut retry = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if policy.should_retry(kind, &e, retry) => {
                let delay = policy.backoff(retry);
                warn!(
                    "{} failed (attempt {}/{}): {}, retrying in {:?}",
                    what,
                    retry + 1,
                    policy.max_retries + 1,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                retry += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::default()
            .with_initial_backoff(Duration::from_millis(1))
            .with_max_backoff(Duration::from_millis(5))
            .with_jitter(false)
    }

    #[test]
    fn test_backoff_growth_is_capped() {
        let policy = RetryPolicy::default().with_jitter(false);
        assert_eq!(policy.base_backoff(0), Duration::from_millis(100));
        assert_eq!(policy.base_backoff(1), Duration::from_millis(200));
        assert_eq!(policy.base_backoff(2), Duration::from_millis(400));
        assert_eq!(policy.base_backoff(10), Duration::from_secs(5));
        assert_eq!(policy.base_backoff(u32::MAX), Duration::from_secs(5));
    }

    #[test]
    fn test_custom_multiplier() {
        let policy = RetryPolicy::default().with_multiplier(3.0).with_jitter(false);
        assert_eq!(policy.base_backoff(1), Duration::from_millis(300));
        assert_eq!(policy.base_backoff(2), Duration::from_millis(900));

        let flat = RetryPolicy::default().with_multiplier(0.5);
        assert_eq!(flat.base_backoff(3), Duration::from_millis(100));
    }

    #[test]
    fn test_jitter_stays_within_quarter() {
        let policy = RetryPolicy::default();
        for _ in 0..50 {
            let d = policy.backoff(1);
            assert!(d >= Duration::from_millis(200));
            assert!(d <= Duration::from_millis(250));
        }
    }

    #[test]
    fn test_should_retry_rules() {
        let policy = RetryPolicy::default();
        let transport = ConsulError::Transport("reset".into());
        let api = ConsulError::api(500, "boom");

        assert!(policy.should_retry(OperationKind::Read, &transport, 0));
        assert!(policy.should_retry(OperationKind::Read, &transport, 2));
        assert!(!policy.should_retry(OperationKind::Read, &transport, 3));
        assert!(!policy.should_retry(OperationKind::Write, &transport, 0));
        assert!(!policy.should_retry(OperationKind::Read, &api, 0));
    }

    #[tokio::test]
    async fn test_read_retries_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result = with_retry(&fast_policy(), OperationKind::Read, "test", || {
            let c = c.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ConsulError::Transport("refused".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_read_gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: Result<()> = with_retry(&fast_policy(), OperationKind::Read, "test", || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(ConsulError::Timeout(Duration::from_millis(1)))
            }
        })
        .await;

        assert!(matches!(result, Err(ConsulError::Timeout(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_write_is_never_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: Result<()> = with_retry(&fast_policy(), OperationKind::Write, "test", || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(ConsulError::Transport("refused".into()))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_api_error_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: Result<()> = with_retry(&fast_policy(), OperationKind::Read, "test", || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(ConsulError::api(503, "No cluster leader"))
            }
        })
        .await;

        assert_eq!(result.unwrap_err().status(), Some(503));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
