//! Fixed-delay retry for transient catalog failures

use super::CatalogError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Retries retryable [`CatalogError`]s a fixed number of times with a fixed
/// pause between attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay: Duration::from_millis(2000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// A policy that surfaces the first failure
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or runs out of retries.
    pub async fn run<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> Result<T, CatalogError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CatalogError>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        info!(operation = operation_name, retries = attempt, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) if error.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        operation = operation_name,
                        attempt,
                        error = %error,
                        "transient failure, retrying in {:?}",
                        self.delay
                    );
                    sleep(self.delay).await;
                }
                Err(error) => {
                    if error.is_retryable() {
                        warn!(operation = operation_name, attempts = attempt + 1, error = %error, "giving up");
                    }
                    return Err(error);
                }
            }
        }
    }
}
