//! Fixed-delay retry, keyed on error kind.

use std::time::Duration;

use tracing::warn;

use crate::error::{ErrorKind, Result};

/// Which errors to retry, how long to wait between attempts, and how many
/// attempts to make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retry_on: Vec<ErrorKind>,
    pub delay: Duration,
    /// `None` retries without limit.
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Retry date selection until the horizon rolls forward.
    pub fn no_suitable_date(delay: Duration) -> Self {
        Self {
            retry_on: vec![ErrorKind::NoSuitableDate],
            delay,
            max_attempts: None,
        }
    }

    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn retries(&self, kind: ErrorKind) -> bool {
        self.retry_on.contains(&kind)
    }

    /// Runs `op` until it succeeds, fails with a kind outside `retry_on`, or
    /// runs out of attempts. Sleeps `delay` between attempts.
    pub async fn run<T>(&self, what: &str, mut op: impl FnMut() -> Result<T>) -> Result<T> {
        let mut attempt: u32 = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if self.retries(e.kind()) && !self.exhausted(attempt) => {
                    warn!(
                        what,
                        attempt,
                        retry_in = ?self.delay,
                        error = %e,
                        "Retrying after delay"
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn exhausted(&self, attempt: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempt >= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CycleError;
    use chrono::NaiveDate;

    fn no_date() -> CycleError {
        let d = NaiveDate::from_ymd_opt(2021, 11, 8).unwrap();
        CycleError::NoSuitableDate {
            candidate: d,
            limit: d,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_listed_kind_until_success() {
        let policy = RetryPolicy::no_suitable_date(Duration::from_secs(3600));
        let started = tokio::time::Instant::now();
        let mut calls = 0;

        let value = policy
            .run("test", || {
                calls += 1;
                if calls < 3 {
                    Err(no_date())
                } else {
                    Ok(calls)
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 3);
        assert_eq!(started.elapsed(), Duration::from_secs(2 * 3600));
    }

    #[tokio::test(start_paused = true)]
    async fn other_kinds_propagate_immediately() {
        let policy = RetryPolicy::no_suitable_date(Duration::from_secs(3600));
        let mut calls = 0;

        let err = policy
            .run("test", || -> Result<()> {
                calls += 1;
                Err(CycleError::NoSuitablePrice {
                    attempts: 10,
                    last_price: None,
                })
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NoSuitablePrice);
        assert_eq!(calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let policy = RetryPolicy::no_suitable_date(Duration::from_secs(1)).with_max_attempts(3);
        let mut calls = 0;

        let err = policy
            .run("test", || -> Result<()> {
                calls += 1;
                Err(no_date())
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NoSuitableDate);
        assert_eq!(calls, 3);
    }
}
