//! Round retry controller
//!
//! Retries a whole fetch round on transient failure with a bounded number
//! of attempts and a fixed delay between them. The delay is interruptible
//! through a cancellation token.

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Attempt budget and wait between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per round, at least one
    pub max_attempts: u32,
    /// Fixed wait before each retry
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Create a retry policy
    ///
    /// A zero attempt budget is raised to one.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// A policy that never retries
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

/// Runs an operation under a [`RetryPolicy`]
#[derive(Debug, Clone, Default)]
pub struct RetryController {
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl RetryController {
    /// Create a controller with its own cancellation token
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            cancel: CancellationToken::new(),
        }
    }

    /// Use a caller-owned cancellation token
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The retry policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Token that aborts waits between attempts
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run `op` until it succeeds, fails permanently or runs out of attempts
    ///
    /// `op` receives the 1-based attempt number. Transient errors are retried
    /// after the policy delay; any other error is returned as is. When the
    /// last attempt fails transiently the error is wrapped in
    /// [`Error::FatalRound`]. Cancellation before an attempt or during a wait
    /// returns [`Error::Cancelled`].
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            if attempt > 1 {
                self.wait(attempt, max_attempts).await?;
            } else if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) if attempt < max_attempts => {
                    warn!(code = e.code(), attempt, "{e}");
                    attempt += 1;
                }
                Err(e) => {
                    error!(code = e.code(), attempts = attempt, "{e}");
                    return Err(Error::fatal_round(attempt, e));
                }
            }
        }
    }

    async fn wait(&self, attempt: u32, max_attempts: u32) -> Result<()> {
        info!("waiting {}s before retry", self.policy.delay.as_secs());
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(Error::Cancelled),
            () = tokio::time::sleep(self.policy.delay) => {}
        }
        info!("attempt {attempt} of {max_attempts}");
        Ok(())
    }
}
