/// Polling utilities for waiting on remote state with a bounded attempt budget
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

use crate::error::{Error, Result};

/// Default number of fetch attempts
pub const DEFAULT_ATTEMPTS: u32 = 20;

/// Default delay between attempts, in seconds
pub const DEFAULT_WAIT_SECONDS: u64 = 1;

/// Configuration for polling operations
#[derive(Debug, Clone)]
pub struct Poller {
    pub attempts: u32,
    pub interval: Duration,
    cancel: Option<watch::Receiver<bool>>,
}

impl Default for Poller {
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPTS, DEFAULT_WAIT_SECONDS)
    }
}

impl Poller {
    /// Create a poller doing `attempts` fetches, `wait_seconds` apart
    pub fn new(attempts: u32, wait_seconds: u64) -> Self {
        Self::with_interval(attempts, Duration::from_secs(wait_seconds))
    }

    /// Create a poller with a sub-second interval
    pub fn with_interval(attempts: u32, interval: Duration) -> Self {
        Self {
            attempts,
            interval,
            cancel: None,
        }
    }

    /// Abort the wait as soon as `true` is published on the channel
    #[must_use]
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Poll until the fetch yields a value or the attempt budget is spent
    ///
    /// The fetch function should return:
    /// - Ok(Some(T)) when the condition is met (returns T)
    /// - Ok(None) when it is not met yet (keeps polling)
    /// - Err(e) on failure (stops polling and returns the error)
    pub async fn poll<F, Fut, T>(&self, mut fetch: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        for attempt in 1..=self.attempts {
            if self.is_cancelled() {
                return Err(Error::Cancelled);
            }

            debug!("Poll attempt {}/{}", attempt, self.attempts);
            if let Some(value) = fetch().await? {
                return Ok(value);
            }

            if attempt < self.attempts {
                self.sleep().await?;
            }
        }

        Err(Error::WaitAttemptsExceeded {
            attempts: self.attempts,
        })
    }

    /// Wait until the fetched value equals `target`, then store it in `current`
    ///
    /// Returns immediately without fetching when `current` already equals `target`.
    pub async fn wait_until_eq<T, F, Fut>(&self, current: &mut T, target: T, mut fetch: F) -> Result<()>
    where
        T: PartialEq,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if *current == target {
            return Ok(());
        }

        let target = &target;
        let value = self
            .poll(|| {
                let fetched = fetch();
                async move {
                    let value = fetched.await?;
                    Ok::<_, Error>((value == *target).then_some(value))
                }
            })
            .await?;

        *current = value;
        Ok(())
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    async fn sleep(&self) -> Result<()> {
        match self.cancel.clone() {
            Some(rx) => {
                tokio::select! {
                    _ = tokio::time::sleep(self.interval) => Ok(()),
                    _ = cancelled(rx) => Err(Error::Cancelled),
                }
            }
            None => {
                tokio::time::sleep(self.interval).await;
                Ok(())
            }
        }
    }
}

/// Resolves once `true` is published; never resolves if the sender is gone
async fn cancelled(mut rx: watch::Receiver<bool>) {
    if rx.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}
