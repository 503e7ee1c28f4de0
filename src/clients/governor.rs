use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::constants::pacing;

/// The upstream data providers we talk to. Pacing is tracked per provider,
/// not per endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    AniList,
    Jikan,
    FillerList,
}

impl Provider {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AniList => "AniList",
            Self::Jikan => "Jikan",
            Self::FillerList => "AnimeFillerList",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("rate limited by provider")]
    Throttled,

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("no record for this identity")]
    NotFound,
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Network(err)
        }
    }
}

impl FetchError {
    #[must_use]
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        match status.as_u16() {
            429 => Self::Throttled,
            404 => Self::NotFound,
            code => Self::Status(code),
        }
    }

    #[must_use]
    pub const fn is_throttled(&self) -> bool {
        matches!(self, Self::Throttled)
    }
}

/// A minimal valid-shaped stand-in returned when every retry is exhausted,
/// so downstream code always receives a well-typed result.
pub trait Degraded {
    fn degraded() -> Self;
}

impl<T> Degraded for Vec<T> {
    fn degraded() -> Self {
        Self::new()
    }
}

impl<T> Degraded for Option<T> {
    fn degraded() -> Self {
        None
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PacingConfig {
    /// Minimum spacing between dispatches to the same provider.
    pub min_interval: Duration,
    /// Cooldown after an explicit rate-limit signal. Not charged against
    /// the retry budget; it is the upstream's own dialog.
    pub throttle_hold: Duration,
    /// Base for the exponential backoff on non-throttle failures.
    pub retry_base: Duration,
    pub max_retries: u32,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_interval: pacing::MIN_PROVIDER_INTERVAL,
            throttle_hold: pacing::THROTTLE_HOLD,
            retry_base: pacing::RETRY_BASE,
            max_retries: pacing::MAX_RETRIES,
        }
    }
}

/// Wraps every outbound provider call: enforces per-provider spacing,
/// honors throttling signals, retries with exponential backoff, and
/// degrades to a placeholder instead of propagating failure.
pub struct RequestGovernor {
    pacing: PacingConfig,
    last_dispatch: Mutex<HashMap<Provider, Instant>>,
}

impl RequestGovernor {
    #[must_use]
    pub fn new(pacing: PacingConfig) -> Self {
        Self {
            pacing,
            last_dispatch: Mutex::new(HashMap::new()),
        }
    }

    /// Reserve the next dispatch slot for `provider` and sleep until it
    /// arrives. The slot is recorded before sleeping, so concurrent callers
    /// queue behind each other instead of racing the interval.
    async fn wait_for_slot(&self, provider: Provider) {
        let slot = {
            let mut dispatched = self.last_dispatch.lock().await;
            let now = Instant::now();
            let slot = match dispatched.get(&provider) {
                Some(&last) => (last + self.pacing.min_interval).max(now),
                None => now,
            };
            dispatched.insert(provider, slot);
            slot
        };

        if slot > Instant::now() {
            tokio::time::sleep_until(slot).await;
        }
    }

    /// Run `op` under the pacing and retry contract. Never returns an
    /// error: exhaustion yields `T::degraded()`.
    pub async fn call<T, F, Fut>(&self, provider: Provider, op: F) -> T
    where
        T: Degraded,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut attempt: u32 = 0;

        loop {
            self.wait_for_slot(provider).await;

            match op().await {
                Ok(value) => return value,
                Err(FetchError::NotFound) => {
                    debug!(%provider, "provider has no record, not retrying");
                    return T::degraded();
                }
                Err(err) if err.is_throttled() => {
                    warn!(
                        %provider,
                        hold_ms = self.pacing.throttle_hold.as_millis() as u64,
                        "provider throttled us, holding"
                    );
                    tokio::time::sleep(self.pacing.throttle_hold).await;
                }
                Err(err) => {
                    if attempt >= self.pacing.max_retries {
                        warn!(
                            %provider,
                            error = %err,
                            attempts = attempt + 1,
                            "retries exhausted, degrading to placeholder"
                        );
                        return T::degraded();
                    }
                    let backoff = self.pacing.retry_base * 2u32.pow(attempt);
                    debug!(
                        %provider,
                        error = %err,
                        backoff_ms = backoff.as_millis() as u64,
                        "call failed, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }
}
