// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Per-record retry around the transport, and the startup connectivity probe.
//!
//! A record is retried only for local send errors. Once every attempt has failed the
//! error is returned as fatal: losing logs silently is worse than stopping.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, error, warn};

use crate::errors::{DeliveryError, ProbeError, TransportError};
use crate::transport::Transport;

/// How many times a record is sent, and how long to wait between attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryStrategy {
    /// `attempts` sends back to back.
    Immediate(u32),
    /// `attempts` sends, waiting `delay_ms` milliseconds between them.
    LinearBackoff(u32, u64),
}

impl RetryStrategy {
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Immediate(attempts) | Self::LinearBackoff(attempts, _) => (*attempts).max(1),
        }
    }

    fn delay(&self) -> Option<Duration> {
        match self {
            Self::Immediate(_) => None,
            Self::LinearBackoff(_, delay_ms) => Some(Duration::from_millis(*delay_ms)),
        }
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::Immediate(3)
    }
}

/// Sends records through a [`Transport`] with bounded retry.
pub struct DeliveryScheduler<T> {
    transport: T,
    retry_strategy: RetryStrategy,
}

impl<T: Transport> DeliveryScheduler<T> {
    pub fn new(transport: T, retry_strategy: RetryStrategy) -> Self {
        Self {
            transport,
            retry_strategy,
        }
    }

    /// Sends `payload`, re-sending every chunk on each attempt.
    ///
    /// Returns the number of datagrams of the successful attempt.
    pub async fn send(&self, payload: &[u8]) -> Result<usize, DeliveryError> {
        let attempts = self.retry_strategy.attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.transport.send(payload).await {
                Ok(datagrams) => {
                    if attempt > 1 {
                        debug!("GELF message sent on attempt {attempt}");
                    }
                    return Ok(datagrams);
                }
                Err(e @ TransportError::TooManyChunks { .. }) => {
                    return Err(DeliveryError::MessageTooLarge(e));
                }
                Err(e) => {
                    warn!("Failed to send GELF message (attempt {attempt}/{attempts}): {e}");
                    if attempt >= attempts {
                        error!("Giving up on GELF message after {attempt} attempts");
                        return Err(DeliveryError::RetriesExhausted {
                            attempts: attempt,
                            source: e,
                        });
                    }
                }
            }

            if let Some(delay) = self.retry_strategy.delay() {
                sleep(delay).await;
            }
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

/// Startup gate that retries an action with exponential backoff and jitter until it
/// succeeds or `max_elapsed` runs out.
#[derive(Clone, Debug)]
pub struct ConnectivityProbe {
    pub initial_delay: Duration,
    pub multiplier: u32,
    pub max_delay: Duration,
    pub max_elapsed: Duration,
}

impl Default for ConnectivityProbe {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(100),
            multiplier: 2,
            max_delay: Duration::from_secs(10),
            max_elapsed: Duration::from_secs(60),
        }
    }
}

impl ConnectivityProbe {
    #[must_use]
    pub fn with_max_elapsed(max_elapsed: Duration) -> Self {
        Self {
            max_elapsed,
            ..Default::default()
        }
    }

    /// Runs `action` until it returns `Ok`.
    ///
    /// Each attempt is cut off at the time left before `max_elapsed`. Gives up
    /// with [`ProbeError::Timeout`] once the next wait would end past `max_elapsed`.
    pub async fn run<F, Fut, T, E>(&self, mut action: F) -> Result<T, ProbeError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let start = Instant::now();
        let mut delay = self.initial_delay;
        let mut attempts = 0;

        loop {
            attempts += 1;
            let remaining = self.max_elapsed.saturating_sub(start.elapsed());
            let last_error = match timeout(remaining, action()).await {
                Ok(Ok(value)) => {
                    debug!("Destination reachable after {attempts} attempt(s)");
                    return Ok(value);
                }
                Ok(Err(e)) => e.to_string(),
                Err(_) => format!("attempt timed out after {remaining:?}"),
            };

            let wait = jittered(delay);
            let elapsed = start.elapsed();
            if elapsed >= self.max_elapsed || elapsed + wait > self.max_elapsed {
                error!("Destination unreachable, giving up after {elapsed:?}: {last_error}");
                return Err(ProbeError::Timeout {
                    elapsed,
                    attempts,
                    last_error,
                });
            }

            warn!("Destination unreachable (attempt {attempts}): {last_error}, retrying in {wait:?}");
            sleep(wait).await;
            delay = delay.saturating_mul(self.multiplier).min(self.max_delay);
        }
    }
}

/// Equal jitter: half of `delay` plus a random share of the other half.
fn jittered(delay: Duration) -> Duration {
    let half = delay / 2;
    let max_jitter = u64::try_from(half.as_millis()).unwrap_or(u64::MAX);
    half + Duration::from_millis(rand::rng().random_range(0..=max_jitter))
}
