//! Start-rate limiter for the poll cycle.
//!
//! `RateLimit` wraps a no-argument async action. The first trigger runs the
//! action immediately; later triggers wait until `interval` has elapsed since
//! the previous start. Triggers that queue up while a trailing execution is
//! pending share that one execution instead of each starting their own.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::Result;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

#[derive(Debug, Clone, Error)]
#[error("coalesced poll cycle failed: {message}")]
/// Returned to triggers that shared an execution which failed.
pub struct CoalescedCycleError {
    pub message: String,
}

struct RateLimitState<T> {
    last_started_at: Option<Instant>,
    last_outcome: Option<Result<T, String>>,
}

pub struct RateLimit<F, T> {
    action: F,
    interval: Duration,
    executions: AtomicU64,
    state: Mutex<RateLimitState<T>>,
}

impl<F, Fut, T> RateLimit<F, T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
    T: Clone,
{
    pub fn new(action: F, interval: Duration) -> Self {
        Self {
            action,
            interval,
            executions: AtomicU64::new(0),
            state: Mutex::new(RateLimitState {
                last_started_at: None,
                last_outcome: None,
            }),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of times the wrapped action has been started.
    pub fn executions(&self) -> u64 {
        self.executions.load(Ordering::Acquire)
    }

    /// Requests an execution of the wrapped action and waits for its outcome.
    ///
    /// The caller whose trigger actually starts the action receives the
    /// action's own result, error included. Callers coalesced into that
    /// execution receive a clone of its value or a [`CoalescedCycleError`].
    pub async fn trigger(&self) -> Result<T> {
        let seen_executions = self.executions.load(Ordering::Acquire);
        // Held across the wait and the action so executions never overlap.
        let mut state = self.state.lock().await;

        if self.executions.load(Ordering::Acquire) > seen_executions {
            if let Some(outcome) = state.last_outcome.as_ref() {
                debug!("trigger coalesced into an execution started after it arrived");
                return match outcome {
                    Ok(value) => Ok(value.clone()),
                    Err(message) => Err(CoalescedCycleError {
                        message: message.clone(),
                    }
                    .into()),
                };
            }
        }

        if let Some(last_started_at) = state.last_started_at {
            let ready_at = last_started_at + self.interval;
            if Instant::now() < ready_at {
                debug!(
                    wait_ms = ready_at.duration_since(Instant::now()).as_millis() as u64,
                    "rate limit window open; deferring execution"
                );
                sleep_until(ready_at).await;
            }
        }

        state.last_started_at = Some(Instant::now());
        self.executions.fetch_add(1, Ordering::AcqRel);
        let outcome = (self.action)().await;
        state.last_outcome = Some(match &outcome {
            Ok(value) => Ok(value.clone()),
            Err(error) => Err(format!("{error:#}")),
        });
        outcome
    }
}
