//! Retry/backoff state machine for a single identifier's fetch.
//!
//! `Attempting -> Backoff -> Attempting -> ... -> Exhausted`. Success and
//! not-found leave the machine directly; the driver never feeds them in.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    pub fn start(&self) -> RetryState {
        RetryState::Attempting { attempt: 1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// Attempt number `attempt` (1-based) is due.
    Attempting { attempt: u32 },
    /// Attempt `attempt` failed; waiting `delay` before the next one.
    Backoff { attempt: u32, delay: Duration },
    /// No further attempts. `attempts` were made.
    Exhausted { attempts: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryEvent {
    /// The current attempt failed; `retryable` is false for failures another
    /// attempt cannot fix.
    AttemptFailed { retryable: bool },
    BackoffElapsed,
}

impl RetryState {
    pub fn next(self, event: RetryEvent, policy: &RetryPolicy) -> RetryState {
        match (self, event) {
            (RetryState::Attempting { attempt }, RetryEvent::AttemptFailed { retryable }) => {
                if retryable && attempt < policy.max_attempts() {
                    RetryState::Backoff {
                        attempt,
                        delay: policy.backoff,
                    }
                } else {
                    RetryState::Exhausted { attempts: attempt }
                }
            }
            (RetryState::Backoff { attempt, .. }, RetryEvent::BackoffElapsed) => {
                RetryState::Attempting {
                    attempt: attempt + 1,
                }
            }
            // Any other pairing is a driver bug; stay put rather than skip an attempt.
            (state, _) => state,
        }
    }

    /// Retries performed so far (attempts beyond the first).
    pub fn retries(&self) -> u32 {
        match *self {
            RetryState::Attempting { attempt } => attempt - 1,
            RetryState::Backoff { attempt, .. } => attempt - 1,
            RetryState::Exhausted { attempts } => attempts.saturating_sub(1),
        }
    }
}
