//! Bounded fixed-interval polling for eventually consistent reads
//!
//! A `Poller` is a plain state machine: feed it the result of each probe
//! and it answers with either "wait this long" or "done". [`poll_until`] and
//! [`poll_until_cancelled`] drive it on the tokio clock.
//!
//! ```text
//!   Probing(1) ──NotYetVisible──▶ Waiting(1) ──resume──▶ Probing(2) ── ... ──▶ TimedOut
//!       │                                                    │
//!       └──Matched──▶ Succeeded                              └──Matched──▶ Succeeded
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Result of one read probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    /// The read reflects the expected state
    Matched(T),
    /// The read does not reflect the write yet; carries what was observed
    NotYetVisible(String),
    /// Something other than the verification target came back (e.g. HTTP 5xx)
    UnexpectedError(String),
}

/// What to do with [`Probe::UnexpectedError`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnexpectedPolicy {
    /// Count it as another not-yet-visible attempt
    #[default]
    Retry,
    /// Stop immediately with [`Error::VerificationFailed`]
    Fail,
}

/// Attempt ceiling and fixed delay between attempts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    max_attempts: u32,
    delay: Duration,
    on_unexpected: UnexpectedPolicy,
}

impl PollPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Result<Self> {
        if max_attempts == 0 {
            return Err(Error::InvalidPolicy(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            max_attempts,
            delay,
            on_unexpected: UnexpectedPolicy::default(),
        })
    }

    pub fn with_unexpected(mut self, policy: UnexpectedPolicy) -> Self {
        self.on_unexpected = policy;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn on_unexpected(&self) -> UnexpectedPolicy {
        self.on_unexpected
    }

    /// Upper bound on time spent sleeping, excluding probe latency
    pub fn max_wait(&self) -> Duration {
        self.delay.saturating_mul(self.max_attempts - 1)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_millis(1000),
            on_unexpected: UnexpectedPolicy::Retry,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PollState {
    Probing { attempt: u32 },
    Waiting { attempt: u32 },
    Succeeded { attempts: u32 },
    TimedOut { attempts: u32 },
    Failed { attempts: u32 },
    Cancelled { attempts: u32 },
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollState::Probing { .. } | PollState::Waiting { .. })
    }
}

/// Terminal result of a [`Poller`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome<T> {
    Matched { value: T, attempts: u32 },
    TimedOut { attempts: u32, last_state: String },
    Failed { attempts: u32, detail: String },
}

/// What the driver should do after recording a probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Next<T> {
    Wait(Duration),
    Done(Outcome<T>),
}

/// The polling state machine, independent of any clock or runtime
#[derive(Debug, Clone)]
pub(crate) struct Poller {
    policy: PollPolicy,
    state: PollState,
    last_state: Option<String>,
}

impl Poller {
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            policy,
            state: PollState::Probing { attempt: 1 },
            last_state: None,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Attempt index of the current or most recent probe, starting at 1
    pub fn attempt(&self) -> u32 {
        match self.state {
            PollState::Probing { attempt } | PollState::Waiting { attempt } => attempt,
            PollState::Succeeded { attempts }
            | PollState::TimedOut { attempts }
            | PollState::Failed { attempts }
            | PollState::Cancelled { attempts } => attempts,
        }
    }

    pub fn last_state(&self) -> Option<&str> {
        self.last_state.as_deref()
    }

    /// Record the result of the probe for the current attempt.
    ///
    /// Outside [`PollState::Probing`] the result is discarded, the state is
    /// left alone and the answer is a `Failed` outcome.
    pub fn record<T>(&mut self, probe: Probe<T>) -> Next<T> {
        let PollState::Probing { attempt } = self.state else {
            return Next::Done(Outcome::Failed {
                attempts: self.attempt(),
                detail: format!("result recorded while {:?}", self.state),
            });
        };

        let observed = match probe {
            Probe::Matched(value) => {
                self.state = PollState::Succeeded { attempts: attempt };
                return Next::Done(Outcome::Matched {
                    value,
                    attempts: attempt,
                });
            }
            Probe::UnexpectedError(detail) if self.policy.on_unexpected == UnexpectedPolicy::Fail => {
                self.state = PollState::Failed { attempts: attempt };
                self.last_state = Some(detail.clone());
                return Next::Done(Outcome::Failed {
                    attempts: attempt,
                    detail,
                });
            }
            Probe::UnexpectedError(observed) | Probe::NotYetVisible(observed) => observed,
        };

        self.last_state = Some(observed);
        if attempt >= self.policy.max_attempts {
            self.state = PollState::TimedOut { attempts: attempt };
            Next::Done(Outcome::TimedOut {
                attempts: attempt,
                last_state: self.last_state.clone().unwrap_or_default(),
            })
        } else {
            self.state = PollState::Waiting { attempt };
            Next::Wait(self.policy.delay)
        }
    }

    /// Leave [`PollState::Waiting`] and start the next attempt
    pub fn resume(&mut self) {
        if let PollState::Waiting { attempt } = self.state {
            self.state = PollState::Probing {
                attempt: attempt + 1,
            };
        }
    }

    /// Abort a non-terminal poller
    pub fn cancel(&mut self) {
        if !self.state.is_terminal() {
            self.state = PollState::Cancelled {
                attempts: self.attempt(),
            };
        }
    }
}

/// A successful verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified<T> {
    pub value: T,
    pub attempts: u32,
    pub elapsed: Duration,
}

impl<T> Outcome<T> {
    fn into_result(self, what: &str, elapsed: Duration) -> Result<Verified<T>> {
        match self {
            Outcome::Matched { value, attempts } => Ok(Verified {
                value,
                attempts,
                elapsed,
            }),
            Outcome::TimedOut {
                attempts,
                last_state,
            } => Err(Error::VerificationTimeout {
                what: what.to_string(),
                attempts,
                elapsed_ms: elapsed.as_millis() as u64,
                last_state,
            }),
            Outcome::Failed { attempts, detail } => Err(Error::VerificationFailed {
                what: what.to_string(),
                attempts,
                detail,
            }),
        }
    }
}

/// Probe until `check` matches or the policy's attempt ceiling is reached.
///
/// `check` receives the 1-based attempt index. `what` names the expectation
/// in logs and errors, e.g. `"pet 42 to exist"`.
pub async fn poll_until<T, F, Fut>(what: &str, policy: &PollPolicy, check: F) -> Result<Verified<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Probe<T>>,
{
    poll_until_cancelled(what, policy, &CancellationToken::new(), check).await
}

/// Same as [`poll_until`], but the wait between attempts ends early when
/// `cancel` fires.
pub async fn poll_until_cancelled<T, F, Fut>(
    what: &str,
    policy: &PollPolicy,
    cancel: &CancellationToken,
    mut check: F,
) -> Result<Verified<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Probe<T>>,
{
    let started = Instant::now();
    let mut poller = Poller::new(policy.clone());

    loop {
        let attempt = poller.attempt();
        debug!(what, attempt, max_attempts = policy.max_attempts(), "Probing");

        match poller.record(check(attempt).await) {
            Next::Wait(delay) => {
                info!(
                    what,
                    attempt,
                    observed = poller.last_state().unwrap_or_default(),
                    "Not visible yet, waiting {} ms",
                    delay.as_millis()
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        poller.cancel();
                        debug!(what, state = ?poller.state(), "Polling cancelled");
                        return Err(Error::Cancelled {
                            what: what.to_string(),
                            attempts: attempt,
                        });
                    }
                    _ = sleep(delay) => {}
                }
                poller.resume();
            }
            Next::Done(outcome) => {
                match &outcome {
                    Outcome::Matched { attempts, .. } => {
                        info!(what, attempts, "Verified");
                    }
                    Outcome::TimedOut { attempts, last_state } => {
                        warn!(what, attempts, last_state = %last_state, "Verification timed out");
                    }
                    Outcome::Failed { attempts, detail } => {
                        warn!(what, attempts, detail = %detail, "Verification failed");
                    }
                }
                return outcome.into_result(what, started.elapsed());
            }
        }
    }
}
