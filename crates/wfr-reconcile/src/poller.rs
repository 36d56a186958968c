use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use wfr_core::PollBudget;

/// Shared cancellation flag. Clones observe the same flag; cancelling wakes
/// every sleeper currently waiting on it.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (flag, cvar) = &*self.inner;
        *flag.lock().unwrap_or_else(|e| e.into_inner()) = true;
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Blocks for up to `timeout`. Returns true if the token was cancelled
    /// before or during the wait.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (flag, cvar) = &*self.inner;
        let deadline = Instant::now() + timeout;
        let mut cancelled = flag.lock().unwrap_or_else(|e| e.into_inner());
        while !*cancelled {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            cancelled = match cvar.wait_timeout(cancelled, deadline - now) {
                Ok((guard, _)) => guard,
                Err(e) => e.into_inner().0,
            };
        }
        true
    }
}

/// Pause between poll attempts. Returns false when the pause was interrupted
/// and polling should stop.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, interval: Duration) -> bool;
}

/// Real sleeps, cut short by its cancel token.
#[derive(Clone, Debug, Default)]
pub struct ThreadSleeper {
    cancel: CancelToken,
}

impl ThreadSleeper {
    pub fn new(cancel: CancelToken) -> Self {
        Self { cancel }
    }
}

impl Sleeper for ThreadSleeper {
    fn sleep(&self, interval: Duration) -> bool {
        !self.cancel.wait_timeout(interval)
    }
}

/// Test sleeper: records requested intervals without waiting. Optionally
/// reports an interruption on the n-th sleep (1-based).
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
    interrupt_on: Option<usize>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interrupting_on(nth: usize) -> Self {
        Self { slept: Mutex::new(Vec::new()), interrupt_on: Some(nth) }
    }

    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn count(&self) -> usize {
        self.slept.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, interval: Duration) -> bool {
        let mut slept = self.slept.lock().unwrap_or_else(|e| e.into_inner());
        slept.push(interval);
        self.interrupt_on != Some(slept.len())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    Satisfied,
    Exhausted,
    Cancelled,
}

/// Last value seen by a poll plus how the poll ended.
#[derive(Clone, Debug)]
pub struct Polled<T> {
    pub value: T,
    pub attempts: u32,
    pub outcome: PollOutcome,
}

impl<T> Polled<T> {
    pub fn ok(&self) -> bool {
        self.outcome == PollOutcome::Satisfied
    }
}

#[derive(Clone)]
pub struct Poller {
    sleeper: Arc<dyn Sleeper>,
}

impl Poller {
    pub fn new(sleeper: Arc<dyn Sleeper>) -> Self {
        Self { sleeper }
    }

    pub fn with_cancel(cancel: CancelToken) -> Self {
        Self::new(Arc::new(ThreadSleeper::new(cancel)))
    }

    /// Calls `probe` until it reports done or `budget.attempts` calls were made
    /// (a zero budget still makes one call), sleeping `budget.interval()`
    /// between calls. Errors from `probe` end the poll immediately.
    pub fn poll_until<T, E>(
        &self,
        what: &str,
        budget: PollBudget,
        mut probe: impl FnMut() -> Result<(T, bool), E>,
    ) -> Result<Polled<T>, E> {
        let max_attempts = budget.attempts.max(1);
        let mut attempt = 1;
        loop {
            let (value, done) = probe()?;
            debug!(what, attempt, max_attempts, done, "poll attempt");
            if done {
                return Ok(Polled { value, attempts: attempt, outcome: PollOutcome::Satisfied });
            }
            if attempt >= max_attempts {
                warn!(what, attempts = attempt, interval_secs = budget.interval_secs, "poll budget exhausted");
                return Ok(Polled { value, attempts: attempt, outcome: PollOutcome::Exhausted });
            }
            if !self.sleeper.sleep(budget.interval()) {
                warn!(what, attempts = attempt, "poll cancelled");
                return Ok(Polled { value, attempts: attempt, outcome: PollOutcome::Cancelled });
            }
            attempt += 1;
        }
    }
}
