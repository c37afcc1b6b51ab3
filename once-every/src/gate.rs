use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use quanta::Clock;
use quanta::Instant;
use tracing::debug;
use tracing::trace;

use crate::GateBuilder;
use crate::GateError;
use crate::Start;

/// The outcome of an [`IntervalGate::attempt`] that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt<T> {
    /// This caller ran the action and it succeeded. The next window opens one
    /// interval after the action returned.
    Ran(T),
    /// The window was already spent, so the action was not invoked.
    Throttled {
        /// Time left until the next window opens.
        retry_after: Duration,
    },
}

impl<T> Attempt<T> {
    pub fn is_ran(&self) -> bool {
        matches!(self, Attempt::Ran(_))
    }

    pub fn is_throttled(&self) -> bool {
        matches!(self, Attempt::Throttled { .. })
    }

    /// Returns the action's value if this caller ran it.
    pub fn ran(self) -> Option<T> {
        match self {
            Attempt::Ran(value) => Some(value),
            Attempt::Throttled { .. } => None,
        }
    }
}

/// Runs an action at most once per interval.
///
/// A gate may be shared by any number of threads through `&IntervalGate` or `Arc`.
/// It is not `Clone`; share one instance rather than copying it.
///
/// Time is measured with a monotonic `quanta::Clock` and stored as nanoseconds since
/// an anchor taken at construction.
#[derive(Debug)]
pub struct IntervalGate {
    /// Earliest instant, in nanoseconds since `anchor`, at which the action may run.
    next_eligible: AtomicU64,
    interval: u64,
    /// Serialises the re-check and the action. State lives in `next_eligible`.
    lock: Mutex<()>,
    clock: Clock,
    anchor: Instant,
}

impl IntervalGate {
    /// Creates a gate whose first attempt runs immediately.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::ZeroInterval`] if `interval` is zero.
    pub fn new(interval: Duration) -> Result<Self, GateError> {
        Self::builder(interval).build()
    }

    pub fn with_clock(interval: Duration, clock: Clock) -> Result<Self, GateError> {
        Self::builder(interval).clock(clock).build()
    }

    pub fn builder(interval: Duration) -> GateBuilder {
        GateBuilder::new(interval)
    }

    pub(crate) fn from_parts(
        interval: Duration,
        start: Start,
        clock: Clock,
    ) -> Result<Self, GateError> {
        if interval.is_zero() {
            return Err(GateError::ZeroInterval);
        }
        let interval_ns = u64::try_from(interval.as_nanos())
            .map_err(|_| GateError::IntervalTooLarge { interval })?;

        let next_eligible = match start {
            Start::Immediate => 0,
            Start::Delayed => interval_ns,
        };
        let anchor = clock.now();

        debug!(?interval, ?start, "interval gate created");

        Ok(Self {
            next_eligible: AtomicU64::new(next_eligible),
            interval: interval_ns,
            lock: Mutex::new(()),
            clock,
            anchor,
        })
    }

    pub fn interval(&self) -> Duration {
        Duration::from_nanos(self.interval)
    }

    /// Returns `true` if an attempt made now would invoke the action.
    ///
    /// Another caller may take the window between this check and your attempt.
    pub fn is_eligible(&self) -> bool {
        self.retry_after().is_none()
    }

    /// How long until the next window opens, or `None` if it is open now.
    pub fn retry_after(&self) -> Option<Duration> {
        let next = self.next_eligible.load(Ordering::Acquire);
        remaining(self.now(), next)
    }

    /// Invokes `action` if no successful action has run in the current window.
    ///
    /// Returns `Ok(())` both when the window was spent (the action is not invoked)
    /// and when the action ran and succeeded. An error from the action is returned
    /// unchanged and leaves the window open for the next caller.
    ///
    /// # Errors
    ///
    /// Returns whatever error `action` returned.
    pub fn attempt_once<E, F>(&self, action: F) -> Result<(), E>
    where
        F: FnOnce() -> Result<(), E>,
    {
        self.attempt(action).map(|_| ())
    }

    /// Like [`attempt_once`](Self::attempt_once), but reports whether this caller
    /// ran the action and hands back its value.
    ///
    /// # Errors
    ///
    /// Returns whatever error `action` returned.
    pub fn attempt<T, E, F>(&self, action: F) -> Result<Attempt<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(retry_after) = self.retry_after() {
            return Ok(Attempt::Throttled { retry_after });
        }

        // The guarded data is `()`, so a panic in a previous action leaves nothing
        // inconsistent behind.
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Several callers can pass the fast path before the winner stores its timestamp.
        let next = self.next_eligible.load(Ordering::Acquire);
        if let Some(retry_after) = remaining(self.now(), next) {
            trace!(?retry_after, "window spent while waiting for the lock");
            return Ok(Attempt::Throttled { retry_after });
        }

        match action() {
            Ok(value) => {
                let next = self.now().saturating_add(self.interval);
                self.next_eligible.fetch_max(next, Ordering::Release);
                trace!(next_eligible_ns = next, "action ran; window closed");
                Ok(Attempt::Ran(value))
            }
            Err(err) => {
                debug!("action failed; window stays open");
                Err(err)
            }
        }
    }

    #[inline]
    fn now(&self) -> u64 {
        let elapsed = self.clock.now().duration_since(self.anchor);
        u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX)
    }
}

#[inline]
fn remaining(now: u64, next: u64) -> Option<Duration> {
    (now < next).then(|| Duration::from_nanos(next - now))
}
