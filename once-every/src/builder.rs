use std::time::Duration;

use quanta::Clock;

use crate::GateError;
use crate::IntervalGate;

/// When a freshly built gate opens its first window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Start {
    /// The first attempt after construction runs the action.
    #[default]
    Immediate,
    /// The first window opens one full interval after construction.
    Delayed,
}

/// Configures an [`IntervalGate`] before it is shared.
///
/// ```rust
/// use once_every::IntervalGate;
/// use once_every::Start;
/// use std::time::Duration;
///
/// let gate = IntervalGate::builder(Duration::from_millis(250))
///     .start(Start::Delayed)
///     .build()
///     .unwrap();
///
/// assert!(!gate.is_eligible());
/// ```
#[derive(Debug, Clone)]
pub struct GateBuilder {
    interval: Duration,
    start: Start,
    clock: Option<Clock>,
}

impl GateBuilder {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            start: Start::default(),
            clock: None,
        }
    }

    /// Chooses whether the first window is open at construction.
    pub fn start(mut self, start: Start) -> Self {
        self.start = start;
        self
    }

    /// Uses `clock` instead of a fresh `quanta::Clock`.
    ///
    /// Pass a clock from `Clock::mock()` to drive the gate by hand in tests.
    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validates the interval and builds the gate.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::ZeroInterval`] for a zero interval and
    /// [`GateError::IntervalTooLarge`] when the interval does not fit in `u64` nanoseconds.
    pub fn build(self) -> Result<IntervalGate, GateError> {
        let clock = self.clock.unwrap_or_else(Clock::new);
        IntervalGate::from_parts(self.interval, self.start, clock)
    }
}
