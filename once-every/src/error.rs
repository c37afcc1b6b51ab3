use std::time::Duration;

/// Errors produced while configuring an [`IntervalGate`](crate::IntervalGate).
///
/// Errors returned by the gated action are never converted into this type;
/// they are handed back to the caller exactly as the action produced them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    /// The interval was zero.
    ///
    /// A gate needs a strictly positive interval to separate two runs.
    #[error("interval must be greater than zero")]
    ZeroInterval,

    /// The interval does not fit in the gate's nanosecond timeline.
    #[error("interval {interval:?} is too large; it must fit in u64 nanoseconds")]
    IntervalTooLarge {
        /// The rejected interval.
        interval: Duration,
    },
}
