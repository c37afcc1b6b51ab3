//! # once-every
//!
//! `once-every` provides [`IntervalGate`], a primitive that runs an action at most once
//! per fixed interval, no matter how many callers try at the same time.
//!
//! ## Core Philosophy
//!
//! Most callers of a throttled side effect (a log line, a flush, a metrics emission)
//! arrive while the current window is already spent. Those callers should leave after a
//! single atomic load. Only callers that see an open window take a `Mutex`, re-check
//! the window under it, and the one that still finds it open runs the action.
//!
//! ## Key Concepts
//!
//! * **Fast Path**: An `Acquire` load of the next eligible instant. No lock, no waiting.
//! * **Slow Path**: Double-checked locking. Exactly one caller per window runs the action.
//! * **Failure Keeps The Window Open**: If the action returns `Err`, the gate does not
//!   advance, so the next caller may try again immediately.
//! * **Lazy Evaluation**: Windows reopen when time passes. There are no timers or
//!   background threads.
//!
//! ## Example
//!
//! ```rust
//! use once_every::IntervalGate;
//! use std::time::Duration;
//!
//! let gate = IntervalGate::new(Duration::from_secs(1)).unwrap();
//!
//! let mut flushed = 0;
//! for _ in 0..100 {
//!     gate.attempt_once(|| {
//!         flushed += 1;
//!         Ok::<(), std::io::Error>(())
//!     })
//!     .unwrap();
//! }
//! assert_eq!(flushed, 1);
//! ```

mod builder;
mod error;
mod gate;

pub use builder::GateBuilder;
pub use builder::Start;
pub use error::GateError;
pub use gate::Attempt;
pub use gate::IntervalGate;
