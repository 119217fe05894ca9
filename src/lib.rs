//! Utilities for structured and composable asynchronous control flow.
//!
//! `asyncflow` provides small primitives for fanning out, retrying, guarding and
//! cleaning up after asynchronous work, plus timing wrappers for callbacks.
//!
//! The crate is designed to work independently of any specific async runtime.
//! Concurrency is cooperative and happens inside the future you await; timers
//! are driven by a small internal thread pool.
//!
//! Features include:
//! - [`parallel()`] for running a task over many inputs with a concurrency cap,
//!   keeping results in input order and aggregating failures
//! - [`all()`] and [`all_keyed`] for awaiting a collection without short-circuiting
//! - [`retry()`] with a fixed delay, computed backoff and early bail-out
//! - [`guard()`] and [`defer()`] for suppressing selected errors and for
//!   guaranteed cleanup
//! - [`tryit()`] and [`TryIt`] for turning errors and panics into plain results
//! - [`Debounce`], [`Throttle`] and [`Memo`] for wrapping callbacks
//!
//! Failures from a fan-out are reported as an [`AggregateError`] carrying every
//! underlying [`Failure`].

pub mod all;
pub mod debounce;
pub mod defer;
pub mod error;
pub mod guard;
pub mod memo;
pub mod parallel;
pub mod retry;
pub mod sequential;
pub mod task_ext;
pub mod throttle;
pub mod timing;
pub mod tryit;

pub use all::{all, all_keyed};
pub use debounce::{Debounce, DebounceOptions};
pub use defer::{CleanupOptions, Registrar, defer};
pub use error::{AggregateError, Attempt, Failure, ReduceError, RetryError};
pub use guard::{guard, guard_async, guard_async_with, guard_with};
pub use memo::{Memo, MemoOptions};
pub use parallel::parallel;
pub use retry::{Backoff, Bail, RetryOptions, retry};
pub use throttle::{Throttle, ThrottleOptions};
pub use timing::{schedule, sleep};
pub use tryit::{TryIt, attempt, tryit, tryit_async};
