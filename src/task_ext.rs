use std::time::Duration;

use crate::{
    guard::{Guarded, guard_async, guard_async_with},
    timing::Delay,
    tryit::TryIt,
};

/// Extend `Future` with the crate's settling, guarding and timing operators.
pub trait TaskExt: Future {
    /// Settles the future into `Result<T, Failure<E>>`, catching panics.
    fn try_it(self) -> TryIt<Self>
    where
        Self: Sized,
    {
        TryIt::new(self)
    }

    /// Turns every error of a fallible future into `Ok(None)`.
    fn guarded<T, E>(self) -> Guarded<Self, fn(&E) -> bool>
    where
        Self: Future<Output = Result<T, E>> + Sized,
    {
        guard_async(self)
    }

    /// Turns errors accepted by `should_guard` into `Ok(None)`.
    fn guarded_if<T, E, P>(self, should_guard: P) -> Guarded<Self, P>
    where
        Self: Future<Output = Result<T, E>> + Sized,
        P: FnOnce(&E) -> bool,
    {
        guard_async_with(self, should_guard)
    }

    /// Waits `delay` from the first poll before polling the future.
    fn delay(self, delay: Duration) -> Delay<Self>
    where
        Self: Sized,
    {
        Delay::new(self, delay)
    }
}

impl<T> TaskExt for T where T: Future {}
