//! Swallow selected errors, turning them into an absent value.
//!
//! A guarded task yields `Ok(Some(value))` on success and `Ok(None)` when its
//! error is accepted by the predicate (or when there is no predicate). Rejected
//! errors are returned unchanged. The synchronous and asynchronous forms are
//! separate entry points so a synchronous task stays synchronous.
//!
//! Only returned errors are guarded. Panics are not caught.

use std::{
    pin::Pin,
    task::{Context, Poll},
};

use pin_project_lite::pin_project;

/// Runs `task` and converts any error into `None`.
pub fn guard<T, E>(task: impl FnOnce() -> Result<T, E>) -> Result<Option<T>, E> {
    guard_with(task, |_| true)
}

/// Runs `task`; errors for which `should_guard` returns `true` become `None`,
/// others are returned unchanged.
///
/// # Example
/// ```
/// use asyncflow::guard_with;
///
/// let missing = guard_with(|| "x".parse::<u8>(), |_| true);
/// assert_eq!(missing, Ok(None));
///
/// let kept = guard_with(|| Err::<u8, _>("fatal"), |e| *e != "fatal");
/// assert_eq!(kept, Err("fatal"));
/// ```
pub fn guard_with<T, E>(
    task: impl FnOnce() -> Result<T, E>,
    should_guard: impl FnOnce(&E) -> bool,
) -> Result<Option<T>, E> {
    match task() {
        Ok(value) => Ok(Some(value)),
        Err(error) if should_guard(&error) => {
            tracing::trace!("guard: error suppressed");
            Ok(None)
        }
        Err(error) => Err(error),
    }
}

/// Awaits `future` and converts any error into `None`.
pub fn guard_async<F, T, E>(future: F) -> Guarded<F, fn(&E) -> bool>
where
    F: Future<Output = Result<T, E>>,
{
    fn always<E>(_: &E) -> bool {
        true
    }
    Guarded::new(future, always::<E>)
}

/// Awaits `future`; errors for which `should_guard` returns `true` become
/// `None`, others are returned unchanged.
pub fn guard_async_with<F, P, T, E>(future: F, should_guard: P) -> Guarded<F, P>
where
    F: Future<Output = Result<T, E>>,
    P: FnOnce(&E) -> bool,
{
    Guarded::new(future, should_guard)
}

pin_project! {
    /// Future returned by [`guard_async`] and [`guard_async_with`].
    #[must_use = "futures do nothing unless polled or .awaited"]
    pub struct Guarded<F, P> {
        #[pin]
        future: F,
        should_guard: Option<P>,
    }
}

impl<F, P> Guarded<F, P> {
    fn new(future: F, should_guard: P) -> Self {
        Guarded {
            future,
            should_guard: Some(should_guard),
        }
    }
}

impl<F, P, T, E> Future for Guarded<F, P>
where
    F: Future<Output = Result<T, E>>,
    P: FnOnce(&E) -> bool,
{
    type Output = Result<Option<T>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let result = match this.future.poll(cx) {
            Poll::Ready(result) => result,
            Poll::Pending => return Poll::Pending,
        };
        Poll::Ready(match result {
            Ok(value) => Ok(Some(value)),
            Err(error) => match this.should_guard.take().map(|p| p(&error)) {
                Some(false) => Err(error),
                _ => {
                    tracing::trace!("guard: error suppressed");
                    Ok(None)
                }
            },
        })
    }
}
