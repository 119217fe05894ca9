//! Convert a task's error-or-panic into an explicit [`Result`].
//!
//! [`tryit`] wraps a synchronous function and [`tryit_async`] wraps a function
//! returning a future. The choice between the two is made at the type level;
//! both produce `Result<T, Failure<E>>` and never unwind into the caller.

use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    pin::Pin,
    task::{Context, Poll},
};

use pin_project_lite::pin_project;

use crate::error::Failure;

/// Runs `task` once, turning `Err(e)` into [`Failure::Error`] and a panic into
/// [`Failure::Panicked`].
pub fn attempt<T, E>(task: impl FnOnce() -> Result<T, E>) -> Result<T, Failure<E>> {
    match catch_unwind(AssertUnwindSafe(task)) {
        Ok(result) => result.map_err(Failure::Error),
        Err(payload) => Err(Failure::from_panic(payload)),
    }
}

/// Wraps a synchronous task so that calling it never panics.
///
/// # Example
/// ```
/// use asyncflow::{Failure, tryit};
///
/// let parse = tryit(|s: &str| s.parse::<u8>());
/// assert_eq!(parse("7"), Ok(7));
/// assert!(matches!(parse("x"), Err(Failure::Error(_))));
/// ```
pub fn tryit<A, T, E, F>(task: F) -> impl Fn(A) -> Result<T, Failure<E>>
where
    F: Fn(A) -> Result<T, E>,
{
    move |args| attempt(|| task(args))
}

/// Wraps an asynchronous task so that the future it returns resolves to a
/// `Result<T, Failure<E>>` and never panics.
///
/// A panic raised while building the future is caught as well; the returned
/// [`TryIt`] then resolves immediately to that failure.
pub fn tryit_async<A, T, E, F, Fut>(task: F) -> impl Fn(A) -> TryIt<Fut>
where
    F: Fn(A) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    move |args| TryIt::start(|| task(args))
}

pin_project! {
    /// A future that settles its inner future into `Result<T, Failure<E>>`.
    ///
    /// Panics raised while polling the inner future are caught and reported as
    /// [`Failure::Panicked`]. Once the inner future has panicked it is never polled
    /// again.
    #[must_use = "futures do nothing unless polled or .awaited"]
    pub struct TryIt<F> {
        #[pin]
        future: Option<F>,
        early: Option<String>,
    }
}

impl<F> TryIt<F> {
    pub fn new(future: F) -> Self {
        TryIt {
            future: Some(future),
            early: None,
        }
    }

    // Builds the inner future, capturing a panic raised while doing so.
    pub(crate) fn start(make: impl FnOnce() -> F) -> Self {
        match catch_unwind(AssertUnwindSafe(make)) {
            Ok(future) => TryIt::new(future),
            Err(payload) => {
                let message = match Failure::<()>::from_panic(payload) {
                    Failure::Panicked(message) => message,
                    Failure::Error(()) => String::new(),
                };
                TryIt {
                    future: None,
                    early: Some(message),
                }
            }
        }
    }
}

impl<F, T, E> Future for TryIt<F>
where
    F: Future<Output = Result<T, E>>,
{
    type Output = Result<T, Failure<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();
        if let Some(message) = this.early.take() {
            return Poll::Ready(Err(Failure::Panicked(message)));
        }
        let Some(future) = this.future.as_mut().as_pin_mut() else {
            return Poll::Ready(Err(Failure::Panicked(
                "TryIt polled after completion".to_string(),
            )));
        };
        match catch_unwind(AssertUnwindSafe(|| future.poll(cx))) {
            Ok(Poll::Pending) => Poll::Pending,
            Ok(Poll::Ready(result)) => {
                this.future.set(None);
                Poll::Ready(result.map_err(Failure::Error))
            }
            Err(payload) => {
                this.future.set(None);
                Poll::Ready(Err(Failure::from_panic(payload)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;

    #[test]
    fn sync_success_and_error() {
        let halve = tryit(|n: u32| if n % 2 == 0 { Ok(n / 2) } else { Err("odd") });
        assert_eq!(halve(4), Ok(2));
        assert_eq!(halve(3), Err(Failure::Error("odd")));
    }

    #[test]
    fn sync_panic_is_caught() {
        let explode = tryit(|_: ()| -> Result<(), ()> { panic!("kaboom") });
        assert_eq!(explode(()), Err(Failure::Panicked("kaboom".into())));
    }

    #[test]
    fn async_success_and_error() {
        let check = tryit_async(|n: i32| async move {
            if n > 0 { Ok(n) } else { Err(format!("bad {n}")) }
        });
        assert_eq!(block_on(check(5)), Ok(5));
        assert_eq!(block_on(check(-1)), Err(Failure::Error("bad -1".into())));
    }

    #[test]
    fn async_panic_is_caught() {
        let fut = TryIt::new(async {
            if true {
                panic!("inside future");
            }
            Ok::<(), ()>(())
        });
        assert_eq!(block_on(fut), Err(Failure::Panicked("inside future".into())));
    }

    #[test]
    fn panic_while_building_future_is_caught() {
        let task = tryit_async(|_: ()| -> std::future::Ready<Result<(), ()>> {
            panic!("before future")
        });
        assert_eq!(block_on(task(())), Err(Failure::Panicked("before future".into())));
    }
}
