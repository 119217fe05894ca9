//! Limit a callback to at most one call per interval.

use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use crate::timing::schedule;

/// Configuration for [`Throttle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThrottleOptions {
    pub interval: Duration,
}

impl ThrottleOptions {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

struct Inner<A> {
    interval: Duration,
    callback: Box<dyn Fn(A) + Send + Sync>,
    throttled: Mutex<bool>,
}

/// A throttled callback taking arguments of type `A`.
///
/// The first call while ready runs the callback immediately and starts an
/// `interval` long window in which further calls are dropped.
pub struct Throttle<A> {
    inner: Arc<Inner<A>>,
}

impl<A> Clone for Throttle<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A> Throttle<A> {
    pub fn new(options: ThrottleOptions, callback: impl Fn(A) + Send + Sync + 'static) -> Self
    where
        A: 'static,
    {
        Self {
            inner: Arc::new(Inner {
                interval: options.interval,
                callback: Box::new(callback),
                throttled: Mutex::new(false),
            }),
        }
    }

    /// Runs the callback unless a previous call is still inside its window.
    pub fn call(&self, args: A)
    where
        A: 'static,
    {
        {
            let mut throttled = self.inner.throttled.lock().unwrap_or_else(PoisonError::into_inner);
            if *throttled {
                tracing::trace!("throttle: call dropped");
                return;
            }
            *throttled = true;
        }

        let inner = Arc::clone(&self.inner);
        schedule(self.inner.interval, move || {
            *inner.throttled.lock().unwrap_or_else(PoisonError::into_inner) = false;
        });
        (self.inner.callback)(args);
    }

    /// Returns `true` while calls are being dropped.
    pub fn is_throttled(&self) -> bool {
        *self.inner.throttled.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<A> fmt::Debug for Throttle<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttle")
            .field("interval", &self.inner.interval)
            .field("throttled", &self.is_throttled())
            .finish()
    }
}
