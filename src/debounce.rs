//! Delay a callback until calls stop arriving.
//!
//! Each call to a [`Debounce`] supersedes the previously scheduled one and
//! schedules the callback `delay` from now. After [`Debounce::cancel`] the
//! wrapper stops debouncing and forwards every call straight to the callback.

use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use crate::timing::schedule;

/// Configuration for [`Debounce`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebounceOptions {
    pub delay: Duration,
}

impl DebounceOptions {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

struct DebounceState {
    active: bool,
    // Bumped on every scheduled call; a timer only fires if it is still current.
    generation: u64,
    pending: bool,
}

struct Inner<A> {
    delay: Duration,
    callback: Box<dyn Fn(A) + Send + Sync>,
    state: Mutex<DebounceState>,
}

impl<A> Inner<A> {
    fn state(&self) -> std::sync::MutexGuard<'_, DebounceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A debounced callback taking arguments of type `A`.
///
/// Clones share the same timer state. Scheduled callbacks run on the timer
/// pool.
///
/// # Example
/// ```
/// use std::{sync::{Arc, atomic::{AtomicU32, Ordering}}, time::Duration};
/// use asyncflow::{Debounce, DebounceOptions};
///
/// let calls = Arc::new(AtomicU32::new(0));
/// let counter = Arc::clone(&calls);
/// let debounced = Debounce::new(DebounceOptions::new(Duration::from_millis(20)), move |_: ()| {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// debounced.call(());
/// debounced.call(());
/// std::thread::sleep(Duration::from_millis(100));
/// assert_eq!(calls.load(Ordering::SeqCst), 1);
/// ```
pub struct Debounce<A> {
    inner: Arc<Inner<A>>,
}

impl<A> Clone for Debounce<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: Send + 'static> Debounce<A> {
    pub fn new(options: DebounceOptions, callback: impl Fn(A) + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                delay: options.delay,
                callback: Box::new(callback),
                state: Mutex::new(DebounceState {
                    active: true,
                    generation: 0,
                    pending: false,
                }),
            }),
        }
    }

    /// Schedules the callback with `args`, replacing any pending call.
    ///
    /// Once cancelled, the callback runs immediately instead.
    pub fn call(&self, args: A) {
        let generation = {
            let mut state = self.inner.state();
            if !state.active {
                drop(state);
                (self.inner.callback)(args);
                return;
            }
            state.generation = state.generation.wrapping_add(1);
            state.pending = true;
            state.generation
        };

        let inner = Arc::clone(&self.inner);
        schedule(self.inner.delay, move || {
            let fire = {
                let mut state = inner.state();
                if state.generation != generation {
                    return;
                }
                state.pending = false;
                state.active
            };
            if fire {
                tracing::trace!(generation, "debounce: firing");
                (inner.callback)(args);
            }
        });
    }

    /// Stops debouncing. A call that is already scheduled will not fire, and
    /// later calls run the callback immediately.
    pub fn cancel(&self) {
        self.inner.state().active = false;
    }

    /// Returns `true` while a scheduled call has not yet come due.
    pub fn is_pending(&self) -> bool {
        self.inner.state().pending
    }

    /// Runs the callback with `args` right now, ignoring any timer.
    pub fn flush(&self, args: A) {
        (self.inner.callback)(args);
    }
}

impl<A> fmt::Debug for Debounce<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state();
        f.debug_struct("Debounce")
            .field("delay", &self.inner.delay)
            .field("active", &state.active)
            .field("pending", &state.pending)
            .finish()
    }
}
