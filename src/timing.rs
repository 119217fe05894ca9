//! Executor-agnostic timers.
//!
//! Timers are backed by a lazily created thread pool: a pending timer occupies a
//! pool thread that sleeps until the deadline and then wakes the waiting task or
//! runs the scheduled callback. This keeps every primitive in the crate usable
//! under tokio, smol or a plain `block_on` without depending on a runtime's
//! timer driver.

use std::{
    pin::Pin,
    sync::{Arc, Mutex, OnceLock, PoisonError},
    task::{Context, Poll, Waker},
    time::{Duration, Instant},
};

use futures::executor::{ThreadPool, ThreadPoolBuilder};
use pin_project_lite::pin_project;

const TIMER_POOL_SIZE: usize = 64;

static TIMER_POOL: OnceLock<Option<ThreadPool>> = OnceLock::new();

// Runs `job` on the timer pool, or on a fresh thread if the pool could not be built.
fn spawn_timer(job: impl FnOnce() + Send + 'static) {
    let pool = TIMER_POOL.get_or_init(|| {
        ThreadPoolBuilder::new()
            .pool_size(TIMER_POOL_SIZE)
            .name_prefix("asyncflow-timer-")
            .create()
            .map_err(|e| tracing::error!(error = %e, "timer pool creation failed"))
            .ok()
    });
    match pool {
        Some(pool) => pool.spawn_ok(async move { job() }),
        None => {
            std::thread::spawn(job);
        }
    }
}

/// Runs `callback` on the timer pool once `after` has elapsed.
///
/// The callback runs on a timer thread, not on the caller's executor.
pub fn schedule(after: Duration, callback: impl FnOnce() + Send + 'static) {
    tracing::trace!(?after, "scheduling timer callback");
    // Measured from the call, not from when a pool thread picks the job up.
    let deadline = Instant::now() + after;
    spawn_timer(move || {
        std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
        callback();
    });
}

#[derive(Default)]
struct SleepState {
    fired: bool,
    waker: Option<Waker>,
}

/// A future that completes once its deadline has passed.
///
/// Created by [`sleep`]. The deadline is fixed when the `Sleep` is created, not
/// when it is first polled.
#[must_use = "futures do nothing unless polled or .awaited"]
pub struct Sleep {
    deadline: Instant,
    state: Option<Arc<Mutex<SleepState>>>,
}

/// Waits until `duration` has elapsed.
///
/// ```
/// # futures::executor::block_on(async {
/// asyncflow::sleep(std::time::Duration::from_millis(5)).await;
/// # });
/// ```
pub fn sleep(duration: Duration) -> Sleep {
    Sleep {
        deadline: Instant::now() + duration,
        state: None,
    }
}

impl Sleep {
    /// The instant at which this future completes.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Returns `true` once the deadline has passed.
    pub fn is_elapsed(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.is_elapsed() {
            return Poll::Ready(());
        }

        match &self.state {
            Some(state) => {
                let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                if state.fired {
                    return Poll::Ready(());
                }
                // The task may have moved since the last poll.
                match &state.waker {
                    Some(w) if w.will_wake(cx.waker()) => {}
                    _ => state.waker = Some(cx.waker().clone()),
                }
            }
            None => {
                let state = Arc::new(Mutex::new(SleepState {
                    fired: false,
                    waker: Some(cx.waker().clone()),
                }));
                let shared = Arc::clone(&state);
                let deadline = self.deadline;
                spawn_timer(move || {
                    std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
                    let waker = {
                        let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
                        state.fired = true;
                        state.waker.take()
                    };
                    if let Some(waker) = waker {
                        waker.wake();
                    }
                });
                self.state = Some(state);
            }
        }
        Poll::Pending
    }
}

pin_project! {
    /// A future that begins polling its inner future only after a delay.
    ///
    /// The delay is counted from the first poll of the `Delay` itself. After it has
    /// elapsed every poll is forwarded to the inner future.
    ///
    /// A more convenient way to construct this is via the
    /// [`delay()`](crate::task_ext::TaskExt::delay) operator.
    #[must_use = "futures do nothing unless polled or .awaited"]
    pub struct Delay<F> {
        #[pin]
        future: F,
        delay: Duration,
        sleep: Option<Sleep>,
        elapsed: bool,
    }
}

impl<F> Delay<F> {
    pub fn new(future: F, delay: Duration) -> Self {
        Delay {
            future,
            delay,
            sleep: None,
            elapsed: false,
        }
    }

    /// Consumes the `Delay` and returns the inner future.
    pub fn inner(self) -> F {
        self.future
    }
}

impl<F: Future> Future for Delay<F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        if !*this.elapsed {
            let delay = *this.delay;
            let sleep = this.sleep.get_or_insert_with(|| sleep(delay));
            if Pin::new(sleep).poll(cx).is_pending() {
                return Poll::Pending;
            }
            *this.elapsed = true;
            this.sleep.take();
        }
        this.future.poll(cx)
    }
}
