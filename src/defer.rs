//! Run a body with cleanup callbacks that always run afterwards.
//!
//! The body receives a [`Registrar`] and may register any number of cleanups
//! while it runs. Once the body has finished, successfully or not, every
//! cleanup runs exactly once in registration order. A failing cleanup never
//! prevents later ones from running.
//!
//! The call ends with the error of the last failing cleanup registered with
//! `rethrow: true`, if any; otherwise with the body's own outcome.

use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt};

use crate::{
    error::Failure,
    tryit::{TryIt, attempt},
};

type SyncCleanup<E> = Box<dyn FnOnce(Option<&Failure<E>>) -> Result<(), E> + Send>;
type AsyncCleanup<E> =
    Box<dyn FnOnce(Option<&Failure<E>>) -> BoxFuture<'static, Result<(), E>> + Send>;

enum Cleanup<E> {
    Sync(SyncCleanup<E>),
    Async(AsyncCleanup<E>),
}

struct Registration<E> {
    cleanup: Cleanup<E>,
    rethrow: bool,
}

/// Options for a single cleanup registration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CleanupOptions {
    /// If the cleanup fails, its error replaces the outcome of the whole call.
    pub rethrow: bool,
}

impl CleanupOptions {
    #[must_use]
    pub fn rethrow() -> Self {
        Self { rethrow: true }
    }
}

struct Registry<E> {
    registrations: Vec<Registration<E>>,
    closed: bool,
}

/// Handle used by a [`defer`] body to register cleanups.
///
/// Cloning the handle is cheap; every clone appends to the same list.
/// Registrations made after the body has finished are ignored.
pub struct Registrar<E> {
    registry: Arc<Mutex<Registry<E>>>,
}

impl<E> Clone for Registrar<E> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<E: Send + 'static> Registrar<E> {
    fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                registrations: Vec::new(),
                closed: false,
            })),
        }
    }

    fn push(&self, registration: Registration<E>) {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        if registry.closed {
            tracing::warn!("defer: cleanup registered after the body finished, ignoring");
            return;
        }
        registry.registrations.push(registration);
    }

    // Stops accepting registrations and hands back everything registered so far.
    fn close(&self) -> Vec<Registration<E>> {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        registry.closed = true;
        std::mem::take(&mut registry.registrations)
    }

    /// Registers a cleanup whose failure is ignored.
    ///
    /// The callback receives the body's failure, if the body failed.
    pub fn register(
        &self,
        cleanup: impl FnOnce(Option<&Failure<E>>) -> Result<(), E> + Send + 'static,
    ) {
        self.register_with(cleanup, CleanupOptions::default());
    }

    /// Registers a cleanup with explicit [`CleanupOptions`].
    pub fn register_with(
        &self,
        cleanup: impl FnOnce(Option<&Failure<E>>) -> Result<(), E> + Send + 'static,
        options: CleanupOptions,
    ) {
        self.push(Registration {
            cleanup: Cleanup::Sync(Box::new(cleanup)),
            rethrow: options.rethrow,
        });
    }

    /// Registers an asynchronous cleanup, awaited in registration order.
    ///
    /// Like [`register`](Self::register), the callback receives the body's
    /// failure. The returned future must own what it needs from it.
    pub fn register_async<Fut>(
        &self,
        cleanup: impl FnOnce(Option<&Failure<E>>) -> Fut + Send + 'static,
        options: CleanupOptions,
    ) where
        Fut: Future<Output = Result<(), E>> + Send + 'static,
    {
        let cleanup = move |failure: Option<&Failure<E>>| cleanup(failure).boxed();
        self.push(Registration {
            cleanup: Cleanup::Async(Box::new(cleanup)),
            rethrow: options.rethrow,
        });
    }
}

/// Runs `body`, then every cleanup it registered.
///
/// # Errors
///
/// Returns the failure of the last rethrowing cleanup that failed, or else the
/// body's own failure. Panics in the body or in a cleanup are caught and
/// reported as [`Failure::Panicked`].
///
/// # Example
/// ```
/// use asyncflow::{CleanupOptions, Failure, defer};
///
/// # futures::executor::block_on(async {
/// let result = defer(|registrar| async move {
///     registrar.register_with(|_| Err("cleanup-fail"), CleanupOptions::rethrow());
///     Ok::<_, &str>("ok")
/// })
/// .await;
/// assert_eq!(result, Err(Failure::Error("cleanup-fail")));
/// # });
/// ```
pub async fn defer<T, E, F, Fut>(body: F) -> Result<T, Failure<E>>
where
    E: Send + 'static,
    F: FnOnce(Registrar<E>) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let registrar = Registrar::new();
    let outcome = TryIt::start(|| body(registrar.clone())).await;
    let registrations = registrar.close();
    tracing::debug!(
        cleanups = registrations.len(),
        body_failed = outcome.is_err(),
        "defer: running cleanups"
    );

    let mut rethrown = None;
    for (position, Registration { cleanup, rethrow }) in registrations.into_iter().enumerate() {
        let result = match cleanup {
            Cleanup::Sync(cleanup) => attempt(|| cleanup(outcome.as_ref().err())),
            Cleanup::Async(cleanup) => TryIt::start(|| cleanup(outcome.as_ref().err())).await,
        };
        if let Err(failure) = result {
            tracing::trace!(position, rethrow, "defer: cleanup failed");
            if rethrow {
                rethrown = Some(failure);
            }
        }
    }

    match rethrown {
        Some(failure) => Err(failure),
        None => outcome,
    }
}
