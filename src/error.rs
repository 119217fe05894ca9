//! Error types shared by every primitive in the crate.
//!
//! A task can fail in two ways: it returns an error value, or it panics while
//! running. [`Failure`] captures both so that fan-out primitives can keep going
//! when a single task misbehaves. [`AggregateError`] bundles the failures of one
//! fan-out call.

use std::{any::Any, error::Error as StdError, fmt, slice};

use thiserror::Error;

/// Anything a task can "throw": its own error value, or a panic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Failure<E> {
    /// The task completed with `Err(E)`.
    #[error("{0}")]
    Error(E),

    /// The task panicked. Holds the panic message when it was a string.
    #[error("task panicked: {0}")]
    Panicked(String),
}

impl<E> Failure<E> {
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Box<dyn Any>".to_string()
        };
        Failure::Panicked(message)
    }

    /// Returns the task's own error, if this failure was not a panic.
    pub fn error(&self) -> Option<&E> {
        match self {
            Failure::Error(e) => Some(e),
            Failure::Panicked(_) => None,
        }
    }

    /// Consumes the failure and returns the task's own error, if any.
    pub fn into_error(self) -> Option<E> {
        match self {
            Failure::Error(e) => Some(e),
            Failure::Panicked(_) => None,
        }
    }

    /// Returns `true` if the task panicked.
    pub fn is_panic(&self) -> bool {
        matches!(self, Failure::Panicked(_))
    }
}

/// A composite error bundling every failure collected by one aggregation pass.
///
/// Produced by [`parallel`](crate::parallel()) and [`all`](crate::all()) when at
/// least one constituent operation failed. The errors keep the order in which
/// they were collected. The first error is exposed as the
/// [`source`](std::error::Error::source), so its trace is what diagnostics see.
#[derive(Clone, PartialEq, Eq)]
pub struct AggregateError<E> {
    errors: Vec<E>,
}

impl<E> AggregateError<E> {
    /// Creates an aggregate from the collected errors.
    pub fn new(errors: Vec<E>) -> Self {
        Self { errors }
    }

    /// Display name combining the type of the bundled errors.
    ///
    /// `AggregateError(Failure...)` when errors are present, `AggregateError(...)`
    /// for an empty aggregate.
    pub fn name(&self) -> String {
        let inner = if self.errors.is_empty() {
            ""
        } else {
            short_type_name::<E>()
        };
        format!("AggregateError({inner}...)")
    }

    /// The bundled errors in collection order.
    pub fn errors(&self) -> &[E] {
        &self.errors
    }

    pub fn first(&self) -> Option<&E> {
        self.errors.first()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, E> {
        self.errors.iter()
    }

    /// Consumes the aggregate and returns the bundled errors.
    pub fn into_errors(self) -> Vec<E> {
        self.errors
    }
}

// Strip module path and generic arguments: `asyncflow::error::Failure<&str>` -> `Failure`.
fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

impl<E> fmt::Display for AggregateError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AggregateError with {} errors", self.errors.len())
    }
}

impl<E: fmt::Debug> fmt::Debug for AggregateError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(&self.name())
            .field("errors", &self.errors)
            .finish()
    }
}

impl<E> StdError for AggregateError<E>
where
    E: StdError + 'static,
{
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.errors.first().map(|e| e as &(dyn StdError + 'static))
    }
}

impl<E> IntoIterator for AggregateError<E> {
    type Item = E;
    type IntoIter = std::vec::IntoIter<E>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a, E> IntoIterator for &'a AggregateError<E> {
    type Item = &'a E;
    type IntoIter = slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// Outcome of a single [`retry`](crate::retry()) attempt that did not succeed.
///
/// Returning `Retry` lets the controller try again; `Bail` ends the whole retry
/// sequence immediately. `From<E>` maps to `Retry`, so `?` inside a task retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Attempt<E> {
    #[error("attempt failed: {0}")]
    Retry(E),

    #[error("bailed: {0}")]
    Bail(E),
}

impl<E> From<E> for Attempt<E> {
    fn from(error: E) -> Self {
        Attempt::Retry(error)
    }
}

/// Terminal failure of a [`retry`](crate::retry()) call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetryError<E> {
    /// The task bailed; carries the value it bailed with.
    #[error("retry bailed: {0}")]
    Bailed(E),

    /// Every attempt failed; carries the last failure.
    #[error("retry exhausted after {attempts} attempts: {error}")]
    Exhausted { attempts: u32, error: Failure<E> },
}

impl<E> RetryError<E> {
    /// Returns the caller-visible error value, if it was not a panic.
    pub fn into_inner(self) -> Option<E> {
        match self {
            RetryError::Bailed(e) => Some(e),
            RetryError::Exhausted { error, .. } => error.into_error(),
        }
    }
}

/// Errors from the sequential [`reduce_first`](crate::sequential::reduce_first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReduceError {
    #[error("cannot reduce empty sequence with no initial value")]
    Empty,
}
