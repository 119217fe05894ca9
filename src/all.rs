//! Wait on a whole collection of futures without short-circuiting.
//!
//! [`all`] takes a sequence and [`all_keyed`] a keyed map. Both let every
//! future settle, then either return every value or fail with an
//! [`AggregateError`] listing each failure.
//!
//! Failures are listed in the order they were observed to settle. When several
//! futures fail concurrently that order depends on scheduling and is not
//! deterministic.

use std::{collections::HashMap, hash::Hash};

use futures::{StreamExt, stream::FuturesUnordered};

use crate::{
    error::{AggregateError, Failure},
    tryit::TryIt,
};

// Drives every future to completion, tagging each outcome with its key.
async fn settle<K, T, E, F>(
    entries: impl IntoIterator<Item = (K, F)>,
) -> (Vec<(K, T)>, Vec<Failure<E>>)
where
    F: Future<Output = Result<T, E>>,
{
    let mut pending: FuturesUnordered<_> = entries
        .into_iter()
        .map(|(key, future)| async move { (key, TryIt::new(future).await) })
        .collect();

    let mut values = Vec::with_capacity(pending.len());
    let mut errors = Vec::new();
    while let Some((key, result)) = pending.next().await {
        match result {
            Ok(value) => values.push((key, value)),
            Err(failure) => errors.push(failure),
        }
    }
    (values, errors)
}

/// Awaits every future in `futures` and returns their values in positional
/// order.
///
/// # Errors
///
/// Fails with an [`AggregateError`] if at least one future failed. All futures
/// are still driven to completion first.
///
/// # Example
/// ```
/// # futures::executor::block_on(async {
/// use futures::future::ready;
///
/// let values = asyncflow::all(vec![ready(Ok::<_, ()>(1)), ready(Ok(2))]).await;
/// assert_eq!(values.unwrap(), vec![1, 2]);
/// # });
/// ```
pub async fn all<T, E, F>(
    futures: impl IntoIterator<Item = F>,
) -> Result<Vec<T>, AggregateError<Failure<E>>>
where
    F: Future<Output = Result<T, E>>,
{
    let (mut values, errors) = settle(futures.into_iter().enumerate()).await;
    if !errors.is_empty() {
        tracing::debug!(failed = errors.len(), "all: collection failed");
        return Err(AggregateError::new(errors));
    }
    values.sort_by_key(|(index, _)| *index);
    Ok(values.into_iter().map(|(_, value)| value).collect())
}

/// Awaits every future in a keyed map and returns a map from the same keys to
/// their values.
///
/// # Errors
///
/// Fails with an [`AggregateError`] if at least one future failed.
pub async fn all_keyed<K, T, E, F>(
    futures: impl IntoIterator<Item = (K, F)>,
) -> Result<HashMap<K, T>, AggregateError<Failure<E>>>
where
    K: Eq + Hash,
    F: Future<Output = Result<T, E>>,
{
    let (values, errors) = settle(futures).await;
    if !errors.is_empty() {
        tracing::debug!(failed = errors.len(), "all_keyed: collection failed");
        return Err(AggregateError::new(errors));
    }
    Ok(values.into_iter().collect())
}
