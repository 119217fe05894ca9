//! Bounded-concurrency fan-out over a worklist.
//!
//! [`parallel`] runs one task per input with at most `limit` tasks in flight.
//! Workers are cooperative futures joined inside the caller's future, so no
//! executor-specific spawning takes place. Every input is attempted; failures
//! are collected and reported together once all workers have finished.

use std::sync::{Mutex, PoisonError};

use futures::future::join_all;

use crate::{
    error::{AggregateError, Failure},
    tryit::TryIt,
};

// An input tagged with its position.
struct WorkItem<I> {
    index: usize,
    item: I,
}

// The settled outcome of one `WorkItem`.
struct WorkResult<T, E> {
    index: usize,
    result: Result<T, Failure<E>>,
}

// Pending inputs shared by all workers. A claim removes the item under the lock,
// so no two workers ever receive the same one.
struct Worklist<I> {
    pending: Mutex<Vec<WorkItem<I>>>,
}

impl<I> Worklist<I> {
    fn new(items: impl IntoIterator<Item = I>) -> Self {
        let pending = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| WorkItem { index, item })
            .collect();
        Self {
            pending: Mutex::new(pending),
        }
    }

    fn len(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    // Claims from the tail; processing order is not significant.
    fn claim(&self) -> Option<WorkItem<I>> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
    }
}

/// Runs `task` over `items` with at most `limit` tasks in flight.
///
/// Results are returned in input order regardless of completion order. If any
/// task fails (returns `Err` or panics), every other input is still attempted and
/// the call then fails with an [`AggregateError`] holding each failure in
/// ascending input order; no successful values are returned in that case.
///
/// A `limit` of zero is treated as one.
///
/// # Example
/// ```
/// # futures::executor::block_on(async {
/// let doubled = asyncflow::parallel(2, vec![1, 2, 3], |n| async move {
///     Ok::<_, ()>(n * 2)
/// })
/// .await;
/// assert_eq!(doubled.unwrap(), vec![2, 4, 6]);
/// # });
/// ```
pub async fn parallel<I, T, E, F, Fut>(
    limit: usize,
    items: impl IntoIterator<Item = I>,
    task: F,
) -> Result<Vec<T>, AggregateError<Failure<E>>>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let work = Worklist::new(items);
    let total = work.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    let limit = if limit == 0 {
        tracing::warn!("parallel called with limit 0, running with limit 1");
        1
    } else {
        limit
    };
    let workers = limit.min(total);
    tracing::debug!(total, limit, workers, "starting parallel run");

    let work = &work;
    let task = &task;
    let batches = join_all((0..workers).map(|worker| async move {
        let mut results = Vec::new();
        while let Some(WorkItem { index, item }) = work.claim() {
            let result = TryIt::start(|| task(item)).await;
            if result.is_err() {
                tracing::trace!(worker, index, "task failed");
            }
            results.push(WorkResult { index, result });
        }
        tracing::trace!(worker, processed = results.len(), "worker finished");
        results
    }))
    .await;

    let mut settled: Vec<WorkResult<T, E>> = batches.into_iter().flatten().collect();
    settled.sort_by_key(|r| r.index);

    let (values, errors): (Vec<_>, Vec<_>) = settled
        .into_iter()
        .map(|r| r.result)
        .partition(Result::is_ok);

    if !errors.is_empty() {
        tracing::debug!(failed = errors.len(), total, "parallel run failed");
        return Err(AggregateError::new(
            errors.into_iter().filter_map(Result::err).collect(),
        ));
    }
    Ok(values.into_iter().filter_map(Result::ok).collect())
}
