//! Process a sequence one element at a time, awaiting each step.
//!
//! Unlike [`parallel`](crate::parallel()), each step starts only after the
//! previous one has finished.

use crate::error::ReduceError;

/// Maps every item through `f` in order, awaiting each call before the next.
///
/// `f` receives the item and its index.
pub async fn map<I, U, F, Fut>(items: impl IntoIterator<Item = I>, mut f: F) -> Vec<U>
where
    F: FnMut(I, usize) -> Fut,
    Fut: Future<Output = U>,
{
    let items = items.into_iter();
    let mut out = Vec::with_capacity(items.size_hint().0);
    for (index, item) in items.enumerate() {
        out.push(f(item, index).await);
    }
    out
}

/// Folds `items` into `init` with an asynchronous reducer.
///
/// The reducer receives the accumulator, the item and the item's index.
pub async fn reduce<I, K, F, Fut>(items: impl IntoIterator<Item = I>, init: K, mut f: F) -> K
where
    F: FnMut(K, I, usize) -> Fut,
    Fut: Future<Output = K>,
{
    let mut acc = init;
    for (index, item) in items.into_iter().enumerate() {
        acc = f(acc, item, index).await;
    }
    acc
}

/// Folds `items` using the first item as the initial accumulator.
///
/// Indices passed to the reducer count the remaining items from 0.
///
/// # Errors
///
/// Returns [`ReduceError::Empty`] when `items` is empty.
///
/// # Example
/// ```
/// # futures::executor::block_on(async {
/// use asyncflow::sequential::reduce_first;
///
/// let sum = reduce_first(vec![1, 2, 3], |acc, n, _| async move { acc + n }).await;
/// assert_eq!(sum, Ok(6));
/// # });
/// ```
pub async fn reduce_first<T, F, Fut>(
    items: impl IntoIterator<Item = T>,
    f: F,
) -> Result<T, ReduceError>
where
    F: FnMut(T, T, usize) -> Fut,
    Fut: Future<Output = T>,
{
    let mut items = items.into_iter();
    let first = items.next().ok_or(ReduceError::Empty)?;
    Ok(reduce(items, first, f).await)
}
