//! Cache the results of a function, optionally for a limited time.

use std::{
    collections::HashMap,
    hash::Hash,
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};

/// Configuration for [`Memo`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoOptions {
    /// How long a cached value stays valid. `None` keeps it forever.
    pub ttl: Option<Duration>,
}

impl MemoOptions {
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

struct Entry<V> {
    expires: Option<Instant>,
    value: V,
}

impl<V> Entry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires.is_none_or(|expires| expires > now)
    }
}

/// A memoized function from `&A` to `V`, keyed by `K`.
///
/// The wrapped function runs outside the cache lock, so two concurrent misses
/// on the same key may both compute; the later result wins.
///
/// # Example
/// ```
/// use asyncflow::{Memo, MemoOptions};
///
/// let square = Memo::new(|n: &u64| n * n, MemoOptions::default());
/// assert_eq!(square.call(&12), 144);
/// assert_eq!(square.len(), 1);
/// ```
pub struct Memo<A, K, V> {
    function: Box<dyn Fn(&A) -> V + Send + Sync>,
    key: Box<dyn Fn(&A) -> K + Send + Sync>,
    ttl: Option<Duration>,
    cache: Mutex<HashMap<K, Entry<V>>>,
}

impl<A, V> Memo<A, A, V>
where
    A: Hash + Eq + Clone + 'static,
    V: Clone,
{
    /// Memoizes `function`, using the argument itself as the cache key.
    pub fn new(function: impl Fn(&A) -> V + Send + Sync + 'static, options: MemoOptions) -> Self {
        Self::with_key(function, A::clone, options)
    }
}

impl<A, K, V> Memo<A, K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    /// Memoizes `function`, deriving the cache key with `key`.
    pub fn with_key(
        function: impl Fn(&A) -> V + Send + Sync + 'static,
        key: impl Fn(&A) -> K + Send + Sync + 'static,
        options: MemoOptions,
    ) -> Self {
        Self {
            function: Box::new(function),
            key: Box::new(key),
            ttl: options.ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached value for `args`, computing and storing it on a miss
    /// or when the cached entry has expired.
    pub fn call(&self, args: &A) -> V {
        let key = (self.key)(args);
        let now = Instant::now();
        if let Some(entry) = self.cache().get(&key) {
            if entry.is_fresh(now) {
                return entry.value.clone();
            }
        }

        let value = (self.function)(args);
        let now = Instant::now();
        let expires = self.ttl.map(|ttl| now + ttl);
        let mut cache = self.cache();
        if self.ttl.is_some() {
            cache.retain(|_, entry| entry.is_fresh(now));
        }
        cache.insert(
            key,
            Entry {
                expires,
                value: value.clone(),
            },
        );
        value
    }

    /// Number of cached entries. With a TTL, expired entries are dropped
    /// whenever a new value is stored.
    pub fn len(&self) -> usize {
        self.cache().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache().is_empty()
    }

    /// Drops every cached entry.
    pub fn clear(&self) {
        self.cache().clear();
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, HashMap<K, Entry<V>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
