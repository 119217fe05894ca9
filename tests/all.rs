mod common;

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use asyncflow::{Failure, all, all_keyed};
use futures::future::ready;

use common::after;

#[tokio::test(flavor = "multi_thread")]
async fn all_returns_values_in_position_order() {
    common::init_tracing();

    let r = all(vec![
        after(30, Ok::<_, &str>(1)),
        after(0, Ok(2)),
        after(15, Ok(3)),
    ])
    .await;

    assert_eq!(r, Ok(vec![1, 2, 3]));
}

#[tokio::test(flavor = "multi_thread")]
async fn all_of_ready_values() {
    let r = all(vec![ready(Ok::<_, ()>(1)), ready(Ok(2))]).await;
    assert_eq!(r, Ok(vec![1, 2]));
}

#[tokio::test(flavor = "multi_thread")]
async fn all_keyed_returns_same_keys() {
    let mut futures = HashMap::new();
    futures.insert("a", after(10, Ok::<_, &str>(1)));
    futures.insert("b", after(0, Ok(2)));

    let r = all_keyed(futures).await.expect("All futures succeed");

    assert_eq!(r.len(), 2);
    assert_eq!(r["a"], 1);
    assert_eq!(r["b"], 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn all_keyed_single_failure_raises_aggregate() {
    let r = all_keyed([("a", after(0, Ok(1))), ("b", after(0, Err("e")))]).await;

    let aggregate = r.expect_err("One future failed");
    assert_eq!(aggregate.errors(), &[Failure::Error("e")]);
}

#[tokio::test(flavor = "multi_thread")]
async fn all_waits_for_every_future_before_failing() {
    let slow_done = Arc::new(AtomicBool::new(false));
    let slow_done_cl = Arc::clone(&slow_done);

    let slow = async move {
        tokio::time::sleep(Duration::from_millis(40)).await;
        slow_done_cl.store(true, Ordering::SeqCst);
        Ok::<u32, &str>(1)
    };
    let failing = async { Err::<u32, &str>("fast failure") };

    // Two different future types: box them into one collection.
    let futures: Vec<std::pin::Pin<Box<dyn Future<Output = Result<u32, &str>> + Send>>> =
        vec![Box::pin(slow), Box::pin(failing)];
    let r = all(futures).await;

    assert!(r.is_err());
    assert!(
        slow_done.load(Ordering::SeqCst),
        "Slow future should have settled before the aggregate was raised"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn all_collects_every_failure() {
    let r = all(vec![
        after(20, Err::<u8, _>("late")),
        after(0, Ok(1)),
        after(0, Err("early")),
    ])
    .await;

    let mut errors: Vec<_> = r
        .expect_err("Two futures failed")
        .into_iter()
        .filter_map(Failure::into_error)
        .collect();
    // Settlement order is not guaranteed; compare as a set.
    errors.sort_unstable();
    assert_eq!(errors, vec!["early", "late"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn all_of_empty_collections() {
    let empty: Vec<futures::future::Ready<Result<u8, ()>>> = Vec::new();
    assert_eq!(all(empty).await, Ok(vec![]));

    let empty: HashMap<String, futures::future::Ready<Result<u8, ()>>> = HashMap::new();
    assert_eq!(all_keyed(empty).await, Ok(HashMap::new()));
}
