mod common;

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use asyncflow::{CleanupOptions, Failure, defer};

type Log = Arc<Mutex<Vec<String>>>;

fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn push(log: &Log, entry: impl Into<String>) {
    log.lock().unwrap().push(entry.into());
}

fn explode() -> Result<(), ()> {
    panic!("body exploded");
}

fn exploding_cleanup(_: Option<&Failure<&'static str>>) -> Result<(), &'static str> {
    panic!("cleanup exploded");
}

#[tokio::test(flavor = "multi_thread")]
async fn defer_runs_cleanups_in_registration_order() {
    common::init_tracing();
    let events = log();
    let events_cl = Arc::clone(&events);

    let r = defer(move |registrar| async move {
        for name in ["first", "second", "third"] {
            let events = Arc::clone(&events_cl);
            registrar.register(move |_| {
                push(&events, name);
                Ok::<_, ()>(())
            });
        }
        push(&events_cl, "body");
        Ok("done")
    })
    .await;

    assert_eq!(r, Ok("done"));
    assert_eq!(*events.lock().unwrap(), vec!["body", "first", "second", "third"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn defer_runs_cleanups_after_body_error() {
    let events = log();
    let events_cl = Arc::clone(&events);

    let r: Result<(), _> = defer(move |registrar| async move {
        let events = Arc::clone(&events_cl);
        registrar.register(move |_| {
            push(&events, "cleanup");
            Ok(())
        });
        Err("body failed")
    })
    .await;

    assert_eq!(r, Err(Failure::Error("body failed")));
    assert_eq!(*events.lock().unwrap(), vec!["cleanup"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn defer_rethrowing_cleanup_replaces_success() {
    let r = defer(|registrar| async move {
        registrar.register_with(|_| Err("cleanup-fail"), CleanupOptions::rethrow());
        Ok::<_, &str>("ok")
    })
    .await;

    assert_eq!(r, Err(Failure::Error("cleanup-fail")));
}

#[tokio::test(flavor = "multi_thread")]
async fn defer_silent_cleanup_failure_is_ignored() {
    let r = defer(|registrar| async move {
        registrar.register(|_| Err("cleanup-fail"));
        Ok::<_, &str>("ok")
    })
    .await;

    assert_eq!(r, Ok("ok"));
}

#[tokio::test(flavor = "multi_thread")]
async fn defer_rethrowing_cleanup_replaces_body_error() {
    let r: Result<(), _> = defer(|registrar| async move {
        registrar.register_with(|_| Err("cleanup-fail"), CleanupOptions::rethrow());
        Err("body-fail")
    })
    .await;

    assert_eq!(r, Err(Failure::Error("cleanup-fail")));
}

#[tokio::test(flavor = "multi_thread")]
async fn defer_last_rethrowing_failure_wins() {
    let events = log();
    let events_cl = Arc::clone(&events);

    let r = defer(move |registrar| async move {
        registrar.register_with(|_| Err("first"), CleanupOptions::rethrow());
        registrar.register(|_| Err("silent"));
        registrar.register_with(|_| Err("second"), CleanupOptions::rethrow());
        let events = Arc::clone(&events_cl);
        registrar.register(move |_| {
            push(&events, "last ran");
            Ok(())
        });
        Ok::<_, &str>(())
    })
    .await;

    assert_eq!(r, Err(Failure::Error("second")));
    assert_eq!(
        *events.lock().unwrap(),
        vec!["last ran"],
        "Failing cleanups must not stop later ones"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn defer_panicking_cleanup_does_not_stop_later_ones() {
    let events = log();
    let events_cl = Arc::clone(&events);

    let r = defer(move |registrar| async move {
        registrar.register(exploding_cleanup);
        let events = Arc::clone(&events_cl);
        registrar.register(move |_| {
            push(&events, "after panic");
            Ok(())
        });
        Ok::<_, &str>("ok")
    })
    .await;

    assert_eq!(r, Ok("ok"), "Silent cleanup panic must not change the outcome");
    assert_eq!(*events.lock().unwrap(), vec!["after panic"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn defer_rethrowing_cleanup_panic_surfaces() {
    let events = log();
    let events_cl = Arc::clone(&events);

    let r = defer(move |registrar| async move {
        registrar.register_with(exploding_cleanup, CleanupOptions::rethrow());
        let events = Arc::clone(&events_cl);
        registrar.register(move |_| {
            push(&events, "after panic");
            Ok(())
        });
        Ok::<_, &str>("ok")
    })
    .await;

    assert_eq!(r, Err(Failure::Panicked("cleanup exploded".to_string())));
    assert_eq!(*events.lock().unwrap(), vec!["after panic"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn defer_async_cleanup_sees_body_failure() {
    let seen = Arc::new(Mutex::new(None));
    let seen_cl = Arc::clone(&seen);

    let r: Result<(), _> = defer(move |registrar| async move {
        registrar.register_async(
            move |failure: Option<&Failure<&'static str>>| {
                let message = failure.map(ToString::to_string);
                async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    *seen_cl.lock().unwrap() = message;
                    Ok(())
                }
            },
            CleanupOptions::default(),
        );
        Err("disk full")
    })
    .await;

    assert_eq!(r, Err(Failure::Error("disk full")));
    assert_eq!(seen.lock().unwrap().as_deref(), Some("disk full"));
}

#[tokio::test(flavor = "multi_thread")]
async fn defer_cleanup_sees_body_failure() {
    let seen = Arc::new(Mutex::new(None));
    let seen_cl = Arc::clone(&seen);

    let r: Result<(), _> = defer(move |registrar| async move {
        registrar.register(move |failure: Option<&Failure<String>>| {
            *seen_cl.lock().unwrap() = failure.map(ToString::to_string);
            Ok(())
        });
        Err("connection reset".to_string())
    })
    .await;

    assert!(r.is_err());
    assert_eq!(seen.lock().unwrap().as_deref(), Some("connection reset"));
}

#[tokio::test(flavor = "multi_thread")]
async fn defer_awaits_async_cleanups_in_order() {
    let events = log();
    let events_cl = Arc::clone(&events);

    let r = defer(move |registrar| async move {
        let slow = Arc::clone(&events_cl);
        registrar.register_async(
            move |_| async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                push(&slow, "async");
                Ok(())
            },
            CleanupOptions::default(),
        );
        let fast = Arc::clone(&events_cl);
        registrar.register(move |_| {
            push(&fast, "sync");
            Ok(())
        });
        Ok::<_, ()>(1)
    })
    .await;

    assert_eq!(r, Ok(1));
    assert_eq!(*events.lock().unwrap(), vec!["async", "sync"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn defer_async_cleanup_can_rethrow() {
    let r = defer(|registrar| async move {
        registrar.register_async(|_| async { Err("flush failed") }, CleanupOptions::rethrow());
        Ok::<_, &str>(())
    })
    .await;

    assert_eq!(r, Err(Failure::Error("flush failed")));
}

#[tokio::test(flavor = "multi_thread")]
async fn defer_catches_body_panic() {
    let events = log();
    let events_cl = Arc::clone(&events);

    let r: Result<(), Failure<()>> = defer(move |registrar| async move {
        registrar.register(move |failure| {
            push(&events_cl, format!("panicked: {}", failure.is_some_and(Failure::is_panic)));
            Ok(())
        });
        explode()
    })
    .await;

    assert_eq!(r, Err(Failure::Panicked("body exploded".to_string())));
    assert_eq!(*events.lock().unwrap(), vec!["panicked: true"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn defer_registration_after_body_is_ignored() {
    let leaked = Arc::new(Mutex::new(None));
    let leaked_cl = Arc::clone(&leaked);

    let r = defer(move |registrar| async move {
        *leaked_cl.lock().unwrap() = Some(registrar.clone());
        Ok::<_, &str>(())
    })
    .await;
    assert_eq!(r, Ok(()));

    let registrar = leaked.lock().unwrap().take().expect("Registrar was stored");
    // Nothing observable should happen; the registration is dropped.
    registrar.register(|_| Err("never runs"));
}
