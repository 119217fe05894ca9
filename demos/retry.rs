use asyncflow::{Attempt, RetryOptions, retry, retry::exponential};
use std::{
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

#[tokio::main]
async fn main() {
    let calls = Arc::new(AtomicU32::new(0));
    let calls_cl = Arc::clone(&calls);

    let options = RetryOptions::new()
        .with_times(5)
        .with_backoff(exponential(Duration::from_millis(50)));

    let r = retry(options, move |bail| {
        let n = calls_cl.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            println!("attempt {}", bail.attempt());
            match n {
                1 | 2 => Err(Attempt::Retry("connection refused")),
                _ => Ok("connected"),
            }
        }
    })
    .await;
    println!("{r:?} after {} calls", calls.load(Ordering::SeqCst));

    // Bail out on an error that will not go away.
    let r: Result<(), _> = retry(RetryOptions::default(), |bail| async move {
        println!("attempt {}", bail.attempt());
        Err(bail.with("invalid credentials"))
    })
    .await;
    println!("{r:?}");
}
