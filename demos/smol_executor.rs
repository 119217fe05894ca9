use asyncflow::{all, parallel, sleep};
use macro_rules_attribute::apply;
use smol::Timer;
use smol_macros::{Executor, main};
use std::time::Duration;

#[apply(main!)]
async fn main(ex: &Executor<'_>) {
    let background = ex.spawn(async {
        sleep(Duration::from_millis(200)).await;
        println!("background timer fired");
    });

    let squares = parallel(2, 1..=6u64, |n| async move {
        Timer::after(Duration::from_millis(20 * n)).await;
        println!("squared {n}");
        Ok::<_, ()>(n * n)
    })
    .await;
    println!("squares: {squares:?}");

    let settled = all(vec![
        ex.spawn(async { Ok::<_, &str>(1) }),
        ex.spawn(async { Err("second failed") }),
    ])
    .await;
    println!("settled: {settled:?}");

    background.await;
}
