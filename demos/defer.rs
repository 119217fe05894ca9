use asyncflow::{CleanupOptions, defer};
use std::time::Duration;

#[tokio::main]
async fn main() {
    let r = defer(|registrar| async move {
        println!("opening connection");
        registrar.register(|failure| {
            println!("closing connection (body failed: {})", failure.is_some());
            Ok(())
        });

        registrar.register_async(
            |failure| {
                let body_failed = failure.is_some();
                async move {
                    println!("flushing buffers (body failed: {body_failed})");
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Err("flush failed".to_string())
                }
            },
            CleanupOptions::rethrow(),
        );

        println!("doing work");
        Ok::<_, String>(42)
    })
    .await;

    println!("result: {r:?}");
}
