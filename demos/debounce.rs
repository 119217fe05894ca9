use asyncflow::{Debounce, DebounceOptions, Throttle, ThrottleOptions};
use std::time::Duration;

#[tokio::main]
async fn main() {
    let search = Debounce::new(DebounceOptions::new(Duration::from_millis(150)), |query: String| {
        println!("searching for {query:?}");
    });

    // Only the final keystroke triggers a search.
    for query in ["r", "ru", "rus", "rust"] {
        search.call(query.to_string());
        tokio::time::sleep(Duration::from_millis(40)).await;
    }
    tokio::time::sleep(Duration::from_millis(300)).await;

    let resize = Throttle::new(ThrottleOptions::new(Duration::from_millis(100)), |width: u32| {
        println!("resized to {width}");
    });

    for width in (800..1000).step_by(20) {
        resize.call(width);
        tokio::time::sleep(Duration::from_millis(30)).await;
    }
}
