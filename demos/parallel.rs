use asyncflow::parallel;
use std::time::Duration;

async fn fetch(id: u64) -> Result<String, String> {
    println!("fetching {id}");
    tokio::time::sleep(Duration::from_millis(100 * (5 - id))).await;
    if id == 3 {
        return Err(format!("user {id} not found"));
    }
    Ok(format!("user-{id}"))
}

#[tokio::main]
async fn main() {
    // At most two fetches in flight at once.
    match parallel(2, 1..=4, fetch).await {
        Ok(users) => println!("users: {users:?}"),
        Err(aggregate) => {
            println!("{aggregate}");
            for failure in &aggregate {
                println!("  - {failure}");
            }
        }
    }

    let doubled = parallel(3, vec![1, 2, 3, 4, 5], |n| async move { Ok::<_, ()>(n * 2) }).await;
    println!("doubled: {doubled:?}");
}
