use anyhow::Result;

use memofee_core::feed::feed_id_for_url;
use memofee_core::Coordinator;

pub async fn run(coordinator: &Coordinator, url: &str) -> Result<()> {
    println!("Subscribing to feed: {}", url);

    let state = match coordinator.add_feed(url).await {
        Ok(state) => state,
        Err(e) if e.is_feed_failure() => {
            println!("The feed could not be retrieved; nothing was added.");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };
    let id = feed_id_for_url(url.trim());

    if let Some(feed) = state.feeds.iter().find(|f| f.id == id) {
        println!("Subscribed to '{}' ({} articles)", feed.title, feed.items.len());
        println!("  ID: {}", feed.id);
    }

    Ok(())
}
