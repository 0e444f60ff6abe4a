use anyhow::Result;

use memofee_core::Coordinator;

pub async fn run(coordinator: &Coordinator, feed_id: &str) -> Result<()> {
    let feed = match coordinator.feed(feed_id).await {
        Ok(feed) => feed,
        Err(e) if e.is_not_found() => {
            println!("Feed '{}' not found.", feed_id);
            let feeds = coordinator.snapshot().await?.feeds;
            if !feeds.is_empty() {
                println!("\nAvailable subscriptions:");
                for f in &feeds {
                    println!("  {} - {}", f.id, f.title);
                }
            }
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let before = coordinator.snapshot().await?;
    let after = coordinator.remove_feed(feed_id).await?;
    let removed_notes = before.notes.len().saturating_sub(after.notes.len());

    println!("Unsubscribed from: {}", feed.title);
    if removed_notes > 0 {
        println!("Deleted {} notes.", removed_notes);
    }

    Ok(())
}
