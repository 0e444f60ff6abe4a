use anyhow::Result;

use memofee_core::Coordinator;

pub async fn run(coordinator: &Coordinator, show_items: bool) -> Result<()> {
    let state = coordinator.snapshot().await?;

    if state.feeds.is_empty() {
        println!("No subscriptions yet.");
        println!("\nTo subscribe to a feed, run:");
        println!("  memofee subscribe <url>");
        return Ok(());
    }

    println!("Subscriptions ({}):\n", state.feeds.len());

    for feed in &state.feeds {
        let notes = state.notes.iter().filter(|n| n.feed_id == feed.id).count();
        let notes = if notes > 0 {
            format!(" ({} notes)", notes)
        } else {
            String::new()
        };

        println!("  {} - {}{}", feed.id, feed.title, notes);
        println!("    URL: {}", feed.url);
        println!("    Last updated: {}", feed.last_updated.format("%Y-%m-%d %H:%M"));

        if show_items {
            for item in &feed.items {
                let marker = if state.note_for(&feed.id, &item.guid).is_some() { '*' } else { ' ' };
                println!("    [{}] {}", marker, item.title);
                println!("        guid: {}", item.guid);
                if !item.pub_date.is_empty() {
                    println!("        published: {}", item.pub_date);
                }
            }
        }
        println!();
    }

    Ok(())
}
