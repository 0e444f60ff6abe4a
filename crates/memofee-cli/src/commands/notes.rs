use anyhow::Result;

use memofee_core::Coordinator;

pub async fn run(coordinator: &Coordinator) -> Result<()> {
    let state = coordinator.snapshot().await?;

    if state.notes.is_empty() {
        println!("No notes yet.");
        return Ok(());
    }

    println!("Notes ({}):\n", state.notes.len());

    for note in &state.notes {
        let feed = state.feeds.iter().find(|f| f.id == note.feed_id);
        let article = feed.and_then(|f| f.article(&note.item_guid));

        match (feed, article) {
            (Some(feed), Some(article)) => println!("  {} / {}", feed.title, article.title),
            (Some(feed), None) => println!("  {} / {}", feed.title, note.item_guid),
            _ => println!("  {}", note.id),
        }
        println!("    {}", note.content);
        println!("    Updated: {}", note.updated_at.format("%Y-%m-%d %H:%M"));
        println!();
    }

    Ok(())
}
