use anyhow::Result;

use memofee_core::{Coordinator, Selection};

pub async fn show(coordinator: &Coordinator, feed_id: &str, guid: &str) -> Result<()> {
    match coordinator.select(feed_id, guid).await {
        Selection::Current { note: Some(note), .. } => {
            println!("{}", note.content);
            println!("\nCreated: {}", note.created_at.format("%Y-%m-%d %H:%M"));
            println!("Updated: {}", note.updated_at.format("%Y-%m-%d %H:%M"));
        }
        Selection::Current { note: None, .. } => println!("No note for this article."),
        Selection::Superseded => {}
    }

    Ok(())
}

pub async fn save(coordinator: &Coordinator, feed_id: &str, guid: &str, content: &str) -> Result<()> {
    let state = coordinator.save_note(feed_id, guid, content).await?;

    if let Some(note) = state.note_for(feed_id, guid) {
        println!("Saved note ({} characters).", note.content.chars().count());
    }

    Ok(())
}

pub async fn clear(coordinator: &Coordinator, feed_id: &str, guid: &str) -> Result<()> {
    coordinator.clear_note(feed_id, guid).await?;
    println!("Cleared note.");
    Ok(())
}
