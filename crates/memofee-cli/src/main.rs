use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memofee_core::{AppConfig, Coordinator};

mod commands;

#[derive(Parser)]
#[command(name = "memofee")]
#[command(author, version, about = "An RSS reader that keeps a note per article")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Listen port (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    #[command(flatten)]
    Session(SessionCommand),
}

/// Commands that work on the local subscription list
#[derive(Subcommand)]
enum SessionCommand {
    /// Fetch a feed and subscribe to it
    Subscribe {
        /// RSS or Atom feed URL
        url: String,
    },
    /// Unsubscribe from a feed and delete its notes
    Unsubscribe {
        /// ID of the feed, as shown by `list`
        feed_id: String,
    },
    /// List subscriptions
    List {
        /// Also list the articles of each feed
        #[arg(short, long)]
        items: bool,
    },
    /// List all notes
    Notes,
    /// Show, save or clear the note of one article
    Note {
        #[command(subcommand)]
        action: NoteAction,
    },
}

#[derive(Subcommand)]
enum NoteAction {
    /// Show the note of an article
    Show { feed_id: String, guid: String },
    /// Save the note of an article, replacing any previous content
    Save {
        feed_id: String,
        guid: String,
        content: String,
    },
    /// Delete the note of an article
    Clear { feed_id: String, guid: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(config, port).await,
        Commands::Session(command) => {
            let coordinator = Coordinator::from_config(&config)?;
            run_session(&coordinator, command).await
        }
    }
}

async fn run_session(coordinator: &Coordinator, command: SessionCommand) -> Result<()> {
    match command {
        SessionCommand::Subscribe { url } => commands::subscribe::run(coordinator, &url).await,
        SessionCommand::Unsubscribe { feed_id } => commands::unsubscribe::run(coordinator, &feed_id).await,
        SessionCommand::List { items } => commands::list::run(coordinator, items).await,
        SessionCommand::Notes => commands::notes::run(coordinator).await,
        SessionCommand::Note { action } => match action {
            NoteAction::Show { feed_id, guid } => commands::note::show(coordinator, &feed_id, &guid).await,
            NoteAction::Save { feed_id, guid, content } => {
                commands::note::save(coordinator, &feed_id, &guid, &content).await
            }
            NoteAction::Clear { feed_id, guid } => commands::note::clear(coordinator, &feed_id, &guid).await,
        },
    }
}
