mod app;
mod commands;
mod render;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hanzi-cli", about = "Chinese character flashcards with Anki import", version)]
struct Cli {
    /// Config file (default: <config dir>/hanzi-srs/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Act as this owner instead of the configured one
    #[arg(long, global = true)]
    owner: Option<String>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Import an Anki package (.apkg) as a new deck
    Import {
        /// Path to the package; the deck is named after the file
        path: PathBuf,
    },

    /// List decks with their progress
    Decks,

    /// Show cards due for review
    Due {
        /// Deck name (case-insensitive prefix match) or id
        deck: String,
        /// Maximum cards to show
        #[arg(long)]
        limit: Option<String>,
    },

    /// Study a deck interactively
    Study {
        /// Deck name (case-insensitive prefix match) or id
        deck: String,
        /// Maximum new cards in the session
        #[arg(long)]
        max_new: Option<usize>,
        /// Maximum review cards in the session
        #[arg(long)]
        max_review: Option<usize>,
    },

    /// Show deck statistics
    Stats {
        /// Deck name (case-insensitive prefix match) or id
        deck: String,
    },

    /// Rename a deck or change its description
    Edit {
        /// Deck name (case-insensitive prefix match) or id
        deck: String,
        /// New deck name
        #[arg(long)]
        name: Option<String>,
        /// New description (empty to clear)
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a deck and all of its cards
    Delete {
        /// Deck name (case-insensitive prefix match) or id
        deck: String,
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && std::io::stdout().is_terminal();
    let app = app::App::new(cli.config.as_deref(), cli.owner.as_deref())?;

    match cli.command {
        Command::Import { path } => {
            commands::import::run(&app, &path, &cli.format, use_color)?;
        }
        Command::Decks => {
            commands::decks::run(&app, &cli.format, use_color)?;
        }
        Command::Due { deck, limit } => {
            commands::due::run(&app, &deck, limit.as_deref(), &cli.format, use_color)?;
        }
        Command::Study { deck, max_new, max_review } => {
            commands::study::run(&app, &deck, max_new, max_review, use_color)?;
        }
        Command::Stats { deck } => {
            commands::stats::run(&app, &deck, &cli.format, use_color)?;
        }
        Command::Edit { deck, name, description } => {
            commands::edit::run(&app, &deck, name, description, &cli.format)?;
        }
        Command::Delete { deck, yes } => {
            commands::delete::run(&app, &deck, yes, &cli.format)?;
        }
    }

    Ok(())
}
