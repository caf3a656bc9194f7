use anyhow::Result;
use chrono::Utc;

use hanzi_srs::commands::collection_stats;

use crate::app::App;
use crate::render::terminal::{paint, progress_bar, Color};
use crate::OutputFormat;

use super::fail;

pub fn run(app: &App, deck: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let collection = app.find_collection(deck)?;
    let summary = {
        let storage = app.storage()?;
        collection_stats(&storage, &app.owner, collection.id, Utc::now())
            .map_err(|e| fail(e, format, "Failed to read deck statistics"))?
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Plain => {
            let stats = &summary.stats;
            println!("{}", paint(&summary.collection.name, Color::BOLD, use_color));
            println!("  Total cards: {}", stats.total_cards);
            println!("  Due now:     {}", stats.due_cards);
            println!("  Seen:        {}", stats.seen_cards);
            println!("  Progress:    {}", progress_bar(stats.progress, 30));
        }
    }

    Ok(())
}
