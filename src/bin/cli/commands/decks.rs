use anyhow::Result;
use chrono::Utc;

use hanzi_srs::commands::list_collections;

use crate::app::App;
use crate::render::terminal::{format_time, paint, stats_line, Color};
use crate::OutputFormat;

use super::fail;

pub fn run(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let summaries = {
        let storage = app.storage()?;
        list_collections(&storage, &app.owner, Utc::now()).map_err(|e| fail(e, format, "Failed to list decks"))?
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        OutputFormat::Plain => {
            if summaries.is_empty() {
                println!("No decks yet. Import one with `hanzi-cli import <file.apkg>`.");
                return Ok(());
            }

            for summary in &summaries {
                println!(
                    "{} {}",
                    paint(&summary.collection.name, Color::BOLD, use_color),
                    paint(
                        &format!("(created {})", format_time(summary.collection.created_at)),
                        Color::DIM,
                        use_color
                    )
                );
                if let Some(description) = &summary.collection.description {
                    println!("    {}", paint(description, Color::DIM, use_color));
                }
                println!("    {}", stats_line(&summary.stats, use_color));
            }

            println!("\n{} decks total", summaries.len());
        }
    }

    Ok(())
}
