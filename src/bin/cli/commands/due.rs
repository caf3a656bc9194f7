use anyhow::Result;
use chrono::Utc;

use hanzi_srs::commands::get_due_cards;

use crate::app::App;
use crate::render::terminal::{card_back, card_front, format_time};
use crate::OutputFormat;

use super::fail;

pub fn run(
    app: &App,
    deck: &str,
    limit: Option<&str>,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let collection = app.find_collection(deck)?;
    let due = {
        let storage = app.storage()?;
        get_due_cards(
            &storage,
            &app.owner,
            collection.id,
            limit,
            app.config().due_limit,
            Utc::now(),
        )
        .map_err(|e| fail(e, format, "Failed to query due cards"))?
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&due)?);
        }
        OutputFormat::Plain => {
            if due.results.is_empty() {
                println!("Nothing due in '{}'.", collection.name);
                return Ok(());
            }

            for card in &due.results {
                println!(
                    "{:<16} {:<8} {}",
                    format_time(card.next_review),
                    card_front(card, use_color),
                    card_back(card, use_color)
                );
            }

            println!("\n{} cards due", due.count);
        }
    }

    Ok(())
}
