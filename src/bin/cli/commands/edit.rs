use anyhow::Result;
use chrono::Utc;

use hanzi_srs::commands::update_collection;

use crate::app::App;
use crate::OutputFormat;

use super::fail;

pub fn run(
    app: &App,
    deck: &str,
    name: Option<String>,
    description: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let collection = app.find_collection(deck)?;
    // An empty --description clears it
    let description = description.map(|d| Some(d).filter(|d| !d.trim().is_empty()));

    let updated = {
        let storage = app.storage()?;
        update_collection(&storage, &app.owner, collection.id, name, description, Utc::now())
            .map_err(|e| fail(e, format, "Failed to update deck"))?
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
        OutputFormat::Plain => {
            println!("Updated '{}'.", updated.name);
            if let Some(description) = &updated.description {
                println!("    {}", description);
            }
        }
    }

    Ok(())
}
