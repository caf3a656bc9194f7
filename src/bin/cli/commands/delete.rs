use std::io::{self, BufRead, Write};

use anyhow::Result;

use hanzi_srs::commands::delete_collection;

use crate::app::App;
use crate::OutputFormat;

use super::fail;

pub fn run(app: &App, deck: &str, yes: bool, format: &OutputFormat) -> Result<()> {
    let collection = app.find_collection(deck)?;

    if !yes {
        print!("Delete '{}' and all of its cards? [y/N] ", collection.name);
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("Aborted.");
            return Ok(());
        }
    }

    {
        let storage = app.storage()?;
        delete_collection(&storage, &app.owner, collection.id)
            .map_err(|e| fail(e, format, "Failed to delete deck"))?;
    }

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({ "deleted": collection.id.to_string() });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => println!("Deleted '{}'.", collection.name),
    }

    Ok(())
}
