use std::path::Path;

use anyhow::{Context, Result};

use hanzi_srs::commands::import_package_async;

use crate::app::App;
use crate::render::terminal::{paint, Color};
use crate::OutputFormat;

use super::fail;

pub fn run(app: &App, path: &Path, format: &OutputFormat, use_color: bool) -> Result<()> {
    let raw = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let outcome = runtime
        .block_on(import_package_async(
            app.shared_storage(),
            app.importer().clone(),
            app.owner.clone(),
            raw,
            filename,
        ))
        .map_err(|e| fail(e, format, "Import failed"))?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        OutputFormat::Plain => {
            println!(
                "{} '{}': {} cards created",
                paint("Imported", Color::GREEN, use_color),
                outcome.collection.name,
                outcome.cards_created
            );
        }
    }

    Ok(())
}
