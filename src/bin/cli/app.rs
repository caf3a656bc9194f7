use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, bail, Context, Result};
use uuid::Uuid;

use hanzi_srs::anki::PackageImporter;
use hanzi_srs::config::AppConfig;
use hanzi_srs::flashcards::{Collection, FlashcardStorage};
use hanzi_srs::AppState;

/// Shared application state for CLI commands
pub struct App {
    pub state: AppState,
    pub owner: String,
}

impl App {
    /// Load the config and open the card database
    pub fn new(config_path: Option<&Path>, owner: Option<&str>) -> Result<Self> {
        let config = AppConfig::load(config_path).context("Failed to load config")?;
        let owner = owner.map(str::to_string).unwrap_or_else(|| config.owner.clone());
        let state = AppState::open(config).context("Failed to open flashcard database")?;

        Ok(Self { state, owner })
    }

    pub fn config(&self) -> &AppConfig {
        &self.state.config
    }

    pub fn importer(&self) -> &PackageImporter {
        &self.state.importer
    }

    pub fn shared_storage(&self) -> Arc<Mutex<FlashcardStorage>> {
        Arc::clone(&self.state.flashcard_storage)
    }

    pub fn storage(&self) -> Result<MutexGuard<'_, FlashcardStorage>> {
        self.state
            .flashcard_storage
            .lock()
            .map_err(|_| anyhow!("Flashcard storage lock poisoned"))
    }

    /// Find one of the owner's decks by id, exact name, or unique name prefix
    /// (case-insensitive)
    pub fn find_collection(&self, name: &str) -> Result<Collection> {
        let collections = self
            .storage()?
            .list_collections(&self.owner)
            .context("Failed to list decks")?;

        if let Ok(id) = Uuid::parse_str(name.trim()) {
            if let Some(c) = collections.iter().find(|c| c.id == id) {
                return Ok(c.clone());
            }
        }

        let name_lower = name.to_lowercase();

        // Exact match first
        if let Some(c) = collections.iter().find(|c| c.name.to_lowercase() == name_lower) {
            return Ok(c.clone());
        }

        let matches: Vec<&Collection> = collections
            .iter()
            .filter(|c| c.name.to_lowercase().starts_with(&name_lower))
            .collect();

        match matches.len() {
            0 => bail!(
                "No deck matching '{}'. Available decks:\n{}",
                name,
                name_list(collections.iter())
            ),
            1 => Ok(matches[0].clone()),
            _ => bail!(
                "Ambiguous deck name '{}'. Matches:\n{}",
                name,
                name_list(matches.into_iter())
            ),
        }
    }
}

fn name_list<'a>(collections: impl Iterator<Item = &'a Collection>) -> String {
    collections
        .map(|c| format!("  - {}", c.name))
        .collect::<Vec<_>>()
        .join("\n")
}
