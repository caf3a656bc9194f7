use std::sync::{Arc, Mutex};

pub mod anki;
pub mod commands;
pub mod config;
pub mod flashcards;

use anki::PackageImporter;
use config::AppConfig;
use flashcards::{FlashcardStorage, FlashcardStorageError};

/// Shared state for a host serving several callers
pub struct AppState {
    pub config: AppConfig,
    pub flashcard_storage: Arc<Mutex<FlashcardStorage>>,
    pub importer: PackageImporter,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Storage(#[from] FlashcardStorageError),
}

impl AppState {
    /// Open the card database and scratch space named by `config`
    pub fn open(config: AppConfig) -> Result<Self, InitError> {
        let db_path = config.database_path()?;
        log::info!("Opening flashcard database at {:?}", db_path);
        let storage = FlashcardStorage::new(db_path)?;
        let importer = PackageImporter::new(config.scratch_dir());

        Ok(Self {
            config,
            flashcard_storage: Arc::new(Mutex::new(storage)),
            importer,
        })
    }
}
