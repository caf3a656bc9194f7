//! Operations exposed to hosts (CLI, HTTP handlers)
//!
//! Every command takes the caller's identity explicitly and checks that the
//! collection or card it touches belongs to that caller. Input arrives in
//! loosely typed form and is validated here, so the library modules below
//! only ever see well-formed values.

pub mod flashcard;
pub mod import;
pub mod session;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

use crate::anki::ImportError;
use crate::flashcards::{Collection, FlashcardStorage, FlashcardStorageError};

pub use flashcard::{
    collection_stats, delete_collection, get_due_cards, list_collections, parse_limit,
    update_collection, update_performance, AnswerInput, CollectionSummary, DueCards,
};
pub use import::{import_package, import_package_async};
pub use session::{answer_card, begin_session, AnswerOutcome, StudyStep};

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Storage(FlashcardStorageError),
}

impl CommandError {
    /// Stable, machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            CommandError::Validation(_) => "validation",
            CommandError::NotFound(_) => "not_found",
            CommandError::Import(err) => err.kind().as_str(),
            CommandError::Storage(_) => "storage",
        }
    }
}

impl From<FlashcardStorageError> for CommandError {
    fn from(err: FlashcardStorageError) -> Self {
        match err {
            FlashcardStorageError::CollectionNotFound(_) | FlashcardStorageError::CardNotFound(_) => {
                CommandError::NotFound(err.to_string())
            }
            other => CommandError::Storage(other),
        }
    }
}

impl Serialize for CommandError {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CommandError", 2)?;
        state.serialize_field("kind", self.kind())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

/// Parse a caller-supplied id
pub fn parse_id(raw: &str, what: &str) -> CommandResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|e| CommandError::Validation(format!("Invalid {} ID: {}", what, e)))
}

/// Fetch a collection, reporting someone else's collection as missing
pub(crate) fn owned_collection(
    storage: &FlashcardStorage,
    owner: &str,
    collection_id: Uuid,
) -> CommandResult<Collection> {
    let collection = storage.get_collection(collection_id)?;
    if collection.owner != owner {
        log::debug!("Collection {} is not owned by '{}'", collection_id, owner);
        return Err(CommandError::NotFound(format!(
            "Collection not found: {}",
            collection_id
        )));
    }
    Ok(collection)
}
