//! Package import commands

use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::anki::{ImportError, ImportOutcome, PackageImporter};
use crate::flashcards::FlashcardStorage;

use super::CommandResult;

/// Import an uploaded `.apkg` as a new collection owned by `owner`
pub fn import_package(
    storage: &mut FlashcardStorage,
    importer: &PackageImporter,
    owner: &str,
    raw: &[u8],
    filename: &str,
) -> CommandResult<ImportOutcome> {
    importer
        .import(storage, owner, raw, filename, Utc::now())
        .map_err(Into::into)
}

/// Run an import on the blocking pool and await its single result.
///
/// The package is read without holding the storage lock; the lock is only
/// taken for the final write.
pub async fn import_package_async(
    storage: Arc<Mutex<FlashcardStorage>>,
    importer: PackageImporter,
    owner: String,
    raw: Vec<u8>,
    filename: String,
) -> CommandResult<ImportOutcome> {
    let result = tokio::task::spawn_blocking(move || {
        let staged = importer.stage(&raw, &filename)?;
        let mut storage = storage
            .lock()
            .map_err(|e| ImportError::failed(format!("Storage lock poisoned: {}", e)))?;
        staged.commit(&mut storage, &owner, Utc::now())
    })
    .await
    .map_err(ImportError::failed)?;

    result.map_err(Into::into)
}
