//! Anki package import
//!
//! Runs in two phases. Reading stages everything in memory: extract the
//! collection database, match note types, materialize card drafts. Only when
//! at least one draft survives is the collection written, together with all
//! its cards, in a single transaction. No failure leaves a partial
//! collection behind.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::flashcards::models::{CardDraft, Collection};
use crate::flashcards::storage::FlashcardStorage;

use super::archive::extract_database;
use super::database::CollectionReader;
use super::error::{ImportError, Result};
use super::materialize::collect_drafts;
use super::schema::match_catalog;

/// Name used when the upload's filename yields nothing usable
pub const FALLBACK_COLLECTION_NAME: &str = "Imported deck";

/// Result of a successful import
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub collection: Collection,
    pub cards_created: usize,
}

/// Collection name derived from the uploaded file: base name, extension stripped
pub fn collection_name(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let stem = Path::new(base)
        .file_stem()
        .map(|s| s.to_string_lossy().trim().to_string())
        .unwrap_or_default();

    if stem.is_empty() {
        FALLBACK_COLLECTION_NAME.to_string()
    } else {
        stem
    }
}

/// Everything from the package bytes up to card drafts, with no writes
pub fn read_package(raw: &[u8], scratch_dir: &Path) -> Result<Vec<CardDraft>> {
    let extracted = extract_database(raw, scratch_dir)?;
    log::info!("Reading Anki collection from '{}'", extracted.entry_name());

    let reader = CollectionReader::open(extracted.path())?;
    let catalog = reader.read_schema_catalog()?;
    let schemas = match_catalog(&catalog)?;

    let mut note_type_ids: Vec<i64> = schemas.keys().copied().collect();
    note_type_ids.sort_unstable();
    let notes = reader.notes_for(&note_type_ids)?;
    log::debug!(
        "{} notes belong to {} compatible note types",
        notes.len(),
        note_type_ids.len()
    );

    Ok(collect_drafts(&notes, &schemas))
}

/// Imports `.apkg` packages into a [`FlashcardStorage`]
#[derive(Debug, Clone)]
pub struct PackageImporter {
    scratch_dir: PathBuf,
}

impl Default for PackageImporter {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

impl PackageImporter {
    /// Extracted databases are written under `scratch_dir`, one private
    /// temporary file per import
    pub fn new(scratch_dir: PathBuf) -> Self {
        Self { scratch_dir }
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Read a package without touching storage
    pub fn stage(&self, raw: &[u8], filename: &str) -> Result<StagedImport> {
        let collection_name = collection_name(filename);
        let drafts = read_package(raw, &self.scratch_dir)?;

        if drafts.is_empty() {
            log::warn!("Import of '{}' produced no cards", collection_name);
            return Err(ImportError::EmptyImportResult { collection_name });
        }

        Ok(StagedImport {
            collection_name,
            drafts,
        })
    }

    /// Import one package as a new collection owned by `owner`
    pub fn import(
        &self,
        storage: &mut FlashcardStorage,
        owner: &str,
        raw: &[u8],
        filename: &str,
        now: DateTime<Utc>,
    ) -> Result<ImportOutcome> {
        self.stage(raw, filename)?.commit(storage, owner, now)
    }
}

/// Card drafts read from a package, waiting to be written
#[derive(Debug, Clone)]
pub struct StagedImport {
    collection_name: String,
    drafts: Vec<CardDraft>,
}

impl StagedImport {
    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    /// Write the collection and all of its cards in one transaction
    pub fn commit(
        self,
        storage: &mut FlashcardStorage,
        owner: &str,
        now: DateTime<Utc>,
    ) -> Result<ImportOutcome> {
        let (collection, cards) = storage
            .create_collection_with_cards(owner, &self.collection_name, self.drafts, now)
            .map_err(ImportError::failed)?;

        log::info!("Imported '{}': {} cards created", collection.name, cards.len());
        Ok(ImportOutcome {
            collection,
            cards_created: cards.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anki::fixtures::{models_json, zip_entries, CollectionFixture};
    use crate::anki::ImportErrorKind;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 2, 18, 0, 0).unwrap()
    }

    fn chinese_models() -> String {
        models_json(&[
            (1001, &["Hanzi", "Pinyin", "English"][..]),
            (1002, &["Front", "Back"][..]),
        ])
    }

    fn run_import(raw: &[u8], filename: &str) -> (Result<ImportOutcome>, FlashcardStorage, TempDir) {
        let scratch = TempDir::new().unwrap();
        let mut storage = FlashcardStorage::open_in_memory().unwrap();
        let importer = PackageImporter::new(scratch.path().to_path_buf());
        let result = importer.import(&mut storage, "alice", raw, filename, now());
        (result, storage, scratch)
    }

    fn scratch_is_empty(scratch: &TempDir) -> bool {
        std::fs::read_dir(scratch.path()).unwrap().count() == 0
    }

    #[test]
    fn test_collection_name() {
        assert_eq!(collection_name("HSK 1.apkg"), "HSK 1");
        assert_eq!(collection_name("/uploads/tmp/Radicals.apkg"), "Radicals");
        assert_eq!(collection_name("C:\\Users\\me\\deck.v2.apkg"), "deck.v2");
        assert_eq!(collection_name("noext"), "noext");
        assert_eq!(collection_name(""), FALLBACK_COLLECTION_NAME);
    }

    #[test]
    fn test_import_creates_collection_and_cards() {
        let raw = CollectionFixture::new()
            .models(&chinese_models())
            .note(1001, "你好\x1f nǐ hǎo \x1f hello")
            .note(1002, "front\x1fback")
            .note(1001, "谢谢\x1fxièxie\x1fthanks")
            .note(1001, "\x1fmissing\x1fcharacter")
            .package();

        let (result, storage, scratch) = run_import(&raw, "Greetings.apkg");
        let outcome = result.unwrap();

        assert_eq!(outcome.collection.name, "Greetings");
        assert_eq!(outcome.collection.owner, "alice");
        assert_eq!(outcome.cards_created, 2);

        let cards = storage.list_cards(outcome.collection.id).unwrap();
        assert_eq!(cards[0].character, "你好");
        assert_eq!(cards[0].pronunciation, "nǐ hǎo");
        assert_eq!(cards[0].translation, "hello");
        assert_eq!(cards[1].character, "谢谢");
        assert!(cards.iter().all(|c| !c.seen && c.next_review == now()));

        assert!(scratch_is_empty(&scratch));
    }

    #[test]
    fn test_prefers_anki21_database() {
        let legacy = CollectionFixture::new()
            .models(&chinese_models())
            .note(1001, "旧\x1fjiù\x1fold");
        let current = CollectionFixture::new()
            .models(&chinese_models())
            .note(1001, "新\x1fxīn\x1fnew");

        let dir = TempDir::new().unwrap();
        let legacy_db = std::fs::read(legacy.write(dir.path())).unwrap();
        let other = TempDir::new().unwrap();
        let current_db = std::fs::read(current.write(other.path())).unwrap();
        let raw = zip_entries(&[
            ("collection.anki2", legacy_db.as_slice()),
            ("collection.anki21", current_db.as_slice()),
        ]);

        let (result, storage, _scratch) = run_import(&raw, "mixed.apkg");
        let outcome = result.unwrap();
        let cards = storage.list_cards(outcome.collection.id).unwrap();
        assert_eq!(cards[0].character, "新");
    }

    #[test]
    fn test_missing_database_creates_nothing() {
        let raw = zip_entries(&[("media", b"{}".as_slice())]);

        let (result, storage, scratch) = run_import(&raw, "empty.apkg");

        assert_eq!(result.unwrap_err().kind(), ImportErrorKind::MissingDatabase);
        assert!(storage.list_collections("alice").unwrap().is_empty());
        assert!(scratch_is_empty(&scratch));
    }

    #[test]
    fn test_invalid_archive() {
        let (result, storage, _scratch) = run_import(b"PK but not really", "bad.apkg");

        assert_eq!(result.unwrap_err().kind(), ImportErrorKind::InvalidArchive);
        assert!(storage.list_collections("alice").unwrap().is_empty());
    }

    #[test]
    fn test_no_compatible_schema() {
        let raw = CollectionFixture::new()
            .models(&models_json(&[(1, &["Hanzi", "English"][..])]))
            .note(1, "水\x1fwater")
            .package();

        let (result, storage, scratch) = run_import(&raw, "nopinyin.apkg");

        assert_eq!(result.unwrap_err().kind(), ImportErrorKind::NoCompatibleSchema);
        assert!(storage.list_collections("alice").unwrap().is_empty());
        assert!(scratch_is_empty(&scratch));
    }

    #[test]
    fn test_all_notes_invalid_rolls_back() {
        let raw = CollectionFixture::new()
            .models(&chinese_models())
            .note(1001, "  \x1fyī\x1fone")
            .note(1001, "\x1fèr\x1ftwo")
            .package();

        let (result, storage, scratch) = run_import(&raw, "Blank.apkg");

        match result {
            Err(ImportError::EmptyImportResult { collection_name }) => {
                assert_eq!(collection_name, "Blank")
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(storage.list_collections("alice").unwrap().is_empty());
        assert!(scratch_is_empty(&scratch));
    }

    #[test]
    fn test_stage_reads_without_writing() {
        let scratch = TempDir::new().unwrap();
        let raw = CollectionFixture::new()
            .models(&chinese_models())
            .note(1001, "山\x1fshān\x1fmountain")
            .package();

        let importer = PackageImporter::new(scratch.path().to_path_buf());
        let staged = importer.stage(&raw, "Nature.apkg").unwrap();
        assert_eq!(staged.collection_name(), "Nature");
        assert_eq!(staged.len(), 1);

        let mut storage = FlashcardStorage::open_in_memory().unwrap();
        assert!(storage.list_collections("alice").unwrap().is_empty());

        let outcome = staged.commit(&mut storage, "alice", now()).unwrap();
        assert_eq!(storage.list_collections("alice").unwrap(), vec![outcome.collection]);
    }

    #[test]
    fn test_storage_failure_on_commit_leaves_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("flashcards.db");
        {
            // cards table that refuses every row
            let conn = rusqlite::Connection::open(&db_path).unwrap();
            conn.execute_batch(
                r#"
                CREATE TABLE collections (
                    id TEXT PRIMARY KEY,
                    owner TEXT NOT NULL,
                    name TEXT NOT NULL,
                    description TEXT,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL
                );
                CREATE TABLE cards (
                    id TEXT PRIMARY KEY,
                    collection_id TEXT NOT NULL,
                    character TEXT NOT NULL,
                    pronunciation TEXT NOT NULL,
                    translation TEXT NOT NULL DEFAULT '',
                    position INTEGER NOT NULL,
                    created_at INTEGER NOT NULL,
                    next_review INTEGER NOT NULL,
                    consecutive_correct INTEGER NOT NULL DEFAULT 0,
                    seen INTEGER NOT NULL DEFAULT 0,
                    CHECK (0)
                );
                "#,
            )
            .unwrap();
        }
        let mut storage = FlashcardStorage::new(db_path).unwrap();

        let scratch = TempDir::new().unwrap();
        let raw = CollectionFixture::new()
            .models(&chinese_models())
            .note(1001, "火\x1fhuǒ\x1ffire")
            .package();
        let importer = PackageImporter::new(scratch.path().to_path_buf());
        let result = importer.import(&mut storage, "alice", &raw, "Elements.apkg", now());

        assert_eq!(result.unwrap_err().kind(), ImportErrorKind::ImportFailed);
        assert!(storage.list_collections("alice").unwrap().is_empty());
        assert!(scratch_is_empty(&scratch));
    }

    #[test]
    fn test_concurrent_stages_clean_up_scratch() {
        let scratch = TempDir::new().unwrap();
        let raw = CollectionFixture::new()
            .models(&chinese_models())
            .note(1001, "水\x1fshuǐ\x1fwater")
            .package();
        let importer = PackageImporter::new(scratch.path().to_path_buf());

        std::thread::scope(|scope| {
            let workers: Vec<_> = (0..16)
                .map(|_| scope.spawn(|| importer.stage(&raw, "Deck.apkg")))
                .collect();
            for worker in workers {
                let staged = worker.join().unwrap().unwrap();
                assert_eq!(staged.len(), 1);
            }
        });

        assert!(scratch_is_empty(&scratch));
    }

    #[test]
    fn test_compatible_schema_without_notes_is_empty_result() {
        let raw = CollectionFixture::new().models(&chinese_models()).package();

        let (result, _storage, _scratch) = run_import(&raw, "nothing.apkg");
        assert_eq!(result.unwrap_err().kind(), ImportErrorKind::EmptyImportResult);
    }

    #[test]
    fn test_schema_errors_propagate() {
        let raw = CollectionFixture::new().models("[oops").package();
        let (result, _storage, _scratch) = run_import(&raw, "broken.apkg");
        assert_eq!(result.unwrap_err().kind(), ImportErrorKind::MalformedSchema);

        let raw = CollectionFixture::new().without_col_row().package();
        let (result, _storage, _scratch) = run_import(&raw, "broken.apkg");
        assert_eq!(result.unwrap_err().kind(), ImportErrorKind::MissingSchema);
    }

    #[test]
    fn test_corrupt_database() {
        let raw = zip_entries(&[("collection.anki2", vec![7u8; 2048].as_slice())]);
        let (result, _storage, scratch) = run_import(&raw, "corrupt.apkg");

        assert_eq!(result.unwrap_err().kind(), ImportErrorKind::CorruptDatabase);
        assert!(scratch_is_empty(&scratch));
    }
}
