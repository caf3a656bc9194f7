//! Storage operations for collections and cards
//!
//! Everything lives in one SQLite database:
//! ```text
//! collections   id, owner, name, description, created_at, updated_at
//! cards         id, collection_id -> collections(id) ON DELETE CASCADE,
//!               character, pronunciation, translation, position,
//!               created_at, next_review, consecutive_correct, seen
//! ```
//! Timestamps are stored as microseconds since the Unix epoch.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;
use uuid::Uuid;

use super::models::*;

#[derive(Error, Debug)]
pub enum FlashcardStorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Collection not found: {0}")]
    CollectionNotFound(Uuid),

    #[error("Card not found: {0}")]
    CardNotFound(Uuid),

    #[error("Refusing to create collection '{0}' without cards")]
    EmptyCollection(String),

    #[error("Corrupt record: {0}")]
    CorruptRecord(String),
}

pub type Result<T> = std::result::Result<T, FlashcardStorageError>;

const CARD_COLUMNS: &str = "id, collection_id, character, pronunciation, translation, position, \
     created_at, next_review, consecutive_correct, seen";

/// Storage manager for flashcard operations
pub struct FlashcardStorage {
    conn: Connection,
    db_path: Option<PathBuf>,
}

impl FlashcardStorage {
    /// Open (or create) the database at the given path
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&db_path)?;
        Self::init(conn, Some(db_path))
    }

    /// Private in-memory database, used by tests and dry runs
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, db_path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS collections (
                id TEXT PRIMARY KEY,
                owner TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS cards (
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
                FOREIGN KEY (collection_id) REFERENCES collections(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_collections_owner ON collections(owner);
            CREATE INDEX IF NOT EXISTS idx_cards_collection ON cards(collection_id);
            CREATE INDEX IF NOT EXISTS idx_cards_next_review ON cards(collection_id, next_review);
            "#,
        )?;

        Ok(Self { conn, db_path })
    }

    /// Path of the backing database, if it is file-backed
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    // ==================== Collection Operations ====================

    /// Create a collection together with all of its cards in one transaction.
    ///
    /// Either the collection and every card are written, or nothing is.
    pub fn create_collection_with_cards(
        &mut self,
        owner: &str,
        name: &str,
        drafts: Vec<CardDraft>,
        now: DateTime<Utc>,
    ) -> Result<(Collection, Vec<Card>)> {
        if drafts.is_empty() {
            return Err(FlashcardStorageError::EmptyCollection(name.to_string()));
        }

        let collection = Collection::new(owner.to_string(), name.to_string(), now);
        let cards: Vec<Card> = drafts
            .into_iter()
            .enumerate()
            .map(|(i, draft)| Card::from_draft(collection.id, draft, i as i64, now))
            .collect();

        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO collections (id, owner, name, description, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                collection.id.to_string(),
                collection.owner,
                collection.name,
                collection.description,
                to_micros(collection.created_at),
                to_micros(collection.updated_at),
            ],
        )?;

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO cards ({CARD_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ))?;
            for card in &cards {
                stmt.execute(params![
                    card.id.to_string(),
                    card.collection_id.to_string(),
                    card.character,
                    card.pronunciation,
                    card.translation,
                    card.position,
                    to_micros(card.created_at),
                    to_micros(card.next_review),
                    card.consecutive_correct,
                    card.seen,
                ])?;
            }
        }

        tx.commit()?;

        Ok((collection, cards))
    }

    /// List all collections belonging to an owner, oldest first
    pub fn list_collections(&self, owner: &str) -> Result<Vec<Collection>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner, name, description, created_at, updated_at
             FROM collections WHERE owner = ?1 ORDER BY created_at ASC, name ASC",
        )?;
        let rows = stmt.query_map(params![owner], collection_from_row)?;
        rows.map(|r| r?).collect()
    }

    /// Get a specific collection
    pub fn get_collection(&self, collection_id: Uuid) -> Result<Collection> {
        self.conn
            .query_row(
                "SELECT id, owner, name, description, created_at, updated_at
                 FROM collections WHERE id = ?1",
                params![collection_id.to_string()],
                collection_from_row,
            )
            .optional()?
            .ok_or(FlashcardStorageError::CollectionNotFound(collection_id))?
    }

    /// Persist a collection's name, description and `updated_at`
    pub fn update_collection(&self, collection: &Collection) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE collections SET name = ?2, description = ?3, updated_at = ?4 WHERE id = ?1",
            params![
                collection.id.to_string(),
                collection.name,
                collection.description,
                to_micros(collection.updated_at),
            ],
        )?;
        if updated == 0 {
            return Err(FlashcardStorageError::CollectionNotFound(collection.id));
        }
        Ok(())
    }

    /// Delete a collection and, through the cascade, all its cards
    pub fn delete_collection(&self, collection_id: Uuid) -> Result<()> {
        let deleted = self.conn.execute(
            "DELETE FROM collections WHERE id = ?1",
            params![collection_id.to_string()],
        )?;
        if deleted == 0 {
            return Err(FlashcardStorageError::CollectionNotFound(collection_id));
        }
        Ok(())
    }

    /// Card counts and progress for a collection
    pub fn collection_stats(&self, collection_id: Uuid, now: DateTime<Utc>) -> Result<CollectionStats> {
        let (total, due, seen): (i64, i64, i64) = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN next_review <= ?2 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(seen), 0)
             FROM cards WHERE collection_id = ?1",
            params![collection_id.to_string(), to_micros(now)],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        Ok(CollectionStats::new(total as usize, due as usize, seen as usize))
    }

    // ==================== Card Operations ====================

    /// List all cards in a collection, in creation order
    pub fn list_cards(&self, collection_id: Uuid) -> Result<Vec<Card>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CARD_COLUMNS} FROM cards WHERE collection_id = ?1 ORDER BY position ASC"
        ))?;
        let rows = stmt.query_map(params![collection_id.to_string()], card_from_row)?;
        rows.map(|r| r?).collect()
    }

    /// Get a specific card
    pub fn get_card(&self, card_id: Uuid) -> Result<Card> {
        self.conn
            .query_row(
                &format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = ?1"),
                params![card_id.to_string()],
                card_from_row,
            )
            .optional()?
            .ok_or(FlashcardStorageError::CardNotFound(card_id))?
    }

    /// Persist a card's scheduling fields in a single write
    pub fn update_card_state(&self, card: &Card) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE cards SET next_review = ?2, consecutive_correct = ?3, seen = ?4 WHERE id = ?1",
            params![
                card.id.to_string(),
                to_micros(card.next_review),
                card.consecutive_correct,
                card.seen,
            ],
        )?;
        if updated == 0 {
            return Err(FlashcardStorageError::CardNotFound(card.id));
        }
        Ok(())
    }

    // ==================== Review Operations ====================

    /// Cards in a collection due at `now`, earliest first, at most `limit`
    pub fn get_due_cards(&self, collection_id: Uuid, now: DateTime<Utc>, limit: usize) -> Result<Vec<Card>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CARD_COLUMNS} FROM cards
             WHERE collection_id = ?1 AND next_review <= ?2
             ORDER BY next_review ASC, position ASC
             LIMIT ?3"
        ))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(
            params![collection_id.to_string(), to_micros(now), limit],
            card_from_row,
        )?;
        rows.map(|r| r?).collect()
    }
}

fn to_micros(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

fn from_micros(micros: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| FlashcardStorageError::CorruptRecord(format!("timestamp out of range: {micros}")))
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| FlashcardStorageError::CorruptRecord(format!("bad id '{raw}': {e}")))
}

// Row mappers return a nested Result so conversion failures surface as
// storage errors rather than being squeezed into rusqlite::Error.
fn collection_from_row(row: &Row<'_>) -> rusqlite::Result<Result<Collection>> {
    let id: String = row.get(0)?;
    let owner: String = row.get(1)?;
    let name: String = row.get(2)?;
    let description: Option<String> = row.get(3)?;
    let created_at: i64 = row.get(4)?;
    let updated_at: i64 = row.get(5)?;

    Ok((|| {
        Ok(Collection {
            id: parse_uuid(&id)?,
            owner,
            name,
            description,
            created_at: from_micros(created_at)?,
            updated_at: from_micros(updated_at)?,
        })
    })())
}

fn card_from_row(row: &Row<'_>) -> rusqlite::Result<Result<Card>> {
    let id: String = row.get(0)?;
    let collection_id: String = row.get(1)?;
    let character: String = row.get(2)?;
    let pronunciation: String = row.get(3)?;
    let translation: String = row.get(4)?;
    let position: i64 = row.get(5)?;
    let created_at: i64 = row.get(6)?;
    let next_review: i64 = row.get(7)?;
    let consecutive_correct: u32 = row.get(8)?;
    let seen: bool = row.get(9)?;

    Ok((|| {
        Ok(Card {
            id: parse_uuid(&id)?,
            collection_id: parse_uuid(&collection_id)?,
            character,
            pronunciation,
            translation,
            position,
            created_at: from_micros(created_at)?,
            next_review: from_micros(next_review)?,
            consecutive_correct,
            seen,
        })
    })())
}
