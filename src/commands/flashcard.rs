//! Collection, card and review commands

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::flashcards::algorithm::{self, parse_correctness};
use crate::flashcards::{Card, Collection, CollectionStats, FlashcardStorage};

use super::{owned_collection, CommandError, CommandResult};

/// Correctness flag as submitted by a client: a boolean or a string form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerInput {
    Flag(bool),
    Text(String),
}

impl AnswerInput {
    pub fn is_correct(&self) -> CommandResult<bool> {
        match self {
            AnswerInput::Flag(flag) => Ok(*flag),
            AnswerInput::Text(text) => parse_correctness(text).ok_or_else(|| {
                CommandError::Validation(format!("Unrecognized correctness flag: '{}'", text))
            }),
        }
    }
}

impl From<bool> for AnswerInput {
    fn from(flag: bool) -> Self {
        AnswerInput::Flag(flag)
    }
}

pub(crate) fn require_answer(answer: Option<&AnswerInput>) -> CommandResult<bool> {
    answer
        .ok_or_else(|| CommandError::Validation("Missing \"is_correct\" field".to_string()))?
        .is_correct()
}

/// Parse a textual `limit`; only non-negative integers are accepted
pub fn parse_limit(raw: &str) -> CommandResult<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| CommandError::Validation(format!("Invalid limit: '{}'", raw)))
}

/// Fetch a card, reporting a card in someone else's collection as missing
pub(crate) fn owned_card(storage: &FlashcardStorage, owner: &str, card_id: Uuid) -> CommandResult<Card> {
    let card = storage.get_card(card_id)?;
    owned_collection(storage, owner, card.collection_id)
        .map_err(|_| CommandError::NotFound(format!("Card not found: {}", card_id)))?;
    Ok(card)
}

/// Record an answer for a card outside of any session
pub fn update_performance(
    storage: &FlashcardStorage,
    owner: &str,
    card_id: Uuid,
    answer: Option<&AnswerInput>,
    now: DateTime<Utc>,
) -> CommandResult<Card> {
    let is_correct = require_answer(answer)?;
    let card = owned_card(storage, owner, card_id)?;

    let updated = algorithm::update_performance(&card, is_correct, now);
    storage.update_card_state(&updated)?;
    log::debug!(
        "Card {} answered {}; next review {}",
        card_id,
        if is_correct { "correctly" } else { "incorrectly" },
        updated.next_review
    );
    Ok(updated)
}

/// Due-cards query result
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueCards {
    pub count: usize,
    /// When the first returned card became due
    pub next_review: Option<DateTime<Utc>>,
    pub results: Vec<Card>,
}

/// Cards of a collection due at `now`, earliest first.
///
/// `limit` is the raw caller input; `None` falls back to `default_limit`.
pub fn get_due_cards(
    storage: &FlashcardStorage,
    owner: &str,
    collection_id: Uuid,
    limit: Option<&str>,
    default_limit: usize,
    now: DateTime<Utc>,
) -> CommandResult<DueCards> {
    let limit = match limit {
        Some(raw) => parse_limit(raw)?,
        None => default_limit,
    };
    owned_collection(storage, owner, collection_id)?;

    let results = storage.get_due_cards(collection_id, now, limit)?;
    Ok(DueCards {
        count: results.len(),
        next_review: results.first().map(|c| c.next_review),
        results,
    })
}

/// A collection together with its counts
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    pub collection: Collection,
    pub stats: CollectionStats,
}

pub fn list_collections(
    storage: &FlashcardStorage,
    owner: &str,
    now: DateTime<Utc>,
) -> CommandResult<Vec<CollectionSummary>> {
    storage
        .list_collections(owner)?
        .into_iter()
        .map(|collection| {
            let stats = storage.collection_stats(collection.id, now)?;
            Ok(CollectionSummary { collection, stats })
        })
        .collect()
}

pub fn collection_stats(
    storage: &FlashcardStorage,
    owner: &str,
    collection_id: Uuid,
    now: DateTime<Utc>,
) -> CommandResult<CollectionSummary> {
    let collection = owned_collection(storage, owner, collection_id)?;
    let stats = storage.collection_stats(collection_id, now)?;
    Ok(CollectionSummary { collection, stats })
}

/// Rename a collection or change its description.
///
/// `description` is `None` to leave it alone, `Some(None)` to clear it.
pub fn update_collection(
    storage: &FlashcardStorage,
    owner: &str,
    collection_id: Uuid,
    name: Option<String>,
    description: Option<Option<String>>,
    now: DateTime<Utc>,
) -> CommandResult<Collection> {
    let mut collection = owned_collection(storage, owner, collection_id)?;

    if let Some(name) = name {
        let name = name.trim();
        if name.is_empty() {
            return Err(CommandError::Validation("Collection name cannot be empty".to_string()));
        }
        collection.name = name.to_string();
    }
    if let Some(description) = description {
        collection.description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
    }
    collection.updated_at = now;

    storage.update_collection(&collection)?;
    Ok(collection)
}

/// Delete a collection and all of its cards
pub fn delete_collection(storage: &FlashcardStorage, owner: &str, collection_id: Uuid) -> CommandResult<()> {
    let collection = owned_collection(storage, owner, collection_id)?;
    storage.delete_collection(collection_id)?;
    log::info!("Deleted collection '{}' ({})", collection.name, collection_id);
    Ok(())
}
