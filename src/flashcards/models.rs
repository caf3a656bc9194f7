//! Data models for the flashcard system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A collection (deck) of cards owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: Uuid,
    pub owner: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Collection {
    pub fn new(owner: String, name: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            name,
            description: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A character/pronunciation/translation card with its review state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: Uuid,
    pub collection_id: Uuid,
    pub character: String,
    pub pronunciation: String,
    /// May be empty
    #[serde(default)]
    pub translation: String,
    /// Creation order within the collection
    #[serde(default)]
    pub position: i64,
    pub created_at: DateTime<Utc>,
    /// The card is eligible for review once this time has passed
    pub next_review: DateTime<Utc>,
    #[serde(default)]
    pub consecutive_correct: u32,
    #[serde(default)]
    pub seen: bool,
}

impl Card {
    /// Build a fresh, immediately due card from a draft
    pub fn from_draft(
        collection_id: Uuid,
        draft: CardDraft,
        position: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            collection_id,
            character: draft.character,
            pronunciation: draft.pronunciation,
            translation: draft.translation,
            position,
            created_at: now,
            next_review: now,
            consecutive_correct: 0,
            seen: false,
        }
    }

    /// Check if the card is due for review at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review <= now
    }
}

/// Card fields produced by the importer, not yet attached to a collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDraft {
    pub character: String,
    pub pronunciation: String,
    pub translation: String,
}

/// Counts for a single collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStats {
    pub total_cards: usize,
    pub due_cards: usize,
    pub seen_cards: usize,
    /// Percentage of cards seen at least once (0-100)
    pub progress: u8,
}

impl CollectionStats {
    pub fn new(total_cards: usize, due_cards: usize, seen_cards: usize) -> Self {
        let progress = if total_cards == 0 {
            0
        } else {
            (seen_cards * 100 / total_cards) as u8
        };
        Self {
            total_cards,
            due_cards,
            seen_cards,
            progress,
        }
    }
}
