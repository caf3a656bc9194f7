//! Study sessions
//!
//! A session is a bounded, ordered queue of card ids for one collection,
//! planned once and then walked with a cursor. The state is a plain value:
//! the host stores it between requests and hands it back on the next call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::Card;

/// Caps applied when planning a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLimits {
    #[serde(default = "default_max_new")]
    pub max_new: usize,
    #[serde(default = "default_max_review")]
    pub max_review: usize,
}

fn default_max_new() -> usize {
    10
}

fn default_max_review() -> usize {
    15
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_new: default_max_new(),
            max_review: default_max_review(),
        }
    }
}

/// Select the cards for a study session.
///
/// Due cards (seen, `next_review <= now`) come first, earliest due first,
/// then unseen cards in creation order. Ties fall back to position, then id.
pub fn build_session(
    cards: &[Card],
    now: DateTime<Utc>,
    max_new: usize,
    max_review: usize,
) -> Vec<Card> {
    let mut due: Vec<&Card> = cards.iter().filter(|c| c.seen && c.is_due(now)).collect();
    due.sort_by(|a, b| {
        a.next_review
            .cmp(&b.next_review)
            .then(a.position.cmp(&b.position))
            .then(a.id.cmp(&b.id))
    });

    let mut new: Vec<&Card> = cards.iter().filter(|c| !c.seen).collect();
    new.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then(a.position.cmp(&b.position))
            .then(a.id.cmp(&b.id))
    });

    due.into_iter()
        .take(max_review)
        .chain(new.into_iter().take(max_new))
        .cloned()
        .collect()
}

/// Where a cursor stands relative to its session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// No usable session for the requested collection; plan one
    Uninitialized,
    /// Waiting for an answer to the card at this index
    Active(usize),
    /// Every card has been answered
    Exhausted,
    /// The stored session no longer matches what was submitted
    Inconsistent,
}

/// "cards done / total" for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProgress {
    pub done: usize,
    pub total: usize,
}

/// Ephemeral per-user study session for one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub collection_id: Uuid,
    pub card_ids: Vec<Uuid>,
    pub index: usize,
}

impl SessionState {
    pub fn new(collection_id: Uuid, card_ids: Vec<Uuid>) -> Self {
        Self {
            collection_id,
            card_ids,
            index: 0,
        }
    }

    pub fn state(&self) -> CursorState {
        if self.index >= self.card_ids.len() {
            CursorState::Exhausted
        } else {
            CursorState::Active(self.index)
        }
    }

    /// Id of the card waiting for an answer
    pub fn current(&self) -> Option<Uuid> {
        self.card_ids.get(self.index).copied()
    }

    pub fn progress(&self) -> SessionProgress {
        let total = self.card_ids.len();
        SessionProgress {
            done: self.index.min(total),
            total,
        }
    }

    /// Whether this stored session can serve `collection_id` without replanning
    pub fn is_usable_for(&self, collection_id: Uuid) -> bool {
        self.collection_id == collection_id && !self.card_ids.is_empty()
    }

    /// Whether this session is for `collection_id` and still waiting for an answer
    pub fn is_active_for(&self, collection_id: Uuid) -> bool {
        matches!(cursor_state(Some(self), collection_id), CursorState::Active(_))
    }
}

/// State of an optional stored session with respect to `collection_id`
pub fn cursor_state(stored: Option<&SessionState>, collection_id: Uuid) -> CursorState {
    match stored {
        Some(session) if session.is_usable_for(collection_id) => session.state(),
        _ => CursorState::Uninitialized,
    }
}

/// Reuse the stored session when it still serves `collection_id`, otherwise
/// plan a fresh one starting at index 0.
pub fn ensure_session<E>(
    stored: Option<SessionState>,
    collection_id: Uuid,
    plan: impl FnOnce() -> Result<Vec<Uuid>, E>,
) -> Result<SessionState, E> {
    match stored {
        Some(session) if session.is_active_for(collection_id) => Ok(session),
        _ => Ok(SessionState::new(collection_id, plan()?)),
    }
}

/// Outcome of submitting an answer to a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// The cursor moved on; the session continues
    Next(SessionState),
    /// The answered card was the last one; the session is cleared
    Exhausted,
    /// The answered card was not the one expected; the session is cleared
    Inconsistent,
}

impl Advance {
    pub fn state(&self) -> CursorState {
        match self {
            Advance::Next(session) => session.state(),
            Advance::Exhausted => CursorState::Exhausted,
            Advance::Inconsistent => CursorState::Inconsistent,
        }
    }
}

/// Move the cursor past `answered`.
///
/// The answered card must be the one at the current index; anything else
/// (including answering past the end) makes the session inconsistent.
pub fn advance(mut session: SessionState, answered: Uuid) -> Advance {
    if session.current() != Some(answered) {
        return Advance::Inconsistent;
    }

    session.index += 1;
    match session.state() {
        CursorState::Active(_) => Advance::Next(session),
        _ => Advance::Exhausted,
    }
}
