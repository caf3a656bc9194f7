//! Study session commands
//!
//! The host keeps the [`SessionState`] between calls (a browser session, a
//! CLI loop) and passes it back in. Outcomes tell it what to store next.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::flashcards::algorithm;
use crate::flashcards::session::{advance, build_session, ensure_session, Advance};
use crate::flashcards::{
    Card, FlashcardStorage, FlashcardStorageError, SessionLimits, SessionProgress, SessionState,
};

use super::flashcard::{owned_card, require_answer, AnswerInput};
use super::{owned_collection, CommandResult};

/// What to show after starting or resuming a session
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StudyStep {
    Card {
        session: SessionState,
        card: Card,
        progress: SessionProgress,
    },
    /// Nothing to study right now; drop any stored session
    Finished,
}

/// Result of answering the current card of a session
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnswerOutcome {
    Next {
        answered: Card,
        session: SessionState,
        card: Card,
        progress: SessionProgress,
    },
    /// That was the last card; drop the stored session
    Completed { answered: Card },
    /// The stored session no longer matches; drop it and begin again
    Restart { collection_id: Uuid },
}

impl AnswerOutcome {
    /// Session state the host should keep, if any
    pub fn session(&self) -> Option<&SessionState> {
        match self {
            AnswerOutcome::Next { session, .. } => Some(session),
            _ => None,
        }
    }
}

fn plan(
    storage: &FlashcardStorage,
    collection_id: Uuid,
    limits: SessionLimits,
    now: DateTime<Utc>,
) -> CommandResult<Vec<Uuid>> {
    let cards = storage.list_cards(collection_id)?;
    let planned = build_session(&cards, now, limits.max_new, limits.max_review);
    log::debug!(
        "Planned session of {} cards for collection {}",
        planned.len(),
        collection_id
    );
    Ok(planned.into_iter().map(|c| c.id).collect())
}

/// Load a session card; `None` if it is gone or moved to another collection
fn session_card(
    storage: &FlashcardStorage,
    card_id: Uuid,
    collection_id: Uuid,
) -> CommandResult<Option<Card>> {
    match storage.get_card(card_id) {
        Ok(card) if card.collection_id == collection_id => Ok(Some(card)),
        Ok(_) | Err(FlashcardStorageError::CardNotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Start or resume studying a collection.
///
/// A stored session for the same collection is resumed as is. If its current
/// card has disappeared the session is replanned once.
pub fn begin_session(
    storage: &FlashcardStorage,
    stored: Option<SessionState>,
    owner: &str,
    collection_id: Uuid,
    limits: SessionLimits,
    now: DateTime<Utc>,
) -> CommandResult<StudyStep> {
    let collection = owned_collection(storage, owner, collection_id)?;
    let mut session = ensure_session(stored, collection.id, || {
        plan(storage, collection.id, limits, now)
    })?;
    let mut replanned = false;

    loop {
        let Some(card_id) = session.current() else {
            return Ok(StudyStep::Finished);
        };

        match session_card(storage, card_id, collection.id)? {
            Some(card) => {
                return Ok(StudyStep::Card {
                    progress: session.progress(),
                    session,
                    card,
                })
            }
            None if !replanned => {
                log::warn!("Session card {} is gone, replanning", card_id);
                session = SessionState::new(collection.id, plan(storage, collection.id, limits, now)?);
                replanned = true;
            }
            None => return Ok(StudyStep::Finished),
        }
    }
}

/// Answer the current card of a session and move to the next one
pub fn answer_card(
    storage: &FlashcardStorage,
    stored: Option<SessionState>,
    owner: &str,
    card_id: Uuid,
    answer: Option<&AnswerInput>,
    now: DateTime<Utc>,
) -> CommandResult<AnswerOutcome> {
    let is_correct = require_answer(answer)?;
    let card = owned_card(storage, owner, card_id)?;
    let collection_id = card.collection_id;

    // A restart replans the deck the session was for, not the answered card's
    let session = match stored {
        Some(session) if session.is_active_for(collection_id) => session,
        Some(session) => {
            log::warn!(
                "Card {} is not part of the session for collection {}",
                card.id,
                session.collection_id
            );
            return Ok(AnswerOutcome::Restart {
                collection_id: session.collection_id,
            });
        }
        None => {
            log::debug!("No active session for collection {}", collection_id);
            return Ok(AnswerOutcome::Restart { collection_id });
        }
    };
    if session.current() != Some(card.id) {
        log::warn!("Answer for card {} does not match the session cursor", card.id);
        return Ok(AnswerOutcome::Restart { collection_id });
    }

    let answered = algorithm::update_performance(&card, is_correct, now);
    storage.update_card_state(&answered)?;

    match advance(session, card.id) {
        Advance::Next(session) => {
            let next = match session.current() {
                Some(next_id) => session_card(storage, next_id, collection_id)?,
                None => None,
            };
            match next {
                Some(card) => Ok(AnswerOutcome::Next {
                    answered,
                    progress: session.progress(),
                    session,
                    card,
                }),
                None => Ok(AnswerOutcome::Restart { collection_id }),
            }
        }
        Advance::Exhausted => {
            log::info!("Session for collection {} completed", collection_id);
            Ok(AnswerOutcome::Completed { answered })
        }
        Advance::Inconsistent => Ok(AnswerOutcome::Restart { collection_id }),
    }
}
