//! Turning raw note rows into card drafts
//!
//! Bad notes are skipped, never fatal. Each skip carries a reason that is
//! logged at debug level and otherwise dropped.

use std::fmt;

use crate::flashcards::models::CardDraft;

use super::database::RawNote;
use super::schema::{Role, SchemaMap};

/// Separator between fields in a note's packed `flds` string
pub const FIELD_SEPARATOR: char = '\x1f';

/// Why a note produced no card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UnknownNoteType(i64),
    FieldOutOfRange { role: Role, index: usize, len: usize },
    EmptyCharacter,
    EmptyPronunciation,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnknownNoteType(id) => write!(f, "note type {} has no field mapping", id),
            SkipReason::FieldOutOfRange { role, index, len } => write!(
                f,
                "{:?} field index {} out of range for {} fields",
                role, index, len
            ),
            SkipReason::EmptyCharacter => f.write_str("character field is empty"),
            SkipReason::EmptyPronunciation => f.write_str("pronunciation field is empty"),
        }
    }
}

/// Build a card draft from one note
pub fn materialize_note(note: &RawNote, schemas: &SchemaMap) -> Result<CardDraft, SkipReason> {
    let variant = schemas
        .get(&note.note_type_id)
        .ok_or(SkipReason::UnknownNoteType(note.note_type_id))?;

    let fields: Vec<&str> = note.fields.split(FIELD_SEPARATOR).collect();
    let value = |role: Role| -> Result<String, SkipReason> {
        let index = variant.roles.get(role);
        fields
            .get(index)
            .map(|v| v.trim().to_string())
            .ok_or(SkipReason::FieldOutOfRange {
                role,
                index,
                len: fields.len(),
            })
    };

    let character = value(Role::Character)?;
    let pronunciation = value(Role::Pronunciation)?;
    let translation = value(Role::Translation)?;

    if character.is_empty() {
        return Err(SkipReason::EmptyCharacter);
    }
    if pronunciation.is_empty() {
        return Err(SkipReason::EmptyPronunciation);
    }

    Ok(CardDraft {
        character,
        pronunciation,
        translation,
    })
}

/// Lazily materialize every note, keeping the skip reason for rejects
pub fn materialize<'a, I>(
    notes: I,
    schemas: &'a SchemaMap,
) -> impl Iterator<Item = Result<CardDraft, SkipReason>> + 'a
where
    I: IntoIterator<Item = &'a RawNote>,
    I::IntoIter: 'a,
{
    notes.into_iter().map(move |note| materialize_note(note, schemas))
}

/// Collect the drafts that survived, logging each skipped note
pub fn collect_drafts<'a, I>(notes: I, schemas: &'a SchemaMap) -> Vec<CardDraft>
where
    I: IntoIterator<Item = &'a RawNote>,
    I::IntoIter: 'a,
{
    let mut skipped = 0usize;
    let drafts: Vec<CardDraft> = materialize(notes, schemas)
        .filter_map(|result| match result {
            Ok(draft) => Some(draft),
            Err(reason) => {
                skipped += 1;
                log::debug!("Skipping note: {}", reason);
                None
            }
        })
        .collect();

    if skipped > 0 {
        log::info!("Skipped {} notes without usable fields", skipped);
    }
    drafts
}
