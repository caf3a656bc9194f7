//! Matching Anki note types to the three card roles
//!
//! A note type is usable when, for each role, at least one of its field
//! names (lower-cased) is an accepted alias. Scanning goes in field order
//! and the first matching field wins.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::database::SchemaCatalog;
use super::error::{ImportError, Result};

/// Semantic role of a card field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Character,
    Pronunciation,
    Translation,
}

impl Role {
    /// Lower-case field names accepted for this role
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Role::Character => &[
                "hanzi",
                "character",
                "simplified",
                "zi",
                "chinese",
                "expression",
                "front",
            ],
            Role::Pronunciation => &["pinyin", "pronunciation", "reading"],
            Role::Translation => &["english", "translation", "meaning", "definition", "back"],
        }
    }
}

/// Where each role sits in a note type's field list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleIndices {
    pub character: usize,
    pub pronunciation: usize,
    pub translation: usize,
}

impl RoleIndices {
    pub fn get(&self, role: Role) -> usize {
        match role {
            Role::Character => self.character,
            Role::Pronunciation => self.pronunciation,
            Role::Translation => self.translation,
        }
    }
}

/// A note type that exposes all three roles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaVariant {
    pub note_type_id: i64,
    pub roles: RoleIndices,
}

/// Accepted note types keyed by note-type id
pub type SchemaMap = HashMap<i64, SchemaVariant>;

/// Index of the first field whose lower-cased name is an alias of `role`
fn find_role<S: AsRef<str>>(field_names: &[S], role: Role) -> Option<usize> {
    field_names.iter().position(|name| {
        let lowered = name.as_ref().to_lowercase();
        role.aliases().iter().any(|alias| *alias == lowered)
    })
}

/// Resolve all three roles for one note type's ordered field names
pub fn match_fields<S: AsRef<str>>(field_names: &[S]) -> Option<RoleIndices> {
    Some(RoleIndices {
        character: find_role(field_names, Role::Character)?,
        pronunciation: find_role(field_names, Role::Pronunciation)?,
        translation: find_role(field_names, Role::Translation)?,
    })
}

/// Build the field-index map for every usable note type.
///
/// Input is any `id -> ordered field names` listing. Fails with
/// `NoCompatibleSchema` when nothing matches.
pub fn match_schemas<'a, I, S>(note_types: I) -> Result<SchemaMap>
where
    I: IntoIterator<Item = (&'a str, &'a [S])>,
    S: AsRef<str> + 'a,
{
    let mut accepted = SchemaMap::new();

    for (id, field_names) in note_types {
        let Some(roles) = match_fields(field_names) else {
            log::debug!(
                "Note type {} rejected, fields: {:?}",
                id,
                field_names.iter().map(AsRef::<str>::as_ref).collect::<Vec<_>>()
            );
            continue;
        };

        let Ok(note_type_id) = id.trim().parse::<i64>() else {
            log::warn!("Skipping note type with non-numeric id '{}'", id);
            continue;
        };

        log::debug!("Note type {} accepted: {:?}", note_type_id, roles);
        accepted.insert(note_type_id, SchemaVariant { note_type_id, roles });
    }

    if accepted.is_empty() {
        return Err(ImportError::NoCompatibleSchema);
    }
    Ok(accepted)
}

/// [`match_schemas`] over a parsed `models` catalog
pub fn match_catalog(catalog: &SchemaCatalog) -> Result<SchemaMap> {
    let listing: Vec<(&str, Vec<&str>)> = catalog
        .iter()
        .map(|(id, def)| (id.as_str(), def.flds.iter().map(|f| f.name.as_str()).collect()))
        .collect();

    match_schemas(listing.iter().map(|(id, names)| (*id, names.as_slice())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anki::ImportErrorKind;

    #[test]
    fn test_basic_match() {
        let roles = match_fields(&["Hanzi", "Pinyin", "English"]).unwrap();
        assert_eq!(
            roles,
            RoleIndices {
                character: 0,
                pronunciation: 1,
                translation: 2
            }
        );
    }

    #[test]
    fn test_case_insensitive_and_reordered() {
        let roles = match_fields(&["Notes", "MEANING", "Reading", "Expression"]).unwrap();
        assert_eq!(roles.get(Role::Character), 3);
        assert_eq!(roles.get(Role::Pronunciation), 2);
        assert_eq!(roles.get(Role::Translation), 1);
    }

    #[test]
    fn test_first_field_in_order_wins() {
        // "front" comes before "hanzi" in the field list even though "hanzi"
        // is listed first among the aliases
        let roles = match_fields(&["Front", "Hanzi", "Pinyin", "Back", "English"]).unwrap();
        assert_eq!(roles.character, 0);
        assert_eq!(roles.translation, 3);
    }

    #[test]
    fn test_missing_pronunciation_rejects() {
        assert_eq!(match_fields(&["Hanzi", "English"]), None);

        let names = ["Hanzi".to_string(), "English".to_string()];
        let err = match_schemas([("42", names.as_slice())]).unwrap_err();
        assert_eq!(err.kind(), ImportErrorKind::NoCompatibleSchema);
    }

    #[test]
    fn test_only_matching_types_kept() {
        let good = ["Simplified", "Pinyin", "Definition"];
        let bad = ["Front", "Back"];
        let map = match_schemas([("1", good.as_slice()), ("2", bad.as_slice())]).unwrap();

        assert_eq!(map.len(), 1);
        assert_eq!(map[&1].note_type_id, 1);
    }

    #[test]
    fn test_non_numeric_ids_skipped() {
        let fields = ["Hanzi", "Pinyin", "English"];
        let map = match_schemas([("abc", fields.as_slice()), ("7", fields.as_slice())]).unwrap();
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn test_match_catalog() {
        let catalog: SchemaCatalog = serde_json::from_str(
            r#"{"1700000000001": {"name": "Chinese", "flds": [{"name": "Hanzi"}, {"name": "Pinyin"}, {"name": "English"}]},
                "1700000000002": {"name": "Basic", "flds": [{"name": "Front"}, {"name": "Back"}]}}"#,
        )
        .unwrap();

        let map = match_catalog(&catalog).unwrap();
        assert!(map.contains_key(&1_700_000_000_001));
        assert!(!map.contains_key(&1_700_000_000_002));
    }
}
