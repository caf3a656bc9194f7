//! Read access to an extracted Anki collection database
//!
//! Only two tables matter here: `col`, whose single row carries the note-type
//! catalog as JSON in its `models` column, and `notes`, where each row holds
//! a note-type id (`mid`) and the note's fields packed into `flds`.

use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection, OpenFlags, OptionalExtension};
use serde::Deserialize;

use super::error::{ImportError, Result};

/// One field definition inside a note type
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDef {
    pub name: String,
}

/// A note type as stored in the `models` catalog
#[derive(Debug, Clone, Deserialize)]
pub struct NoteTypeDef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub flds: Vec<FieldDef>,
}

/// Catalog of note types keyed by their id, as it appears in the JSON
pub type SchemaCatalog = BTreeMap<String, NoteTypeDef>;

/// A note row: its note-type id and its packed field string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawNote {
    pub note_type_id: i64,
    pub fields: String,
}

/// Read-only handle on an extracted collection database
pub struct CollectionReader {
    conn: Connection,
}

impl CollectionReader {
    /// Open the database and make sure it looks like an Anki collection
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let has_col: bool = conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'col')",
            [],
            |row| row.get(0),
        )?;
        if !has_col {
            return Err(ImportError::CorruptDatabase(
                "no 'col' table was found".to_string(),
            ));
        }

        Ok(Self { conn })
    }

    fn col_has_column(&self, column: &str) -> Result<bool> {
        let mut stmt = self.conn.prepare("PRAGMA table_info(col)")?;
        let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
        for name in names {
            if name? == column {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Read and parse the note-type catalog from the `col` row
    pub fn read_schema_catalog(&self) -> Result<SchemaCatalog> {
        if !self.col_has_column("models")? {
            return Err(ImportError::MissingSchema("'models' column is missing"));
        }

        let raw: Option<Option<Vec<u8>>> = self
            .conn
            .query_row("SELECT models FROM col LIMIT 1", [], |row| {
                Ok(match row.get_ref(0)? {
                    ValueRef::Null => None,
                    ValueRef::Text(bytes) | ValueRef::Blob(bytes) => Some(bytes.to_vec()),
                    ValueRef::Integer(i) => Some(i.to_string().into_bytes()),
                    ValueRef::Real(f) => Some(f.to_string().into_bytes()),
                })
            })
            .optional()?;

        let raw = match raw {
            None => return Err(ImportError::MissingSchema("'col' table is empty")),
            Some(None) => return Err(ImportError::MissingSchema("'models' column is NULL")),
            Some(Some(bytes)) => bytes,
        };
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Err(ImportError::MissingSchema("'models' column is empty"));
        }

        let catalog: SchemaCatalog = serde_json::from_slice(&raw)
            .map_err(|e| ImportError::MalformedSchema(e.to_string()))?;

        log::debug!("Schema catalog lists {} note types", catalog.len());
        Ok(catalog)
    }

    /// Notes whose note type is one of `note_type_ids`, in note id order
    pub fn notes_for(&self, note_type_ids: &[i64]) -> Result<Vec<RawNote>> {
        if note_type_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; note_type_ids.len()].join(",");
        let mut stmt = self.conn.prepare(&format!(
            "SELECT mid, flds FROM notes WHERE mid IN ({placeholders}) ORDER BY id ASC"
        ))?;

        let rows = stmt.query_map(params_from_iter(note_type_ids.iter()), |row| {
            Ok(RawNote {
                note_type_id: row.get(0)?,
                fields: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            })
        })?;

        let notes = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anki::fixtures::{models_json, CollectionFixture};
    use crate::anki::ImportErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_reads_catalog_and_notes() {
        let dir = TempDir::new().unwrap();
        let path = CollectionFixture::new()
            .models(&models_json(&[(1001, &["Hanzi", "Pinyin", "English"][..])]))
            .note(1001, "你\x1fnǐ\x1fyou")
            .note(2002, "ignored")
            .note(1001, "好\x1fhǎo\x1fgood")
            .write(dir.path());

        let reader = CollectionReader::open(&path).unwrap();
        let catalog = reader.read_schema_catalog().unwrap();
        let fields: Vec<&str> = catalog["1001"].flds.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, vec!["Hanzi", "Pinyin", "English"]);

        let notes = reader.notes_for(&[1001]).unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].fields, "你\x1fnǐ\x1fyou");
        assert!(reader.notes_for(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_missing_col_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.sqlite");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE notes (id INTEGER PRIMARY KEY, mid INTEGER, flds TEXT);")
            .unwrap();

        let err = CollectionReader::open(&path).err().unwrap();
        assert_eq!(err.kind(), ImportErrorKind::CorruptDatabase);
    }

    #[test]
    fn test_not_a_database() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("garbage.sqlite");
        std::fs::write(&path, vec![0x42u8; 4096]).unwrap();

        let err = CollectionReader::open(&path).err().unwrap();
        assert_eq!(err.kind(), ImportErrorKind::CorruptDatabase);
    }

    #[test]
    fn test_empty_col_table() {
        let dir = TempDir::new().unwrap();
        let path = CollectionFixture::new().without_col_row().write(dir.path());

        let err = CollectionReader::open(&path).unwrap().read_schema_catalog().unwrap_err();
        assert_eq!(err.kind(), ImportErrorKind::MissingSchema);
    }

    #[test]
    fn test_missing_models_column() {
        let dir = TempDir::new().unwrap();
        let path = CollectionFixture::new().without_models_column().write(dir.path());

        let err = CollectionReader::open(&path).unwrap().read_schema_catalog().unwrap_err();
        assert_eq!(err.kind(), ImportErrorKind::MissingSchema);
    }

    #[test]
    fn test_null_and_blank_models() {
        let dir = TempDir::new().unwrap();

        let path = CollectionFixture::new().null_models().write(dir.path());
        let err = CollectionReader::open(&path).unwrap().read_schema_catalog().unwrap_err();
        assert_eq!(err.kind(), ImportErrorKind::MissingSchema);

        let other = TempDir::new().unwrap();
        let path = CollectionFixture::new().models("  ").write(other.path());
        let err = CollectionReader::open(&path).unwrap().read_schema_catalog().unwrap_err();
        assert_eq!(err.kind(), ImportErrorKind::MissingSchema);
    }

    #[test]
    fn test_malformed_models() {
        let dir = TempDir::new().unwrap();
        let path = CollectionFixture::new().models("{not json").write(dir.path());

        let err = CollectionReader::open(&path).unwrap().read_schema_catalog().unwrap_err();
        assert_eq!(err.kind(), ImportErrorKind::MalformedSchema);
    }
}
