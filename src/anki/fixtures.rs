//! Builders for synthetic `.apkg` packages used across the import tests

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// A `models` JSON catalog with one note type per `(id, field names)`
pub fn models_json(note_types: &[(i64, &[&str])]) -> String {
    let catalog: serde_json::Map<String, serde_json::Value> = note_types
        .iter()
        .map(|(id, fields)| {
            let flds: Vec<serde_json::Value> = fields
                .iter()
                .enumerate()
                .map(|(ord, name)| serde_json::json!({ "name": name, "ord": ord }))
                .collect();
            (
                id.to_string(),
                serde_json::json!({ "id": id, "name": format!("Type {}", id), "flds": flds }),
            )
        })
        .collect();
    serde_json::Value::Object(catalog).to_string()
}

/// Zip the given `(name, contents)` entries in memory
pub fn zip_entries(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, contents) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(contents).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

enum ModelsValue {
    Text(String),
    Null,
}

/// Builder for a minimal Anki collection database
pub struct CollectionFixture {
    models: ModelsValue,
    col_row: bool,
    models_column: bool,
    notes: Vec<(i64, String)>,
}

impl CollectionFixture {
    pub fn new() -> Self {
        Self {
            models: ModelsValue::Text("{}".to_string()),
            col_row: true,
            models_column: true,
            notes: Vec::new(),
        }
    }

    pub fn models(mut self, models: &str) -> Self {
        self.models = ModelsValue::Text(models.to_string());
        self
    }

    pub fn null_models(mut self) -> Self {
        self.models = ModelsValue::Null;
        self
    }

    pub fn without_col_row(mut self) -> Self {
        self.col_row = false;
        self
    }

    pub fn without_models_column(mut self) -> Self {
        self.models_column = false;
        self
    }

    pub fn note(mut self, note_type_id: i64, fields: &str) -> Self {
        self.notes.push((note_type_id, fields.to_string()));
        self
    }

    /// Write the database to `dir/collection.anki2` and return its path
    pub fn write(&self, dir: &Path) -> PathBuf {
        let path = dir.join("collection.anki2");
        let conn = Connection::open(&path).unwrap();

        if self.models_column {
            conn.execute_batch(
                "CREATE TABLE col (id INTEGER PRIMARY KEY, crt INTEGER NOT NULL DEFAULT 0, models TEXT);",
            )
            .unwrap();
            if self.col_row {
                let models = match &self.models {
                    ModelsValue::Text(text) => Some(text.as_str()),
                    ModelsValue::Null => None,
                };
                conn.execute("INSERT INTO col (id, models) VALUES (1, ?1)", params![models])
                    .unwrap();
            }
        } else {
            conn.execute_batch(
                "CREATE TABLE col (id INTEGER PRIMARY KEY, crt INTEGER NOT NULL DEFAULT 0);
                 INSERT INTO col (id) VALUES (1);",
            )
            .unwrap();
        }

        conn.execute_batch(
            "CREATE TABLE notes (
                id INTEGER PRIMARY KEY,
                guid TEXT NOT NULL DEFAULT '',
                mid INTEGER NOT NULL,
                flds TEXT NOT NULL
            );",
        )
        .unwrap();
        for (mid, flds) in &self.notes {
            conn.execute("INSERT INTO notes (mid, flds) VALUES (?1, ?2)", params![mid, flds])
                .unwrap();
        }

        path
    }

    /// Package the database as an `.apkg` with the given entry name
    pub fn package_as(&self, entry_name: &str) -> Vec<u8> {
        let dir = tempfile::TempDir::new().unwrap();
        let db = std::fs::read(self.write(dir.path())).unwrap();
        zip_entries(&[(entry_name, db.as_slice()), ("media", b"{}".as_slice())])
    }

    pub fn package(&self) -> Vec<u8> {
        self.package_as("collection.anki2")
    }
}
