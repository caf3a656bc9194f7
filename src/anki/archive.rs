//! Locating and extracting the collection database from an `.apkg` archive

use std::io::{Cursor, Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use zip::ZipArchive;

use super::error::{ImportError, Result};

/// Accepted database entry names, in order of preference. Packages written
/// by newer Anki versions ship `collection.anki21` next to a placeholder
/// `collection.anki2`.
pub const DATABASE_FILENAMES: [&str; 2] = ["collection.anki21", "collection.anki2"];

/// A collection database extracted to scratch space.
///
/// The file is removed when this value is dropped, whichever way the import
/// ends.
#[derive(Debug)]
pub struct ExtractedDatabase {
    entry_name: String,
    file: NamedTempFile,
}

impl ExtractedDatabase {
    /// Name of the archive entry the database came from
    pub fn entry_name(&self) -> &str {
        &self.entry_name
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

fn base_name(entry: &str) -> &str {
    entry.rsplit(['/', '\\']).next().unwrap_or(entry)
}

/// Pick the archive entry holding the collection database
pub fn find_database_entry<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let names: Vec<&str> = names.into_iter().collect();
    DATABASE_FILENAMES
        .iter()
        .find_map(|wanted| names.iter().copied().find(|name| base_name(name) == *wanted))
}

/// Extract the collection database from raw `.apkg` bytes into a fresh
/// temporary file under `scratch_dir`.
pub fn extract_database(raw: &[u8], scratch_dir: &Path) -> Result<ExtractedDatabase> {
    let mut archive = ZipArchive::new(Cursor::new(raw)).map_err(ImportError::InvalidArchive)?;

    let entry_name = find_database_entry(archive.file_names())
        .map(str::to_string)
        .ok_or(ImportError::MissingDatabase)?;

    log::debug!("Extracting collection database from archive entry {}", entry_name);

    let mut contents = Vec::new();
    {
        let mut entry = archive
            .by_name(&entry_name)
            .map_err(ImportError::InvalidArchive)?;
        entry
            .read_to_end(&mut contents)
            .map_err(|e| ImportError::InvalidArchive(e.into()))?;
    }

    let mut file = tempfile::Builder::new()
        .prefix("anki-import-")
        .suffix(".sqlite")
        .tempfile_in(scratch_dir)
        .map_err(ImportError::failed)?;
    file.write_all(&contents).map_err(ImportError::failed)?;
    file.flush().map_err(ImportError::failed)?;

    Ok(ExtractedDatabase { entry_name, file })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anki::fixtures::zip_entries;
    use crate::anki::ImportErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_find_database_entry() {
        assert_eq!(
            find_database_entry(["media", "collection.anki2"]),
            Some("collection.anki2")
        );
        assert_eq!(
            find_database_entry(["collection.anki2", "deck/collection.anki21"]),
            Some("deck/collection.anki21")
        );
        assert_eq!(find_database_entry(["Collection.anki2", "other.anki2"]), None);
        assert_eq!(find_database_entry(["collection.anki2/"]), None);
    }

    #[test]
    fn test_extracts_and_cleans_up() {
        let scratch = TempDir::new().unwrap();
        let raw = zip_entries(&[
            ("media", b"{}".as_slice()),
            ("collection.anki2", b"sqlite bytes".as_slice()),
        ]);

        let path = {
            let extracted = extract_database(&raw, scratch.path()).unwrap();
            assert_eq!(extracted.entry_name(), "collection.anki2");
            assert_eq!(std::fs::read(extracted.path()).unwrap(), b"sqlite bytes");
            extracted.path().to_path_buf()
        };

        assert!(!path.exists());
    }

    #[test]
    fn test_not_a_zip() {
        let scratch = TempDir::new().unwrap();
        let err = extract_database(b"definitely not a zip", scratch.path()).unwrap_err();
        assert_eq!(err.kind(), ImportErrorKind::InvalidArchive);
    }

    #[test]
    fn test_missing_database() {
        let scratch = TempDir::new().unwrap();
        let raw = zip_entries(&[("media", b"{}".as_slice()), ("notes.anki2", b"".as_slice())]);

        let err = extract_database(&raw, scratch.path()).unwrap_err();
        assert_eq!(err.kind(), ImportErrorKind::MissingDatabase);
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }
}
