use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why an Anki package import failed. Every variant is fatal to the attempt.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Invalid Anki package: the uploaded file is not a valid .apkg (zip) file")]
    InvalidArchive(#[source] zip::result::ZipError),

    #[error("Invalid Anki package: missing the main collection database (collection.anki21 or collection.anki2)")]
    MissingDatabase,

    #[error("Invalid Anki package: the collection database is unreadable ({0})")]
    CorruptDatabase(String),

    #[error("Invalid Anki package: {0}")]
    MissingSchema(&'static str),

    #[error("Invalid Anki package: 'models' is not valid JSON ({0})")]
    MalformedSchema(String),

    #[error(
        "No compatible Anki note types found. Ensure your notes have fields for \
         Hanzi/Character, Pinyin, and English/Translation"
    )]
    NoCompatibleSchema,

    #[error(
        "No cards could be created for deck '{collection_name}'. All notes were missing \
         required fields or did not match a field mapping"
    )]
    EmptyImportResult { collection_name: String },

    #[error("An unexpected error occurred while processing the Anki deck")]
    ImportFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, ImportError>;

/// Stable, serializable name for each [`ImportError`] variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportErrorKind {
    InvalidArchive,
    MissingDatabase,
    CorruptDatabase,
    MissingSchema,
    MalformedSchema,
    NoCompatibleSchema,
    EmptyImportResult,
    ImportFailed,
}

impl ImportErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArchive => "invalid_archive",
            Self::MissingDatabase => "missing_database",
            Self::CorruptDatabase => "corrupt_database",
            Self::MissingSchema => "missing_schema",
            Self::MalformedSchema => "malformed_schema",
            Self::NoCompatibleSchema => "no_compatible_schema",
            Self::EmptyImportResult => "empty_import_result",
            Self::ImportFailed => "import_failed",
        }
    }
}

impl std::fmt::Display for ImportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ImportError {
    pub fn kind(&self) -> ImportErrorKind {
        match self {
            Self::InvalidArchive(_) => ImportErrorKind::InvalidArchive,
            Self::MissingDatabase => ImportErrorKind::MissingDatabase,
            Self::CorruptDatabase(_) => ImportErrorKind::CorruptDatabase,
            Self::MissingSchema(_) => ImportErrorKind::MissingSchema,
            Self::MalformedSchema(_) => ImportErrorKind::MalformedSchema,
            Self::NoCompatibleSchema => ImportErrorKind::NoCompatibleSchema,
            Self::EmptyImportResult { .. } => ImportErrorKind::EmptyImportResult,
            Self::ImportFailed(_) => ImportErrorKind::ImportFailed,
        }
    }

    /// Wrap an unexpected cause. The cause is logged here and kept as the
    /// error source; the user-facing message stays generic.
    pub fn failed(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        let cause = cause.into();
        log::error!("Unexpected error during Anki import: {}", cause);
        Self::ImportFailed(cause)
    }
}

impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        Self::CorruptDatabase(err.to_string())
    }
}
