//! Anki package (.apkg) import
//!
//! Converts the notes of an Anki package into a new card collection. Only
//! note types that expose a character, a pronunciation and a translation
//! field are used.

pub mod archive;
pub mod database;
pub mod error;
pub mod import;
pub mod materialize;
pub mod schema;

#[cfg(test)]
pub(crate) mod fixtures;

pub use error::{ImportError, ImportErrorKind};
pub use import::{collection_name, ImportOutcome, PackageImporter};
pub use schema::{Role, RoleIndices, SchemaVariant};
