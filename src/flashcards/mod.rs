//! Flashcards and spaced repetition
//!
//! This module provides:
//! - Collection and card models
//! - The review scheduler (streak-squared intervals, capped)
//! - Session planning and the session cursor
//! - SQLite-backed storage

pub mod algorithm;
pub mod models;
pub mod session;
pub mod storage;

pub use models::*;
pub use session::{CursorState, SessionLimits, SessionProgress, SessionState};
pub use storage::{FlashcardStorage, FlashcardStorageError};
