//! Error types for hmdb-me
//!
//! All variants are song- or artist-scoped: the batch loops log them and
//! move on to the next entity. Only configuration and database-open
//! failures (reported through `hmdb_common::Error` before a batch starts)
//! abort a run.

use thiserror::Error;

/// Errors raised while enriching a single song
#[derive(Debug, Error)]
pub enum EnrichError {
    /// Search provider unreachable or returned garbage; the song is left
    /// unenriched and the batch continues
    #[error("search unavailable: {0}")]
    SearchUnavailable(String),

    /// Search succeeded but no candidate cleared the fuzzy-match bar
    #[error("no acceptable match for '{title}' by '{artist}'")]
    NoAcceptableMatch { title: String, artist: String },

    /// Database error during persistence
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for song-scoped enrichment operations
pub type EnrichResult<T> = std::result::Result<T, EnrichError>;
