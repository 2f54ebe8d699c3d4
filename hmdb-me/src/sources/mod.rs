//! External metadata provider clients
//!
//! One client per provider, each owning its own HTTP client, credentials,
//! and rate limiter. Genre providers implement [`GenreSource`] so the
//! aggregator can query whichever subset is configured.

pub mod chartmetric;
pub mod genius;
pub mod lastfm;
pub mod spotify;

pub use chartmetric::ChartmetricClient;
pub use genius::GeniusClient;
pub use lastfm::LastFmClient;
pub use spotify::SpotifyClient;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from one provider call
///
/// All variants are provider-scoped: a failing provider degrades the
/// operation that needed it, never the batch.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network-level failure (DNS, connect, timeout)
    #[error("network error: {0}")]
    Network(String),

    /// Provider returned a non-success status
    #[error("API error: {0}")]
    Api(String),

    /// Response body did not match the expected shape
    #[error("parse error: {0}")]
    Parse(String),

    /// Provider has no data for the queried entity
    #[error("not found: {0}")]
    NotFound(String),
}

/// Provider category, carrying the fixed reliability weight used by genre
/// aggregation
///
/// The weights are a deliberate business rule: they are never renormalized
/// when a source is missing, so incomplete data lowers achievable
/// confidence instead of inflating the remaining sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Streaming-service algorithmic classification
    Algorithmic,
    /// Community tagging consensus
    Community,
    /// Industry data provider
    Industry,
    /// Previously stored local data
    Fallback,
}

impl SourceKind {
    /// Fixed reliability weight contributed to genre aggregation
    pub fn weight(&self) -> f64 {
        match self {
            SourceKind::Algorithmic => 0.40,
            SourceKind::Community => 0.30,
            SourceKind::Industry => 0.20,
            SourceKind::Fallback => 0.10,
        }
    }

    /// Tie-break priority (lower wins)
    pub fn priority(&self) -> u8 {
        match self {
            SourceKind::Algorithmic => 0,
            SourceKind::Community => 1,
            SourceKind::Industry => 2,
            SourceKind::Fallback => 3,
        }
    }
}

/// A provider that can return raw genre labels for an artist
#[async_trait]
pub trait GenreSource: Send + Sync {
    /// Short provider name used in logs and stored provenance
    fn name(&self) -> &'static str;

    /// Provider category (determines aggregation weight and priority)
    fn kind(&self) -> SourceKind;

    /// Raw genre labels for the artist, in provider order
    async fn artist_genres(&self, artist: &str) -> Result<Vec<String>, SourceError>;
}
