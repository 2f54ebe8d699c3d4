//! Lyrics/metadata provider client (Genius)
//!
//! Two endpoints are used: `/search` for candidate lookup and `/songs/{id}`
//! for the full credit roster of an accepted match. Both authenticate with
//! a bearer token and respect a fixed minimum inter-call delay.

use crate::sources::SourceError;
use crate::util::RateLimiter;
use reqwest::{header, Client};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Genius API base URL
const GENIUS_API_URL: &str = "https://api.genius.com";

/// Default timeout for API requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Minimum delay between consecutive API calls
const MIN_CALL_INTERVAL: Duration = Duration::from_millis(500);

/// Genius API client
pub struct GeniusClient {
    http_client: Client,
    rate_limiter: RateLimiter,
}

impl GeniusClient {
    /// Create a client holding the given bearer token
    pub fn new(access_token: &str) -> Result<Self, SourceError> {
        let mut headers = header::HeaderMap::new();
        let value = header::HeaderValue::from_str(&format!("Bearer {}", access_token))
            .map_err(|e| SourceError::Api(format!("Invalid access token: {}", e)))?;
        headers.insert(header::AUTHORIZATION, value);

        let http_client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| SourceError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            rate_limiter: RateLimiter::new(MIN_CALL_INTERVAL),
        })
    }

    /// Search for songs matching a free-text query
    ///
    /// Returns hits in the provider's native relevance order.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SourceError> {
        self.rate_limiter.wait().await;

        debug!(query = %query, "Genius search");

        let url = format!("{}/search", GENIUS_API_URL);
        let response = self
            .http_client
            .get(&url)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Search request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api(format!(
                "Search returned {}: {}",
                status, body
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse search response: {}", e)))?;

        Ok(parsed.response.hits.into_iter().map(|h| h.result).collect())
    }

    /// Fetch the full song record, including contributor lists
    pub async fn song(&self, song_id: u64) -> Result<SongDetails, SourceError> {
        self.rate_limiter.wait().await;

        debug!(song_id, "Genius song lookup");

        let url = format!("{}/songs/{}", GENIUS_API_URL, song_id);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Song request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            if status.as_u16() == 404 {
                return Err(SourceError::NotFound(format!("Song id {}", song_id)));
            }
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api(format!(
                "Song lookup returned {}: {}",
                status, body
            )));
        }

        let parsed: SongResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse song response: {}", e)))?;

        Ok(parsed.response.song)
    }
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    response: SearchBody,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    result: SearchHit,
}

/// One search result
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub id: u64,
    pub title: String,
    pub url: Option<String>,
    pub primary_artist: ArtistRef,
}

/// Minimal artist reference embedded in song records
#[derive(Debug, Clone, Deserialize)]
pub struct ArtistRef {
    pub id: Option<u64>,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct SongResponse {
    response: SongBody,
}

#[derive(Debug, Deserialize)]
struct SongBody {
    song: SongDetails,
}

/// Full song record with contributor rosters
#[derive(Debug, Clone, Deserialize)]
pub struct SongDetails {
    pub id: u64,
    pub title: String,
    pub url: Option<String>,
    #[serde(rename = "release_date_for_display")]
    pub release_date: Option<String>,
    pub lyrics_state: Option<String>,
    pub primary_artist: ArtistRef,
    #[serde(default)]
    pub featured_artists: Vec<ArtistRef>,
    #[serde(default)]
    pub writer_artists: Vec<ArtistRef>,
    #[serde(default)]
    pub producer_artists: Vec<ArtistRef>,
}
