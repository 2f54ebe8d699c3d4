//! Streaming metadata provider client (Spotify)
//!
//! Authenticates with the client-credentials flow; the short-lived access
//! token is cached and refreshed just before expiry. Genre labels come from
//! the artist record found via search.

use crate::sources::{GenreSource, SourceError, SourceKind};
use crate::util::RateLimiter;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

const ACCOUNTS_URL: &str = "https://accounts.spotify.com/api/token";
const API_URL: &str = "https://api.spotify.com/v1";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const MIN_CALL_INTERVAL: Duration = Duration::from_millis(500);

/// Slack subtracted from the token lifetime so a token is never used at
/// the edge of expiry
const TOKEN_EXPIRY_SLACK: Duration = Duration::from_secs(60);

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Spotify API client
pub struct SpotifyClient {
    http_client: Client,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
    rate_limiter: RateLimiter,
}

impl SpotifyClient {
    pub fn new(client_id: &str, client_secret: &str) -> Result<Self, SourceError> {
        let http_client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| SourceError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            token: Mutex::new(None),
            rate_limiter: RateLimiter::new(MIN_CALL_INTERVAL),
        })
    }

    /// Return a valid access token, requesting a fresh one when the cached
    /// token is missing or near expiry
    async fn access_token(&self) -> Result<String, SourceError> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if Instant::now() + TOKEN_EXPIRY_SLACK < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        debug!("Requesting new Spotify access token");

        let response = self
            .http_client
            .post(ACCOUNTS_URL)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api(format!(
                "Token request returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse token response: {}", e)))?;

        let value = token.access_token.clone();
        *cached = Some(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });

        Ok(value)
    }

    /// Find the artist record best matching the queried name
    ///
    /// Prefers an exact case-insensitive name match among the top results,
    /// falling back to the provider's first hit.
    async fn search_artist(&self, artist: &str) -> Result<Option<Artist>, SourceError> {
        self.rate_limiter.wait().await;
        let token = self.access_token().await?;

        let url = format!("{}/search", API_URL);
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&token)
            .query(&[("q", artist), ("type", "artist"), ("limit", "5")])
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Artist search failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api(format!(
                "Artist search returned {}: {}",
                status, body
            )));
        }

        let parsed: ArtistSearchResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse artist search: {}", e)))?;

        let wanted = artist.trim().to_lowercase();
        let mut items = parsed.artists.items;
        if let Some(pos) = items.iter().position(|a| a.name.to_lowercase() == wanted) {
            return Ok(Some(items.swap_remove(pos)));
        }

        Ok(items.into_iter().next())
    }
}

#[async_trait]
impl GenreSource for SpotifyClient {
    fn name(&self) -> &'static str {
        "spotify"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Algorithmic
    }

    async fn artist_genres(&self, artist: &str) -> Result<Vec<String>, SourceError> {
        match self.search_artist(artist).await? {
            Some(found) => {
                debug!(
                    artist = %artist,
                    matched = %found.name,
                    genres = found.genres.len(),
                    "Spotify artist genres"
                );
                Ok(found.genres)
            }
            None => Err(SourceError::NotFound(artist.to_string())),
        }
    }
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct ArtistSearchResponse {
    artists: ArtistPage,
}

#[derive(Debug, Deserialize)]
struct ArtistPage {
    #[serde(default)]
    items: Vec<Artist>,
}

#[derive(Debug, Deserialize)]
struct Artist {
    name: String,
    #[serde(default)]
    genres: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_artist_search_response() {
        let json = r#"{
            "artists": {
                "items": [
                    {"name": "Drake", "genres": ["rap", "hip hop", "pop rap"]},
                    {"name": "Drake Bell", "genres": ["pop rock"]}
                ]
            }
        }"#;

        let parsed: ArtistSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.artists.items.len(), 2);
        assert_eq!(parsed.artists.items[0].genres.len(), 3);
    }

    #[test]
    fn test_parse_token_response() {
        let json = r#"{"access_token": "abc", "token_type": "Bearer", "expires_in": 3600}"#;
        let parsed: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.access_token, "abc");
        assert_eq!(parsed.expires_in, 3600);
    }

    #[test]
    fn test_source_kind_is_algorithmic() {
        let client = SpotifyClient::new("id", "secret").unwrap();
        assert_eq!(client.kind(), SourceKind::Algorithmic);
        assert_eq!(client.name(), "spotify");
    }
}
