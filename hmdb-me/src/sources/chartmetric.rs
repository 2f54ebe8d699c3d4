//! Industry data provider client (Chartmetric)
//!
//! Authentication is a long-lived refresh token exchanged for a short-lived
//! access token; the access token is cached and renewed five minutes before
//! expiry. Genre labels come from the artist metadata record found via
//! search.

use crate::sources::{GenreSource, SourceError, SourceKind};
use crate::util::RateLimiter;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

const CHARTMETRIC_API_URL: &str = "https://api.chartmetric.com/api";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const MIN_CALL_INTERVAL: Duration = Duration::from_millis(500);

/// Renew the access token this long before its reported expiry
const TOKEN_EXPIRY_SLACK: Duration = Duration::from_secs(300);

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Chartmetric API client
pub struct ChartmetricClient {
    http_client: Client,
    refresh_token: String,
    token: Mutex<Option<CachedToken>>,
    rate_limiter: RateLimiter,
}

impl ChartmetricClient {
    pub fn new(refresh_token: &str) -> Result<Self, SourceError> {
        let http_client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| SourceError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            refresh_token: refresh_token.to_string(),
            token: Mutex::new(None),
            rate_limiter: RateLimiter::new(MIN_CALL_INTERVAL),
        })
    }

    async fn access_token(&self) -> Result<String, SourceError> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if Instant::now() + TOKEN_EXPIRY_SLACK < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        debug!("Requesting new Chartmetric access token");

        let url = format!("{}/token", CHARTMETRIC_API_URL);
        let response = self
            .http_client
            .post(&url)
            .json(&json!({ "refreshtoken": self.refresh_token }))
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

        let value = token.token.clone();
        *cached = Some(CachedToken {
            value: token.token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in.unwrap_or(3600)),
        });

        Ok(value)
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<reqwest::Response, SourceError> {
        self.rate_limiter.wait().await;
        let token = self.access_token().await?;

        let url = format!("{}/{}", CHARTMETRIC_API_URL, path);
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&token)
            .query(query)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api(format!(
                "{} returned {}: {}",
                path, status, body
            )));
        }

        Ok(response)
    }

    async fn search_artist(&self, artist: &str) -> Result<Option<ArtistHit>, SourceError> {
        let response = self
            .get("search", &[("q", artist), ("type", "artists"), ("limit", "5")])
            .await?;

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse search response: {}", e)))?;

        let wanted = artist.trim().to_lowercase();
        let mut hits = parsed.obj.artists;
        if let Some(pos) = hits.iter().position(|a| a.name.to_lowercase() == wanted) {
            return Ok(Some(hits.swap_remove(pos)));
        }

        Ok(hits.into_iter().next())
    }

    async fn artist_metadata(&self, artist_id: u64) -> Result<ArtistMetadata, SourceError> {
        let response = self.get(&format!("artist/{}", artist_id), &[]).await?;

        let parsed: ArtistMetadataResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse artist metadata: {}", e)))?;

        Ok(parsed.obj)
    }
}

#[async_trait]
impl GenreSource for ChartmetricClient {
    fn name(&self) -> &'static str {
        "chartmetric"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Industry
    }

    async fn artist_genres(&self, artist: &str) -> Result<Vec<String>, SourceError> {
        let hit = self
            .search_artist(artist)
            .await?
            .ok_or_else(|| SourceError::NotFound(artist.to_string()))?;

        let metadata = self.artist_metadata(hit.id).await?;
        let labels: Vec<String> = metadata.genres.into_iter().map(|g| g.name).collect();

        debug!(artist = %artist, labels = labels.len(), "Chartmetric genres");
        Ok(labels)
    }
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    obj: SearchObj,
}

#[derive(Debug, Deserialize)]
struct SearchObj {
    #[serde(default)]
    artists: Vec<ArtistHit>,
}

#[derive(Debug, Deserialize)]
struct ArtistHit {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ArtistMetadataResponse {
    obj: ArtistMetadata,
}

#[derive(Debug, Deserialize)]
struct ArtistMetadata {
    #[serde(default)]
    genres: Vec<GenreRef>,
}

#[derive(Debug, Deserialize)]
struct GenreRef {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_response() {
        let json = r#"{"token": "xyz", "expires_in": 3600}"#;
        let parsed: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.token, "xyz");
        assert_eq!(parsed.expires_in, Some(3600));
    }

    #[test]
    fn test_parse_search_response() {
        let json = r#"{"obj": {"artists": [{"id": 42, "name": "Outkast"}]}}"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.obj.artists[0].id, 42);
    }

    #[test]
    fn test_parse_artist_metadata() {
        let json = r#"{"obj": {"genres": [{"name": "southern hip hop"}, {"name": "rap"}]}}"#;
        let parsed: ArtistMetadataResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.obj.genres.len(), 2);
        assert_eq!(parsed.obj.genres[0].name, "southern hip hop");
    }

    #[test]
    fn test_source_kind_is_industry() {
        let client = ChartmetricClient::new("refresh").unwrap();
        assert_eq!(client.kind(), SourceKind::Industry);
        assert_eq!(client.name(), "chartmetric");
    }
}
