//! Community tag provider client (Last.fm)
//!
//! Pulls the community's top tags for an artist. Tags are crowd-sourced
//! and noisy, so non-genre tags (moods, "seen live", vocalist gender,
//! nationality, decades) are filtered out before the labels reach the
//! aggregator.

use crate::sources::{GenreSource, SourceError, SourceKind};
use crate::util::RateLimiter;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const LASTFM_API_URL: &str = "https://ws.audioscrobbler.com/2.0/";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const MIN_CALL_INTERVAL: Duration = Duration::from_millis(500);

/// Tags with fewer community votes than this are discarded
const MIN_TAG_COUNT: i64 = 10;

/// Most labels kept per artist
const MAX_TAGS: usize = 10;

/// Community tags that describe something other than a genre
const NON_GENRE_TAGS: &[&str] = &[
    "seen live",
    "favorites",
    "favourites",
    "love",
    "beautiful",
    "awesome",
    "male vocalists",
    "female vocalists",
    "american",
    "british",
    "usa",
    "uk",
    "00s",
    "90s",
    "80s",
    "70s",
    "60s",
    "2000s",
];

/// Last.fm API client
pub struct LastFmClient {
    http_client: Client,
    api_key: String,
    rate_limiter: RateLimiter,
}

impl LastFmClient {
    pub fn new(api_key: &str) -> Result<Self, SourceError> {
        let http_client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| SourceError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key: api_key.to_string(),
            rate_limiter: RateLimiter::new(MIN_CALL_INTERVAL),
        })
    }

    async fn top_tags(&self, artist: &str) -> Result<Vec<Tag>, SourceError> {
        self.rate_limiter.wait().await;

        let response = self
            .http_client
            .get(LASTFM_API_URL)
            .query(&[
                ("method", "artist.gettoptags"),
                ("artist", artist),
                ("api_key", self.api_key.as_str()),
                ("format", "json"),
                ("autocorrect", "1"),
            ])
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Top tags request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(SourceError::Api(format!("Top tags returned {}", status)));
        }

        let parsed: TopTagsResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse top tags: {}", e)))?;

        if let Some(message) = parsed.message {
            return Err(SourceError::NotFound(format!("{}: {}", artist, message)));
        }

        Ok(parsed.toptags.map(|t| t.tag).unwrap_or_default())
    }

    /// Keep only tags plausible as genre labels
    fn filter_genre_tags(tags: Vec<Tag>) -> Vec<String> {
        tags.into_iter()
            .filter(|t| t.count >= MIN_TAG_COUNT)
            .map(|t| t.name)
            .filter(|name| {
                let lower = name.to_lowercase();
                !NON_GENRE_TAGS.contains(&lower.as_str())
            })
            .take(MAX_TAGS)
            .collect()
    }
}

#[async_trait]
impl GenreSource for LastFmClient {
    fn name(&self) -> &'static str {
        "lastfm"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Community
    }

    async fn artist_genres(&self, artist: &str) -> Result<Vec<String>, SourceError> {
        let tags = self.top_tags(artist).await?;
        let labels = Self::filter_genre_tags(tags);
        debug!(artist = %artist, labels = labels.len(), "Last.fm community tags");
        Ok(labels)
    }
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct TopTagsResponse {
    toptags: Option<TopTags>,
    // Error payloads come back as {"error": 6, "message": "..."}
    #[allow(dead_code)]
    error: Option<i64>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TopTags {
    #[serde(default)]
    tag: Vec<Tag>,
}

#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
    #[serde(default)]
    count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(name: &str, count: i64) -> Tag {
        Tag {
            name: name.to_string(),
            count,
        }
    }

    #[test]
    fn test_filter_drops_non_genre_tags() {
        let tags = vec![
            tag("rap", 100),
            tag("seen live", 90),
            tag("female vocalists", 80),
            tag("conscious hip hop", 60),
        ];

        let labels = LastFmClient::filter_genre_tags(tags);
        assert_eq!(labels, vec!["rap".to_string(), "conscious hip hop".to_string()]);
    }

    #[test]
    fn test_filter_drops_low_count_tags() {
        let tags = vec![tag("trap", 50), tag("obscure micro genre", 2)];
        let labels = LastFmClient::filter_genre_tags(tags);
        assert_eq!(labels, vec!["trap".to_string()]);
    }

    #[test]
    fn test_parse_top_tags_response() {
        let json = r#"{
            "toptags": {
                "tag": [
                    {"name": "rap", "count": 100},
                    {"name": "hip hop", "count": 87}
                ],
                "@attr": {"artist": "Drake"}
            }
        }"#;

        let parsed: TopTagsResponse = serde_json::from_str(json).unwrap();
        let tags = parsed.toptags.unwrap().tag;
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].name, "rap");
    }

    #[test]
    fn test_parse_error_response() {
        let json = r#"{"error": 6, "message": "The artist you supplied could not be found"}"#;
        let parsed: TopTagsResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.toptags.is_none());
        assert!(parsed.message.is_some());
    }
}
