//! Candidate search
//!
//! Builds a fixed priority order of query formulations for one chart
//! title/artist pair and walks them against the lyrics provider, stopping
//! at the first formulation that yields candidates (or exhausting all of
//! them when the caller asks). Candidates come back in the provider's own
//! relevance order, which downstream matching preserves.

use crate::error::{EnrichError, EnrichResult};
use crate::normalize::{clean_title, primary_artist, strip_artist_punctuation, strip_punctuation};
use crate::sources::genius::{GeniusClient, SearchHit};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Default cap on candidates returned per song
pub const DEFAULT_MAX_CANDIDATES: usize = 15;

/// One search candidate under consideration for matching
#[derive(Debug, Clone)]
pub struct Candidate {
    pub external_id: u64,
    pub title: String,
    pub artist: String,
    pub url: Option<String>,
}

impl From<SearchHit> for Candidate {
    fn from(hit: SearchHit) -> Self {
        Self {
            external_id: hit.id,
            title: hit.title,
            artist: hit.primary_artist.name,
            url: hit.url,
        }
    }
}

/// Build the query formulations for a title/artist pair, in priority order
/// with duplicates removed
pub fn query_formulations(title: &str, artist: &str) -> Vec<String> {
    let clean = clean_title(title);
    let main = primary_artist(artist);
    let main_no_punct = strip_artist_punctuation(&main);
    let full_artist = artist.trim();

    let mut queries = Vec::new();

    // Cleaned title + primary artist carries the highest hit rate
    queries.push(format!("{} {}", clean, main));

    if full_artist != main {
        queries.push(format!("{} {}", clean, full_artist));
    }

    // Reversed order sometimes ranks better
    queries.push(format!("{} {}", main, clean));

    // Bare title, for when artist info is embedded in the title
    queries.push(clean.clone());

    // Original title, in case cleaning was too aggressive
    if title.trim() != clean {
        queries.push(format!("{} {}", title.trim(), main));
    }

    let simplified = strip_punctuation(&clean);
    if simplified != clean {
        queries.push(format!("{} {}", simplified, main));
    }

    // Punctuation-free artist handles names like Cam'ron
    if main_no_punct != main {
        queries.push(format!("{} {}", clean, main_no_punct));
        queries.push(format!("{} {}", main_no_punct, clean));
    }

    let mut seen = HashSet::new();
    queries.into_iter().filter(|q| seen.insert(q.clone())).collect()
}

/// Walks query formulations against the lyrics provider
pub struct CandidateSearch<'a> {
    client: &'a GeniusClient,
    max_candidates: usize,
    exhaustive: bool,
}

impl<'a> CandidateSearch<'a> {
    pub fn new(client: &'a GeniusClient) -> Self {
        Self {
            client,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            exhaustive: false,
        }
    }

    /// Keep querying every formulation instead of stopping at the first
    /// one that returns candidates
    pub fn exhaustive(mut self, exhaustive: bool) -> Self {
        self.exhaustive = exhaustive;
        self
    }

    pub fn max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    /// Search for candidates matching the title/artist pair
    ///
    /// Zero candidates is a valid outcome. `SearchUnavailable` is returned
    /// only when every formulation failed at the transport level.
    pub async fn search(&self, title: &str, artist: &str) -> EnrichResult<Vec<Candidate>> {
        let queries = query_formulations(title, artist);
        debug!(title = %title, artist = %artist, formulations = queries.len(), "Candidate search");

        let mut candidates: Vec<Candidate> = Vec::new();
        let mut seen_ids = HashSet::new();
        let mut failures = 0usize;
        let mut last_error = String::new();

        for (i, query) in queries.iter().enumerate() {
            match self.client.search(query).await {
                Ok(hits) => {
                    for hit in hits {
                        if candidates.len() >= self.max_candidates {
                            break;
                        }
                        if seen_ids.insert(hit.id) {
                            candidates.push(Candidate::from(hit));
                        }
                    }

                    if !candidates.is_empty() && !self.exhaustive {
                        debug!(
                            formulation = i + 1,
                            candidates = candidates.len(),
                            "Stopping at first productive formulation"
                        );
                        break;
                    }
                }
                Err(e) => {
                    warn!(query = %query, error = %e, "Search formulation failed");
                    failures += 1;
                    last_error = e.to_string();
                }
            }

            if candidates.len() >= self.max_candidates {
                break;
            }
        }

        if candidates.is_empty() && !queries.is_empty() && failures == queries.len() {
            return Err(EnrichError::SearchUnavailable(last_error));
        }

        Ok(candidates)
    }
}
