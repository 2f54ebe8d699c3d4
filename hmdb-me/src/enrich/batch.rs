//! Credit enrichment batch loop
//!
//! Processes songs sequentially: search, match, extract, persist. Every
//! failure is song-scoped; the batch logs it and moves to the next song,
//! and a later run picks up whatever was left unenriched.

use crate::context::BatchContext;
use crate::db;
use crate::enrich::credits::{
    extract_credits, persist_song_credits, resolve_credit_ids, CreditCounts,
};
use crate::enrich::search::CandidateSearch;
use crate::error::{EnrichError, EnrichResult};
use crate::matching;
use crate::normalize::{primary_artist, TitleVariants};
use crate::sources::genius::GeniusClient;
use crate::util::retry_on_lock;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Minimum delay between songs (provider courtesy pacing)
const INTER_SONG_DELAY: Duration = Duration::from_millis(500);

/// Maximum total wait for a locked database before giving up on a song
const MAX_DB_WAIT_MS: u64 = 5000;

/// Batch parameters
#[derive(Debug, Clone)]
pub struct EnrichOptions {
    pub start_year: i64,
    pub end_year: i64,
    pub limit: i64,
    /// Re-resolve songs that already have credits, overwriting prior results
    pub force: bool,
    /// Query every search formulation instead of stopping at the first
    /// productive one
    pub exhaustive: bool,
}

/// Batch outcome counters
#[derive(Debug, Default, Clone, Copy)]
pub struct EnrichStats {
    pub total: usize,
    pub enriched: usize,
    pub skipped: usize,
    pub unmatched: usize,
    pub unavailable: usize,
    pub failed: usize,
}

/// Sequential credit enrichment over a year range
pub struct CreditEnricher<'a> {
    client: &'a GeniusClient,
    pool: &'a SqlitePool,
    delay: Duration,
}

impl<'a> CreditEnricher<'a> {
    pub fn new(client: &'a GeniusClient, pool: &'a SqlitePool) -> Self {
        Self {
            client,
            pool,
            delay: INTER_SONG_DELAY,
        }
    }

    /// Override the inter-song delay (tests)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Run the batch
    pub async fn run(
        &self,
        ctx: &mut BatchContext,
        options: &EnrichOptions,
    ) -> Result<EnrichStats, hmdb_common::Error> {
        let songs =
            db::songs::songs_for_years(self.pool, options.start_year, options.end_year, options.limit)
                .await
                .map_err(hmdb_common::Error::Database)?;

        let mut stats = EnrichStats {
            total: songs.len(),
            ..Default::default()
        };

        info!(
            songs = songs.len(),
            start_year = options.start_year,
            end_year = options.end_year,
            force = options.force,
            "Starting credit enrichment batch"
        );

        for song in &songs {
            if !options.force {
                match db::songs::has_credits(self.pool, song.song_id).await {
                    Ok(true) => {
                        debug!(song_id = song.song_id, title = %song.title, "Already enriched, skipping");
                        stats.skipped += 1;
                        continue;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        error!(song_id = song.song_id, error = %e, "Failed to check enrichment state");
                        stats.failed += 1;
                        continue;
                    }
                }
            }

            match self.enrich_song(ctx, song, options).await {
                Ok(counts) => {
                    info!(
                        song_id = song.song_id,
                        title = %song.title,
                        artist = %song.artist,
                        added = counts.added,
                        skipped_duplicates = counts.skipped,
                        "Enriched song"
                    );
                    stats.enriched += 1;
                }
                Err(EnrichError::SearchUnavailable(e)) => {
                    warn!(song_id = song.song_id, title = %song.title, error = %e, "Search unavailable");
                    stats.unavailable += 1;
                }
                Err(EnrichError::NoAcceptableMatch { .. }) => {
                    info!(
                        song_id = song.song_id,
                        title = %song.title,
                        artist = %song.artist,
                        "No acceptable match, song left unenriched"
                    );
                    stats.unmatched += 1;
                }
                Err(e) => {
                    error!(song_id = song.song_id, title = %song.title, error = %e, "Enrichment failed");
                    stats.failed += 1;
                }
            }

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        info!(
            total = stats.total,
            enriched = stats.enriched,
            skipped = stats.skipped,
            unmatched = stats.unmatched,
            unavailable = stats.unavailable,
            failed = stats.failed,
            "Credit enrichment batch complete"
        );

        Ok(stats)
    }

    /// Enrich one song: search, accept the first candidate that clears the
    /// fuzzy bar, extract credits, persist in a song-scoped transaction
    async fn enrich_song(
        &self,
        ctx: &mut BatchContext,
        song: &db::songs::Song,
        options: &EnrichOptions,
    ) -> EnrichResult<CreditCounts> {
        let search = CandidateSearch::new(self.client).exhaustive(options.exhaustive);
        let candidates = search.search(&song.title, &song.artist).await?;

        let target = TitleVariants::of(&song.title);
        let main_artist = primary_artist(&song.artist);

        // First acceptable candidate wins; order is the provider's
        // relevance order
        let accepted = candidates.iter().find_map(|candidate| {
            matching::evaluate(&target, &main_artist, &candidate.title, &candidate.artist)
                .map(|score| (candidate, score))
        });

        let Some((candidate, score)) = accepted else {
            return Err(EnrichError::NoAcceptableMatch {
                title: song.title.clone(),
                artist: song.artist.clone(),
            });
        };

        debug!(
            song_id = song.song_id,
            candidate_id = candidate.external_id,
            candidate_title = %candidate.title,
            title_similarity = score.title,
            artist_similarity = score.artist,
            via_parenthetical = score.via_parenthetical,
            "Accepted candidate"
        );

        let details = self
            .client
            .song(candidate.external_id)
            .await
            .map_err(|e| EnrichError::SearchUnavailable(e.to_string()))?;

        let extracted = extract_credits(&details);
        let resolved = resolve_credit_ids(self.pool, ctx, &extracted).await?;

        let existing: HashSet<(i64, i64)> = if options.force {
            HashSet::new()
        } else {
            db::credits::existing_credit_pairs(self.pool, song.song_id).await?
        };

        let song_id = song.song_id;
        let force = options.force;
        let counts = retry_on_lock("song credit save", MAX_DB_WAIT_MS, || {
            let resolved = &resolved;
            let existing = &existing;
            let details = &details;
            async move {
                let mut tx = self.pool.begin().await?;

                if force {
                    db::credits::delete_song_credits(&mut *tx, song_id).await?;
                }

                let counts =
                    persist_song_credits(&mut *tx, song_id, resolved, existing, "genius").await?;

                db::credits::upsert_lyric_metadata(
                    &mut *tx,
                    song_id,
                    details.id as i64,
                    details.url.as_deref(),
                    details.release_date.as_deref(),
                    details.lyrics_state.as_deref(),
                )
                .await?;

                tx.commit().await?;
                Ok(counts)
            }
        })
        .await?;

        Ok(counts)
    }
}
