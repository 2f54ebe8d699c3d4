//! Genre classification batch loop
//!
//! Groups the year's songs by artist, queries whichever sources are
//! configured, aggregates the votes, and persists one primary genre plus
//! subgenre tags for every song of the artist inside an artist-scoped
//! transaction. A source failure degrades that artist's aggregation; an
//! artist failure is logged and the batch moves on.

use crate::context::BatchContext;
use crate::db;
use crate::genre::aggregate::{aggregate, SourceVote};
use crate::genre::subgenre::extract_subgenres;
use crate::normalize::primary_artist;
use crate::sources::GenreSource;
use crate::util::retry_on_lock;
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Minimum delay between artists (provider courtesy pacing)
const INTER_ARTIST_DELAY: Duration = Duration::from_millis(500);

/// Maximum total wait for a locked database before giving up on an artist
const MAX_DB_WAIT_MS: u64 = 5000;

/// Batch parameters
#[derive(Debug, Clone)]
pub struct ClassifyOptions {
    pub start_year: i64,
    pub end_year: i64,
    pub limit: i64,
    /// Re-classify artists whose songs already have genres, replacing
    /// prior assignments
    pub force: bool,
}

/// Batch outcome counters
#[derive(Debug, Default, Clone, Copy)]
pub struct ClassifyStats {
    pub artists: usize,
    pub classified: usize,
    pub skipped: usize,
    pub unclassified: usize,
    pub failed: usize,
    /// Individual source failures survived during aggregation
    pub source_failures: usize,
}

/// Sequential multi-source genre classification over a year range
pub struct GenreClassifier<'a> {
    sources: Vec<Box<dyn GenreSource>>,
    pool: &'a SqlitePool,
    delay: Duration,
}

impl<'a> GenreClassifier<'a> {
    pub fn new(sources: Vec<Box<dyn GenreSource>>, pool: &'a SqlitePool) -> Self {
        Self {
            sources,
            pool,
            delay: INTER_ARTIST_DELAY,
        }
    }

    /// Override the inter-artist delay (tests)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Run the batch
    pub async fn run(
        &self,
        ctx: &BatchContext,
        options: &ClassifyOptions,
    ) -> Result<ClassifyStats, hmdb_common::Error> {
        let songs =
            db::songs::songs_for_years(self.pool, options.start_year, options.end_year, options.limit)
                .await
                .map_err(hmdb_common::Error::Database)?;

        // Group by artist string, preserving chart order
        let mut artists: Vec<(String, Vec<db::songs::Song>)> = Vec::new();
        for song in songs {
            match artists.iter_mut().find(|(name, _)| *name == song.artist) {
                Some((_, group)) => group.push(song),
                None => artists.push((song.artist.clone(), vec![song])),
            }
        }

        let mut stats = ClassifyStats {
            artists: artists.len(),
            ..Default::default()
        };

        info!(
            artists = artists.len(),
            sources = self.sources.len(),
            start_year = options.start_year,
            end_year = options.end_year,
            force = options.force,
            "Starting genre classification batch"
        );

        for (artist, group) in &artists {
            if !options.force {
                match self.all_classified(group).await {
                    Ok(true) => {
                        debug!(artist = %artist, "Already classified, skipping");
                        stats.skipped += 1;
                        continue;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        error!(artist = %artist, error = %e, "Failed to check classification state");
                        stats.failed += 1;
                        continue;
                    }
                }
            }

            match self.classify_artist(ctx, artist, group, options, &mut stats).await {
                Ok(true) => stats.classified += 1,
                Ok(false) => stats.unclassified += 1,
                Err(e) => {
                    error!(artist = %artist, error = %e, "Classification failed");
                    stats.failed += 1;
                }
            }

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        info!(
            artists = stats.artists,
            classified = stats.classified,
            skipped = stats.skipped,
            unclassified = stats.unclassified,
            failed = stats.failed,
            source_failures = stats.source_failures,
            "Genre classification batch complete"
        );

        Ok(stats)
    }

    async fn all_classified(&self, group: &[db::songs::Song]) -> Result<bool, sqlx::Error> {
        for song in group {
            if !db::songs::has_genre(self.pool, song.song_id).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Classify one artist and persist to all of their songs
    ///
    /// Returns false when no source produced any labels: the artist stays
    /// unclassified and a later run retries.
    async fn classify_artist(
        &self,
        ctx: &BatchContext,
        artist: &str,
        group: &[db::songs::Song],
        options: &ClassifyOptions,
        stats: &mut ClassifyStats,
    ) -> Result<bool, sqlx::Error> {
        let lookup_name = primary_artist(artist);
        if lookup_name != artist.trim() {
            debug!(artist = %artist, lookup = %lookup_name, "Using primary artist for lookups");
        }

        let mut votes: Vec<SourceVote> = Vec::new();
        for source in &self.sources {
            match source.artist_genres(&lookup_name).await {
                Ok(labels) if labels.is_empty() => {
                    debug!(source = source.name(), artist = %lookup_name, "Source returned no labels");
                }
                Ok(labels) => {
                    debug!(
                        source = source.name(),
                        artist = %lookup_name,
                        labels = labels.len(),
                        "Source vote collected"
                    );
                    votes.push(SourceVote {
                        source: source.name(),
                        kind: source.kind(),
                        labels,
                    });
                }
                Err(e) => {
                    // Partial source failure: aggregation proceeds with
                    // whatever remains
                    warn!(source = source.name(), artist = %lookup_name, error = %e, "Source unavailable");
                    stats.source_failures += 1;
                }
            }
        }

        if votes.is_empty() {
            info!(artist = %artist, "No source produced labels, leaving unclassified");
            return Ok(false);
        }

        let assignment = aggregate(&votes);
        let subgenres = extract_subgenres(&votes, &assignment, &ctx.primary_genres);

        info!(
            artist = %artist,
            primary_genre = %assignment.primary_genre,
            confidence = assignment.confidence,
            subgenres = subgenres.len(),
            songs = group.len(),
            "Classified artist"
        );

        // Shared entities resolved on the pool before the artist-scoped
        // transaction
        let genre_id = db::genres::get_or_create_genre(self.pool, &assignment.primary_genre).await?;
        let mut subgenre_ids = Vec::with_capacity(subgenres.len());
        for tag in &subgenres {
            let id = db::genres::get_or_create_subgenre(self.pool, &tag.label, genre_id).await?;
            subgenre_ids.push(id);
        }

        let contributing = assignment.contributing_sources.join(",");
        let force = options.force;
        retry_on_lock("artist genre save", MAX_DB_WAIT_MS, || {
            let assignment = &assignment;
            let subgenres = &subgenres;
            let subgenre_ids = &subgenre_ids;
            let contributing = contributing.as_str();
            async move {
                let mut tx = self.pool.begin().await?;

                for song in group {
                    db::genres::replace_song_genre(
                        &mut *tx,
                        song.song_id,
                        genre_id,
                        assignment.confidence,
                        contributing,
                    )
                    .await?;

                    if force {
                        db::genres::delete_song_subgenres(&mut *tx, song.song_id).await?;
                    }

                    for (rank, (tag, subgenre_id)) in
                        subgenres.iter().zip(subgenre_ids.iter()).enumerate()
                    {
                        db::genres::insert_song_subgenre(
                            &mut *tx,
                            song.song_id,
                            *subgenre_id,
                            tag.confidence,
                            tag.source,
                            (rank + 1) as i64,
                        )
                        .await?;
                    }
                }

                tx.commit().await?;
                Ok(())
            }
        })
        .await?;

        Ok(true)
    }
}
