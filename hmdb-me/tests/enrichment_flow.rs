//! End-to-end persistence flows against an in-memory store
//!
//! Exercises the pipeline stages that follow an accepted match (credit
//! resolution and persistence) and the full genre classification batch
//! with stub sources, without any network access.

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::time::Duration;

use hmdb_common::db::initialize_schema;
use hmdb_me::context::BatchContext;
use hmdb_me::db;
use hmdb_me::enrich::credits::{persist_song_credits, resolve_credit_ids};
use hmdb_me::enrich::extract_credits;
use hmdb_me::genre::{ClassifyOptions, GenreClassifier, StoredGenres};
use hmdb_me::sources::genius::{ArtistRef, SongDetails};
use hmdb_me::sources::{GenreSource, SourceError, SourceKind};

async fn test_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    initialize_schema(&pool).await.unwrap();
    pool
}

fn artist(id: u64, name: &str) -> ArtistRef {
    ArtistRef {
        id: Some(id),
        name: name.to_string(),
    }
}

fn sample_song_details() -> SongDetails {
    SongDetails {
        id: 777,
        title: "Oh Boy".to_string(),
        url: Some("https://example.com/songs/777".to_string()),
        release_date: Some("2002".to_string()),
        lyrics_state: Some("complete".to_string()),
        primary_artist: artist(1, "Cam'ron"),
        featured_artists: vec![artist(2, "Juelz Santana")],
        writer_artists: vec![artist(1, "Cam'ron"), artist(3, "Just Blaze")],
        producer_artists: vec![artist(3, "Just Blaze")],
    }
}

#[tokio::test]
async fn credit_persistence_is_idempotent() {
    let pool = test_pool().await;
    let song_id = db::songs::insert_song(&pool, "Oh Boy", "Cam'ron", 2002, Some(1))
        .await
        .unwrap();

    let mut ctx = BatchContext::load(&pool).await.unwrap();
    let extracted = extract_credits(&sample_song_details());
    let resolved = resolve_credit_ids(&pool, &mut ctx, &extracted).await.unwrap();

    // First pass writes every link
    let existing = db::credits::existing_credit_pairs(&pool, song_id).await.unwrap();
    let mut conn = pool.acquire().await.unwrap();
    let first = persist_song_credits(&mut conn, song_id, &resolved, &existing, "genius")
        .await
        .unwrap();
    drop(conn);
    assert_eq!(first.added, 5);
    assert_eq!(first.skipped, 0);

    // Second pass with the refreshed index writes nothing
    let existing = db::credits::existing_credit_pairs(&pool, song_id).await.unwrap();
    let mut conn = pool.acquire().await.unwrap();
    let second = persist_song_credits(&mut conn, song_id, &resolved, &existing, "genius")
        .await
        .unwrap();
    drop(conn);
    assert_eq!(second.added, 0, "re-enrichment must not create new rows");
    assert_eq!(second.skipped, 5);

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM song_credits WHERE song_id = ?")
        .bind(song_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(total, 5);
}

#[tokio::test]
async fn primary_artist_entry_stays_distinct_from_writer_entry() {
    let pool = test_pool().await;
    let song_id = db::songs::insert_song(&pool, "Oh Boy", "Cam'ron", 2002, Some(1))
        .await
        .unwrap();

    let mut ctx = BatchContext::load(&pool).await.unwrap();
    let extracted = extract_credits(&sample_song_details());
    let resolved = resolve_credit_ids(&pool, &mut ctx, &extracted).await.unwrap();

    let existing = HashSet::new();
    let mut conn = pool.acquire().await.unwrap();
    persist_song_credits(&mut conn, song_id, &resolved, &existing, "genius")
        .await
        .unwrap();
    drop(conn);

    // Cam'ron appears under both the Artist and Writer roles
    let roles: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT cr.role_name
        FROM song_credits sc
        JOIN credits c ON sc.credit_id = c.credit_id
        JOIN credit_roles cr ON sc.role_id = cr.role_id
        WHERE sc.song_id = ? AND c.normalized_name = 'cam''ron'
        ORDER BY cr.role_name
        "#,
    )
    .bind(song_id)
    .fetch_all(&pool)
    .await
    .unwrap();

    assert_eq!(roles, vec!["Artist".to_string(), "Writer".to_string()]);
}

// ============================================================================
// Genre classification with stub sources
// ============================================================================

struct StubSource {
    name: &'static str,
    kind: SourceKind,
    labels: Vec<String>,
    fail: bool,
}

impl StubSource {
    fn ok(name: &'static str, kind: SourceKind, labels: &[&str]) -> Self {
        Self {
            name,
            kind,
            labels: labels.iter().map(|s| s.to_string()).collect(),
            fail: false,
        }
    }

    fn failing(name: &'static str, kind: SourceKind) -> Self {
        Self {
            name,
            kind,
            labels: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl GenreSource for StubSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn artist_genres(&self, _artist: &str) -> Result<Vec<String>, SourceError> {
        if self.fail {
            Err(SourceError::Network("provider timed out".to_string()))
        } else {
            Ok(self.labels.clone())
        }
    }
}

#[tokio::test]
async fn classification_persists_genre_and_filtered_subgenres() {
    let pool = test_pool().await;
    let song_id = db::songs::insert_song(&pool, "The Way You Move", "Outkast", 2003, Some(1))
        .await
        .unwrap();

    let sources: Vec<Box<dyn GenreSource>> = vec![
        Box::new(StubSource::ok(
            "spotify",
            SourceKind::Algorithmic,
            &["trap", "hip hop", "conscious hip hop"],
        )),
        Box::new(StubSource::ok("lastfm", SourceKind::Community, &["rap"])),
    ];

    let ctx = BatchContext::load(&pool).await.unwrap();
    let options = ClassifyOptions {
        start_year: 2003,
        end_year: 2003,
        limit: 50,
        force: false,
    };

    let classifier = GenreClassifier::new(sources, &pool).with_delay(Duration::ZERO);
    let stats = classifier.run(&ctx, &options).await.unwrap();
    assert_eq!(stats.classified, 1);
    assert_eq!(stats.failed, 0);

    // Primary genre: hip-hop at the literal weight sum 0.70
    let (genre_name, confidence): (String, f64) = sqlx::query_as(
        r#"
        SELECT g.genre_name, sg.confidence
        FROM song_genres sg
        JOIN genres g ON sg.genre_id = g.genre_id
        WHERE sg.song_id = ?
        "#,
    )
    .bind(song_id)
    .fetch_one(&pool)
    .await
    .unwrap();

    assert_eq!(genre_name, "hip-hop");
    assert!((confidence - 0.70).abs() < 1e-9);

    // Subgenres: only the genre-level-free labels survive
    let subgenres: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT s.subgenre_name
        FROM song_subgenres ss
        JOIN subgenres s ON ss.subgenre_id = s.subgenre_id
        WHERE ss.song_id = ?
        ORDER BY s.subgenre_name
        "#,
    )
    .bind(song_id)
    .fetch_all(&pool)
    .await
    .unwrap();

    assert_eq!(
        subgenres,
        vec!["conscious hip hop".to_string(), "trap".to_string()]
    );
}

#[tokio::test]
async fn classification_survives_a_failing_source() {
    let pool = test_pool().await;
    db::songs::insert_song(&pool, "One", "Some Artist", 2001, Some(5))
        .await
        .unwrap();

    let sources: Vec<Box<dyn GenreSource>> = vec![
        Box::new(StubSource::failing("spotify", SourceKind::Algorithmic)),
        Box::new(StubSource::ok("lastfm", SourceKind::Community, &["rock"])),
    ];

    let ctx = BatchContext::load(&pool).await.unwrap();
    let options = ClassifyOptions {
        start_year: 2001,
        end_year: 2001,
        limit: 50,
        force: false,
    };

    let classifier = GenreClassifier::new(sources, &pool).with_delay(Duration::ZERO);
    let stats = classifier.run(&ctx, &options).await.unwrap();

    assert_eq!(stats.classified, 1, "batch continues past a failing source");
    assert_eq!(stats.source_failures, 1);

    // Confidence reflects only the surviving source's weight
    let confidence: f64 = sqlx::query_scalar("SELECT confidence FROM song_genres LIMIT 1")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!((confidence - 0.30).abs() < 1e-9);
}

#[tokio::test]
async fn reclassification_skips_without_force_and_replaces_with_force() {
    let pool = test_pool().await;
    let song_id = db::songs::insert_song(&pool, "One", "Some Artist", 2001, Some(5))
        .await
        .unwrap();

    let ctx = BatchContext::load(&pool).await.unwrap();
    let options = ClassifyOptions {
        start_year: 2001,
        end_year: 2001,
        limit: 50,
        force: false,
    };

    // First run classifies as rock
    let first: Vec<Box<dyn GenreSource>> = vec![Box::new(StubSource::ok(
        "lastfm",
        SourceKind::Community,
        &["rock"],
    ))];
    GenreClassifier::new(first, &pool)
        .with_delay(Duration::ZERO)
        .run(&ctx, &options)
        .await
        .unwrap();

    // Second run without force skips the artist entirely
    let second: Vec<Box<dyn GenreSource>> = vec![Box::new(StubSource::ok(
        "spotify",
        SourceKind::Algorithmic,
        &["pop"],
    ))];
    let stats = GenreClassifier::new(second, &pool)
        .with_delay(Duration::ZERO)
        .run(&ctx, &options)
        .await
        .unwrap();
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.classified, 0);

    // Forced re-classification recomputes the assignment
    let third: Vec<Box<dyn GenreSource>> = vec![Box::new(StubSource::ok(
        "spotify",
        SourceKind::Algorithmic,
        &["pop"],
    ))];
    let forced = ClassifyOptions {
        force: true,
        ..options
    };
    GenreClassifier::new(third, &pool)
        .with_delay(Duration::ZERO)
        .run(&ctx, &forced)
        .await
        .unwrap();

    let rows: Vec<(String, f64)> = sqlx::query_as(
        r#"
        SELECT g.genre_name, sg.confidence
        FROM song_genres sg
        JOIN genres g ON sg.genre_id = g.genre_id
        WHERE sg.song_id = ?
        "#,
    )
    .bind(song_id)
    .fetch_all(&pool)
    .await
    .unwrap();

    assert_eq!(rows.len(), 1, "assignment is replaced, not accumulated");
    assert_eq!(rows[0].0, "pop");
    assert!((rows[0].1 - 0.40).abs() < 1e-9);
}

#[tokio::test]
async fn stored_genres_feed_the_fallback_source() {
    let pool = test_pool().await;
    db::songs::insert_song(&pool, "First Hit", "Some Artist", 2000, Some(3))
        .await
        .unwrap();
    db::songs::insert_song(&pool, "Second Hit", "Some Artist", 2001, Some(8))
        .await
        .unwrap();

    let ctx = BatchContext::load(&pool).await.unwrap();

    // Classify the 2000 song from the community source
    let first: Vec<Box<dyn GenreSource>> = vec![Box::new(StubSource::ok(
        "lastfm",
        SourceKind::Community,
        &["country"],
    ))];
    GenreClassifier::new(first, &pool)
        .with_delay(Duration::ZERO)
        .run(
            &ctx,
            &ClassifyOptions {
                start_year: 2000,
                end_year: 2000,
                limit: 50,
                force: false,
            },
        )
        .await
        .unwrap();

    // Classify the 2001 song with only the stored-genre fallback available
    let fallback: Vec<Box<dyn GenreSource>> = vec![Box::new(StoredGenres::new(pool.clone()))];
    let stats = GenreClassifier::new(fallback, &pool)
        .with_delay(Duration::ZERO)
        .run(
            &ctx,
            &ClassifyOptions {
                start_year: 2001,
                end_year: 2001,
                limit: 50,
                force: false,
            },
        )
        .await
        .unwrap();

    assert_eq!(stats.classified, 1);

    let confidence: f64 = sqlx::query_scalar(
        r#"
        SELECT sg.confidence FROM song_genres sg
        JOIN songs s ON sg.song_id = s.song_id
        WHERE s.title = 'Second Hit'
        "#,
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    // Fallback source carries the lowest weight
    assert!((confidence - 0.10).abs() < 1e-9);
}
