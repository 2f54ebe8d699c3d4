//! Database initialization
//!
//! Opens (creating if necessary) the SQLite database and brings the schema
//! up idempotently: every `CREATE TABLE IF NOT EXISTS` and seed insert is
//! safe to re-run on an existing database.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL mode allows concurrent readers alongside the single batch writer
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    // Short busy timeout; longer lock waits are handled by the retry wrapper
    sqlx::query("PRAGMA busy_timeout = 250").execute(&pool).await?;

    initialize_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables and seed the closed role and genre sets
///
/// Also used directly by tests against `sqlite::memory:` pools.
pub async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
    create_songs_table(pool).await?;
    create_credits_table(pool).await?;
    create_credit_roles_table(pool).await?;
    create_song_credits_table(pool).await?;
    create_song_lyric_metadata_table(pool).await?;
    create_genres_table(pool).await?;
    create_song_genres_table(pool).await?;
    create_subgenres_table(pool).await?;
    create_song_subgenres_table(pool).await?;

    seed_credit_roles(pool).await?;
    seed_primary_genres(pool).await?;

    Ok(())
}

async fn create_songs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            song_id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            artist TEXT NOT NULL,
            year INTEGER NOT NULL,
            peak_position INTEGER,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(title, artist)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_credits_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS credits (
            credit_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            normalized_name TEXT NOT NULL UNIQUE,
            external_id INTEGER,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_credit_roles_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS credit_roles (
            role_id INTEGER PRIMARY KEY AUTOINCREMENT,
            role_name TEXT NOT NULL UNIQUE,
            role_category TEXT NOT NULL,
            description TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_song_credits_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS song_credits (
            song_credit_id INTEGER PRIMARY KEY AUTOINCREMENT,
            song_id INTEGER NOT NULL REFERENCES songs(song_id),
            credit_id INTEGER NOT NULL REFERENCES credits(credit_id),
            role_id INTEGER NOT NULL REFERENCES credit_roles(role_id),
            is_primary INTEGER NOT NULL DEFAULT 0,
            source TEXT NOT NULL DEFAULT 'genius',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(song_id, credit_id, role_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_song_lyric_metadata_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS song_lyric_metadata (
            song_id INTEGER PRIMARY KEY REFERENCES songs(song_id),
            provider_song_id INTEGER NOT NULL,
            provider_url TEXT,
            release_date TEXT,
            lyrics_state TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_genres_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS genres (
            genre_id INTEGER PRIMARY KEY AUTOINCREMENT,
            genre_name TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_song_genres_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS song_genres (
            song_genre_id INTEGER PRIMARY KEY AUTOINCREMENT,
            song_id INTEGER NOT NULL REFERENCES songs(song_id),
            genre_id INTEGER NOT NULL REFERENCES genres(genre_id),
            confidence REAL NOT NULL,
            contributing_sources TEXT NOT NULL DEFAULT '',
            source TEXT NOT NULL DEFAULT 'multi_source',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(song_id, genre_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_subgenres_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS subgenres (
            subgenre_id INTEGER PRIMARY KEY AUTOINCREMENT,
            subgenre_name TEXT NOT NULL,
            parent_genre_id INTEGER REFERENCES genres(genre_id),
            UNIQUE(subgenre_name, parent_genre_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_song_subgenres_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS song_subgenres (
            song_subgenre_id INTEGER PRIMARY KEY AUTOINCREMENT,
            song_id INTEGER NOT NULL REFERENCES songs(song_id),
            subgenre_id INTEGER NOT NULL REFERENCES subgenres(subgenre_id),
            confidence REAL NOT NULL,
            source TEXT NOT NULL,
            rank INTEGER NOT NULL DEFAULT 1,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(song_id, subgenre_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Seed the closed set of canonical credit roles
async fn seed_credit_roles(pool: &SqlitePool) -> Result<()> {
    let roles: [(&str, &str, &str); 13] = [
        ("Artist", "performance", "Main performing artist"),
        ("Featured Artist", "performance", "Featured performer"),
        ("Writer", "creative", "Songwriter/composer"),
        ("Producer", "technical", "Record producer"),
        ("Co-Writer", "creative", "Co-songwriter"),
        ("Co-Producer", "technical", "Co-producer"),
        ("Arranger", "creative", "Music arranger"),
        ("Engineer", "technical", "Recording engineer"),
        ("Mixer", "technical", "Mixing engineer"),
        ("Mastering Engineer", "technical", "Mastering engineer"),
        ("Vocalist", "performance", "Lead vocalist"),
        ("Backing Vocalist", "performance", "Backing vocalist"),
        ("Instrumentalist", "performance", "Instrumental performer"),
    ];

    for (name, category, description) in roles {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO credit_roles (role_name, role_category, description)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(category)
        .bind(description)
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// Seed the closed set of primary genres
async fn seed_primary_genres(pool: &SqlitePool) -> Result<()> {
    let genres = [
        "pop",
        "hip-hop",
        "rock",
        "alternative",
        "country",
        "electronic",
        "r&b",
        "latin",
        "folk",
        "jazz",
        "other",
    ];

    for genre in genres {
        sqlx::query("INSERT OR IGNORE INTO genres (genre_name) VALUES (?)")
            .bind(genre)
            .execute(pool)
            .await?;
    }

    Ok(())
}
