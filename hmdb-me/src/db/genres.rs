//! Genre and subgenre database operations
//!
//! Primary genre assignments are recomputed, not incrementally updated:
//! re-classification replaces the song's assignment wholesale. Subgenre
//! links are deny-list filtered before they ever reach this module.

use sqlx::{Row, SqliteConnection, SqlitePool};
use std::collections::HashSet;

/// Look up a genre id by name
pub async fn genre_id_by_name(
    pool: &SqlitePool,
    genre_name: &str,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT genre_id FROM genres WHERE genre_name = ?")
        .bind(genre_name)
        .fetch_optional(pool)
        .await
}

/// Get or create a genre row, returning its id
pub async fn get_or_create_genre(pool: &SqlitePool, genre_name: &str) -> Result<i64, sqlx::Error> {
    if let Some(id) = genre_id_by_name(pool, genre_name).await? {
        return Ok(id);
    }

    sqlx::query("INSERT INTO genres (genre_name) VALUES (?) ON CONFLICT(genre_name) DO NOTHING")
        .bind(genre_name)
        .execute(pool)
        .await?;

    genre_id_by_name(pool, genre_name)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

/// All genre names known to the store, lowercased
///
/// Feeds the subgenre filter: a label matching any of these names is a
/// primary genre, never a subgenre.
pub async fn primary_genre_names(pool: &SqlitePool) -> Result<HashSet<String>, sqlx::Error> {
    let rows = sqlx::query("SELECT genre_name FROM genres").fetch_all(pool).await?;

    Ok(rows
        .into_iter()
        .map(|row| row.get::<String, _>("genre_name").to_lowercase())
        .collect())
}

/// Replace the song's primary genre assignment
pub async fn replace_song_genre(
    conn: &mut SqliteConnection,
    song_id: i64,
    genre_id: i64,
    confidence: f64,
    contributing_sources: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM song_genres WHERE song_id = ?")
        .bind(song_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO song_genres (song_id, genre_id, confidence, contributing_sources)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(song_id)
    .bind(genre_id)
    .bind(confidence)
    .bind(contributing_sources)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Get or create a subgenre under its parent genre
pub async fn get_or_create_subgenre(
    pool: &SqlitePool,
    subgenre_name: &str,
    parent_genre_id: i64,
) -> Result<i64, sqlx::Error> {
    let existing: Option<i64> = sqlx::query_scalar(
        "SELECT subgenre_id FROM subgenres WHERE subgenre_name = ? AND parent_genre_id = ?",
    )
    .bind(subgenre_name)
    .bind(parent_genre_id)
    .fetch_optional(pool)
    .await?;

    if let Some(id) = existing {
        return Ok(id);
    }

    sqlx::query(
        r#"
        INSERT INTO subgenres (subgenre_name, parent_genre_id)
        VALUES (?, ?)
        ON CONFLICT(subgenre_name, parent_genre_id) DO NOTHING
        "#,
    )
    .bind(subgenre_name)
    .bind(parent_genre_id)
    .execute(pool)
    .await?;

    sqlx::query_scalar(
        "SELECT subgenre_id FROM subgenres WHERE subgenre_name = ? AND parent_genre_id = ?",
    )
    .bind(subgenre_name)
    .bind(parent_genre_id)
    .fetch_optional(pool)
    .await?
    .ok_or(sqlx::Error::RowNotFound)
}

/// Link a subgenre to a song; returns false on an already-existing link
pub async fn insert_song_subgenre(
    conn: &mut SqliteConnection,
    song_id: i64,
    subgenre_id: i64,
    confidence: f64,
    source: &str,
    rank: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO song_subgenres (song_id, subgenre_id, confidence, source, rank)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(song_id, subgenre_id) DO NOTHING
        "#,
    )
    .bind(song_id)
    .bind(subgenre_id)
    .bind(confidence)
    .bind(source)
    .bind(rank)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Remove all subgenre links for a song (forced re-classification)
pub async fn delete_song_subgenres(
    conn: &mut SqliteConnection,
    song_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM song_subgenres WHERE song_id = ?")
        .bind(song_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Genre names previously stored for songs by this artist
///
/// Backs the lowest-weight fallback source in aggregation.
pub async fn stored_genres_for_artist(
    pool: &SqlitePool,
    artist: &str,
) -> Result<Vec<String>, sqlx::Error> {
    let pattern = format!("%{}%", artist.to_lowercase());
    let rows = sqlx::query(
        r#"
        SELECT DISTINCT g.genre_name
        FROM genres g
        JOIN song_genres sg ON g.genre_id = sg.genre_id
        JOIN songs s ON sg.song_id = s.song_id
        WHERE LOWER(s.artist) LIKE ?
        "#,
    )
    .bind(pattern)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|row| row.get("genre_name")).collect())
}
