//! Credit database operations
//!
//! Credits (people) are shared entities keyed by normalized name and are
//! created outside the per-song transaction; song_credits links are
//! song-scoped and written inside it. A uniqueness conflict on a link
//! insert is not an error, it is a duplicate skip.

use sqlx::{Row, SqliteConnection, SqlitePool};
use std::collections::{HashMap, HashSet};

/// Look up a credit id by normalized name
pub async fn credit_id_by_normalized(
    pool: &SqlitePool,
    normalized_name: &str,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT credit_id FROM credits WHERE normalized_name = ?")
        .bind(normalized_name)
        .fetch_optional(pool)
        .await
}

/// Get or create a credit row, returning its id
///
/// The insert ignores a normalized-name conflict, so two writers racing on
/// the first insert both converge on the surviving row.
pub async fn get_or_create_credit(
    pool: &SqlitePool,
    name: &str,
    normalized_name: &str,
    external_id: Option<i64>,
) -> Result<i64, sqlx::Error> {
    if let Some(id) = credit_id_by_normalized(pool, normalized_name).await? {
        return Ok(id);
    }

    sqlx::query(
        r#"
        INSERT INTO credits (name, normalized_name, external_id)
        VALUES (?, ?, ?)
        ON CONFLICT(normalized_name) DO NOTHING
        "#,
    )
    .bind(name)
    .bind(normalized_name)
    .bind(external_id)
    .execute(pool)
    .await?;

    credit_id_by_normalized(pool, normalized_name)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

/// Load all credits as a normalized-name -> id map
pub async fn all_credit_ids(pool: &SqlitePool) -> Result<HashMap<String, i64>, sqlx::Error> {
    let rows = sqlx::query("SELECT credit_id, normalized_name FROM credits")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.get("normalized_name"), row.get("credit_id")))
        .collect())
}

/// Load the canonical role table as a role-name -> id map
pub async fn role_ids(pool: &SqlitePool) -> Result<HashMap<String, i64>, sqlx::Error> {
    let rows = sqlx::query("SELECT role_id, role_name FROM credit_roles")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.get("role_name"), row.get("role_id")))
        .collect())
}

/// Existing (credit_id, role_id) pairs for one song
pub async fn existing_credit_pairs(
    pool: &SqlitePool,
    song_id: i64,
) -> Result<HashSet<(i64, i64)>, sqlx::Error> {
    let rows = sqlx::query("SELECT credit_id, role_id FROM song_credits WHERE song_id = ?")
        .bind(song_id)
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.get("credit_id"), row.get("role_id")))
        .collect())
}

/// Insert one song credit link
///
/// Returns false when the (song, credit, role) link already exists: the
/// conflict is swallowed by the store and treated as a duplicate skip.
pub async fn insert_song_credit(
    conn: &mut SqliteConnection,
    song_id: i64,
    credit_id: i64,
    role_id: i64,
    is_primary: bool,
    source: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO song_credits (song_id, credit_id, role_id, is_primary, source)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(song_id, credit_id, role_id) DO NOTHING
        "#,
    )
    .bind(song_id)
    .bind(credit_id)
    .bind(role_id)
    .bind(is_primary)
    .bind(source)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Remove all credit links for a song (forced re-enrichment)
pub async fn delete_song_credits(
    conn: &mut SqliteConnection,
    song_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM song_credits WHERE song_id = ?")
        .bind(song_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Store (or overwrite) the lyrics-provider metadata for a matched song
pub async fn upsert_lyric_metadata(
    conn: &mut SqliteConnection,
    song_id: i64,
    provider_song_id: i64,
    provider_url: Option<&str>,
    release_date: Option<&str>,
    lyrics_state: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO song_lyric_metadata (
            song_id, provider_song_id, provider_url, release_date, lyrics_state
        ) VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(song_id) DO UPDATE SET
            provider_song_id = excluded.provider_song_id,
            provider_url = excluded.provider_url,
            release_date = excluded.release_date,
            lyrics_state = excluded.lyrics_state,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(song_id)
    .bind(provider_song_id)
    .bind(provider_url)
    .bind(release_date)
    .bind(lyrics_state)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
