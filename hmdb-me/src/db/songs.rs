//! Song database operations

use sqlx::{Row, SqlitePool};

/// Chart song row
#[derive(Debug, Clone)]
pub struct Song {
    pub song_id: i64,
    pub title: String,
    pub artist: String,
    pub year: i64,
    pub peak_position: Option<i64>,
}

/// Load songs whose chart year falls in `[start_year, end_year]`, best
/// chart performers first
pub async fn songs_for_years(
    pool: &SqlitePool,
    start_year: i64,
    end_year: i64,
    limit: i64,
) -> Result<Vec<Song>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT song_id, title, artist, year, peak_position
        FROM songs
        WHERE year BETWEEN ? AND ?
        ORDER BY peak_position ASC NULLS LAST, song_id ASC
        LIMIT ?
        "#,
    )
    .bind(start_year)
    .bind(end_year)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| Song {
            song_id: row.get("song_id"),
            title: row.get("title"),
            artist: row.get("artist"),
            year: row.get("year"),
            peak_position: row.get("peak_position"),
        })
        .collect())
}

/// Insert a chart song, returning its id
///
/// Used by tests and the upstream chart loader; enrichment never creates
/// songs.
pub async fn insert_song(
    pool: &SqlitePool,
    title: &str,
    artist: &str,
    year: i64,
    peak_position: Option<i64>,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO songs (title, artist, year, peak_position)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(title)
    .bind(artist)
    .bind(year)
    .bind(peak_position)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Whether the song already has any resolved credits
pub async fn has_credits(pool: &SqlitePool, song_id: i64) -> Result<bool, sqlx::Error> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM song_credits WHERE song_id = ?")
            .bind(song_id)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

/// Whether the song already has a primary genre assignment
pub async fn has_genre(pool: &SqlitePool, song_id: i64) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM song_genres WHERE song_id = ?")
        .bind(song_id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmdb_common::db::initialize_schema;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        initialize_schema(&pool).await.expect("Schema init failed");
        pool
    }

    #[tokio::test]
    async fn test_songs_for_years_orders_by_peak() {
        let pool = test_pool().await;

        insert_song(&pool, "Mid", "A", 2001, Some(40)).await.unwrap();
        insert_song(&pool, "Top", "B", 2001, Some(1)).await.unwrap();
        insert_song(&pool, "Other Year", "C", 1999, Some(2)).await.unwrap();

        let songs = songs_for_years(&pool, 2001, 2001, 50).await.unwrap();
        assert_eq!(songs.len(), 2);
        assert_eq!(songs[0].title, "Top");
        assert_eq!(songs[1].title, "Mid");
    }

    #[tokio::test]
    async fn test_songs_for_years_respects_range_and_limit() {
        let pool = test_pool().await;

        for year in 2000..2005 {
            insert_song(&pool, &format!("Song {}", year), "A", year, Some(10))
                .await
                .unwrap();
        }

        let songs = songs_for_years(&pool, 2001, 2003, 2).await.unwrap();
        assert_eq!(songs.len(), 2);
        assert!(songs.iter().all(|s| (2001..=2003).contains(&s.year)));
    }

    #[tokio::test]
    async fn test_has_credits_and_genre_start_false() {
        let pool = test_pool().await;
        let song_id = insert_song(&pool, "One", "A", 2001, None).await.unwrap();

        assert!(!has_credits(&pool, song_id).await.unwrap());
        assert!(!has_genre(&pool, song_id).await.unwrap());
    }
}
