//! Stored-genre fallback source
//!
//! The lowest-weight vote in aggregation: genres already persisted for the
//! artist's songs from earlier runs. Always available when the database
//! is, so classification can proceed even with every external provider
//! unconfigured.

use crate::db;
use crate::sources::{GenreSource, SourceError, SourceKind};
use async_trait::async_trait;
use sqlx::SqlitePool;

/// Genre labels previously stored for an artist
pub struct StoredGenres {
    pool: SqlitePool,
}

impl StoredGenres {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GenreSource for StoredGenres {
    fn name(&self) -> &'static str {
        "database"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Fallback
    }

    async fn artist_genres(&self, artist: &str) -> Result<Vec<String>, SourceError> {
        db::genres::stored_genres_for_artist(&self.pool, artist)
            .await
            .map_err(|e| SourceError::Api(format!("stored genre lookup failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::genres::{genre_id_by_name, replace_song_genre};
    use crate::db::songs::insert_song;
    use hmdb_common::db::initialize_schema;

    #[tokio::test]
    async fn test_stored_source_returns_prior_classifications() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        initialize_schema(&pool).await.unwrap();

        let song_id = insert_song(&pool, "One", "Aaliyah", 2001, None).await.unwrap();
        let rnb = genre_id_by_name(&pool, "r&b").await.unwrap().unwrap();
        let mut conn = pool.acquire().await.unwrap();
        replace_song_genre(&mut conn, song_id, rnb, 0.7, "spotify").await.unwrap();
        drop(conn);

        let source = StoredGenres::new(pool.clone());
        assert_eq!(source.kind(), SourceKind::Fallback);
        let genres = source.artist_genres("aaliyah").await.unwrap();
        assert_eq!(genres, vec!["r&b".to_string()]);

        let empty = source.artist_genres("unknown artist").await.unwrap();
        assert!(empty.is_empty());
    }
}
