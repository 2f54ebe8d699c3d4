//! Per-run batch context
//!
//! All lookup state that earlier designs kept in module-level mutable maps
//! lives here instead: built once at the start of a batch run and passed
//! into each resolution or aggregation call. Test runs stay isolated and
//! two batches never share state.

use crate::db;
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Caches and closed-set lookups for one batch run
pub struct BatchContext {
    /// Canonical role name -> role_id
    role_ids: HashMap<String, i64>,
    /// normalized person name -> credit_id, for known (committed) credits
    credit_ids: HashMap<String, i64>,
    /// Lowercased primary genre names known to the store
    pub primary_genres: HashSet<String>,
}

impl BatchContext {
    /// Build the context from the current store contents
    pub async fn load(pool: &SqlitePool) -> Result<Self, sqlx::Error> {
        let role_ids = db::credits::role_ids(pool).await?;
        let credit_ids = db::credits::all_credit_ids(pool).await?;
        let primary_genres = db::genres::primary_genre_names(pool).await?;

        info!(
            roles = role_ids.len(),
            credits = credit_ids.len(),
            genres = primary_genres.len(),
            "Batch context loaded"
        );

        Ok(Self {
            role_ids,
            credit_ids,
            primary_genres,
        })
    }

    /// Role id for a canonical role name
    pub fn role_id(&self, role_name: &str) -> Option<i64> {
        self.role_ids.get(role_name).copied()
    }

    /// Cached credit id for a normalized person name
    pub fn credit_id(&self, normalized_name: &str) -> Option<i64> {
        self.credit_ids.get(normalized_name).copied()
    }

    /// Record a committed credit id in the cache
    pub fn remember_credit(&mut self, normalized_name: String, credit_id: i64) {
        self.credit_ids.insert(normalized_name, credit_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmdb_common::db::initialize_schema;

    #[tokio::test]
    async fn test_context_loads_seeded_sets() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        initialize_schema(&pool).await.unwrap();

        let ctx = BatchContext::load(&pool).await.unwrap();

        assert!(ctx.role_id("Writer").is_some());
        assert!(ctx.role_id("Nonexistent Role").is_none());
        assert!(ctx.primary_genres.contains("hip-hop"));
        assert!(ctx.credit_id("anyone").is_none());
    }

    #[tokio::test]
    async fn test_remember_credit() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        initialize_schema(&pool).await.unwrap();

        let mut ctx = BatchContext::load(&pool).await.unwrap();
        ctx.remember_credit("max martin".to_string(), 7);
        assert_eq!(ctx.credit_id("max martin"), Some(7));
    }
}
