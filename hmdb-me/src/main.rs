//! hmdb-me - Metadata Enrichment batch tool
//!
//! Enriches the Hot 100 chart database in two passes:
//! - `enrich`: resolve per-song credits (writers, producers, featured
//!   artists) from the lyrics provider via fuzzy-matched candidate search
//! - `classify`: assign a primary genre and subgenre tags per artist by
//!   weighted voting across the configured metadata providers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hmdb_common::config::{load_toml_config, resolve_database_path, ApiCredentials};
use hmdb_me::context::BatchContext;
use hmdb_me::enrich::{CreditEnricher, EnrichOptions};
use hmdb_me::genre::{ClassifyOptions, GenreClassifier, StoredGenres};
use hmdb_me::sources::{ChartmetricClient, GeniusClient, GenreSource, LastFmClient, SpotifyClient};

/// Command-line arguments for hmdb-me
#[derive(Parser, Debug)]
#[command(name = "hmdb-me")]
#[command(about = "Metadata enrichment for the Hot 100 music database")]
#[command(version)]
struct Cli {
    /// Path to the SQLite database file
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Path to the TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve song credits from the lyrics provider
    Enrich {
        /// Chart year to process
        #[arg(long)]
        year: i64,

        /// Process a year range ending here (inclusive, defaults to --year)
        #[arg(long)]
        through: Option<i64>,

        /// Maximum number of songs to process
        #[arg(long, default_value = "100")]
        limit: i64,

        /// Re-resolve songs that already have credits, overwriting prior
        /// results
        #[arg(long)]
        force: bool,

        /// Try every search formulation instead of stopping at the first
        /// productive one
        #[arg(long)]
        exhaustive: bool,
    },

    /// Classify artists into primary genres and subgenre tags
    Classify {
        /// Chart year to process
        #[arg(long)]
        year: i64,

        /// Process a year range ending here (inclusive, defaults to --year)
        #[arg(long)]
        through: Option<i64>,

        /// Maximum number of songs whose artists are considered
        #[arg(long, default_value = "100")]
        limit: i64,

        /// Re-classify artists whose songs already have genres
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hmdb_me=info,hmdb_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    info!("Starting hmdb-me v{}", env!("CARGO_PKG_VERSION"));

    let config = load_toml_config(cli.config.as_deref()).context("Failed to load config file")?;
    let credentials = ApiCredentials::resolve(&config);

    let db_path = resolve_database_path(cli.database.as_deref(), &config);
    info!("Database: {}", db_path.display());

    // A data store we cannot open is fatal; everything past this point is
    // entity-scoped and non-fatal
    let pool = hmdb_common::db::init_database(&db_path)
        .await
        .context("Failed to open database")?;

    match cli.command {
        Command::Enrich {
            year,
            through,
            limit,
            force,
            exhaustive,
        } => {
            let token = credentials.require_genius_token()?;
            let client = GeniusClient::new(token).context("Failed to build lyrics client")?;

            let mut ctx = BatchContext::load(&pool).await?;
            let options = EnrichOptions {
                start_year: year,
                end_year: through.unwrap_or(year),
                limit,
                force,
                exhaustive,
            };

            let enricher = CreditEnricher::new(&client, &pool);
            let stats = enricher.run(&mut ctx, &options).await?;

            println!(
                "Enriched {}/{} songs ({} skipped, {} unmatched, {} unavailable, {} failed)",
                stats.enriched,
                stats.total,
                stats.skipped,
                stats.unmatched,
                stats.unavailable,
                stats.failed
            );
        }

        Command::Classify {
            year,
            through,
            limit,
            force,
        } => {
            let sources = build_genre_sources(&credentials, &pool)?;

            let ctx = BatchContext::load(&pool).await?;
            let options = ClassifyOptions {
                start_year: year,
                end_year: through.unwrap_or(year),
                limit,
                force,
            };

            let classifier = GenreClassifier::new(sources, &pool);
            let stats = classifier.run(&ctx, &options).await?;

            println!(
                "Classified {}/{} artists ({} skipped, {} unclassified, {} failed, {} source failures)",
                stats.classified,
                stats.artists,
                stats.skipped,
                stats.unclassified,
                stats.failed,
                stats.source_failures
            );
        }
    }

    Ok(())
}

/// Build the genre source list in aggregation priority order
///
/// Each external provider is optional; the stored-genre fallback is always
/// present so classification can run with any subset configured.
fn build_genre_sources(
    credentials: &ApiCredentials,
    pool: &sqlx::SqlitePool,
) -> Result<Vec<Box<dyn GenreSource>>> {
    let mut sources: Vec<Box<dyn GenreSource>> = Vec::new();

    match credentials.spotify_pair() {
        Some((id, secret)) => {
            sources.push(Box::new(
                SpotifyClient::new(id, secret).context("Failed to build streaming client")?,
            ));
        }
        None => warn!("Streaming provider not configured, skipping"),
    }

    match credentials.lastfm_api_key.as_deref() {
        Some(key) => {
            sources.push(Box::new(
                LastFmClient::new(key).context("Failed to build community tag client")?,
            ));
        }
        None => warn!("Community tag provider not configured, skipping"),
    }

    match credentials.chartmetric_refresh_token.as_deref() {
        Some(token) => {
            sources.push(Box::new(
                ChartmetricClient::new(token).context("Failed to build industry data client")?,
            ));
        }
        None => warn!("Industry data provider not configured, skipping"),
    }

    sources.push(Box::new(StoredGenres::new(pool.clone())));

    info!(sources = sources.len(), "Genre sources configured");
    Ok(sources)
}
