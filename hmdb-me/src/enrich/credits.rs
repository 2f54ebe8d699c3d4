//! Credit extraction and resolution
//!
//! Maps the provider's contributor rosters onto the closed canonical role
//! set, normalizes person names for duplicate detection, and persists the
//! links. The primary artist always gets its own `Artist` role entry and
//! is never folded into writer/producer entries, even when it is the same
//! person.

use crate::context::BatchContext;
use crate::db;
use crate::sources::genius::SongDetails;
use once_cell::sync::Lazy;
use regex::Regex;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Canonical credit roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Artist,
    FeaturedArtist,
    Writer,
    Producer,
    CoWriter,
    CoProducer,
    Arranger,
    Engineer,
    Mixer,
    MasteringEngineer,
    Vocalist,
    BackingVocalist,
    Instrumentalist,
}

impl Role {
    /// Canonical role name as stored in `credit_roles`
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Artist => "Artist",
            Role::FeaturedArtist => "Featured Artist",
            Role::Writer => "Writer",
            Role::Producer => "Producer",
            Role::CoWriter => "Co-Writer",
            Role::CoProducer => "Co-Producer",
            Role::Arranger => "Arranger",
            Role::Engineer => "Engineer",
            Role::Mixer => "Mixer",
            Role::MasteringEngineer => "Mastering Engineer",
            Role::Vocalist => "Vocalist",
            Role::BackingVocalist => "Backing Vocalist",
            Role::Instrumentalist => "Instrumentalist",
        }
    }

    /// Map a raw provider role label onto the canonical set
    ///
    /// Unknown labels fall back to Writer.
    pub fn from_raw(label: &str) -> Role {
        match label.trim().to_lowercase().as_str() {
            "artist" => Role::Artist,
            "featured artist" => Role::FeaturedArtist,
            "writer" => Role::Writer,
            "producer" => Role::Producer,
            "co-writer" => Role::CoWriter,
            "co-producer" => Role::CoProducer,
            "arranger" => Role::Arranger,
            "engineer" => Role::Engineer,
            "mixer" => Role::Mixer,
            "mastering engineer" => Role::MasteringEngineer,
            "vocalist" => Role::Vocalist,
            "backing vocalist" => Role::BackingVocalist,
            "instrumentalist" => Role::Instrumentalist,
            _ => Role::Writer,
        }
    }
}

static PERSON_FEAT_CLAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+(feat\.?|featuring)\s+.*$").expect("invalid pattern"));

/// Normalize a person name for duplicate detection: drop trailing
/// featuring clauses, unify "&" to "and", lowercase
pub fn normalize_person_name(name: &str) -> String {
    let trimmed = PERSON_FEAT_CLAUSE.replace(name.trim(), "");
    trimmed.replace(" & ", " and ").trim().to_lowercase()
}

/// One contributor extracted from an accepted match
#[derive(Debug, Clone)]
pub struct ExtractedCredit {
    pub name: String,
    pub external_id: Option<i64>,
    pub role: Role,
    pub is_primary: bool,
}

/// Extract the contributor list from a song record
///
/// A contributor with a blank name is skipped with a warning; the rest of
/// the roster is unaffected.
pub fn extract_credits(song: &SongDetails) -> Vec<ExtractedCredit> {
    let mut credits = Vec::new();

    let mut push = |name: &str, external_id: Option<u64>, role: Role, is_primary: bool| {
        if name.trim().is_empty() {
            warn!(song_id = song.id, role = role.as_str(), "Skipping contributor with empty name");
            return;
        }
        credits.push(ExtractedCredit {
            name: name.trim().to_string(),
            external_id: external_id.map(|id| id as i64),
            role,
            is_primary,
        });
    };

    for writer in &song.writer_artists {
        push(&writer.name, writer.id, Role::Writer, false);
    }

    for producer in &song.producer_artists {
        push(&producer.name, producer.id, Role::Producer, false);
    }

    for featured in &song.featured_artists {
        push(&featured.name, featured.id, Role::FeaturedArtist, false);
    }

    // The primary artist is its own entry, distinct from any writer or
    // producer entry for the same person
    push(
        &song.primary_artist.name,
        song.primary_artist.id,
        Role::Artist,
        true,
    );

    credits
}

/// A credit resolved to store ids, ready to link to a song
#[derive(Debug, Clone, Copy)]
pub struct ResolvedCredit {
    pub credit_id: i64,
    pub role_id: i64,
    pub is_primary: bool,
}

/// Resolve extracted contributors to credit and role ids
///
/// Person rows are shared entities created directly on the pool (and
/// remembered in the context cache); a failure resolving one contributor
/// is logged and does not abort the remaining contributors.
pub async fn resolve_credit_ids(
    pool: &SqlitePool,
    ctx: &mut BatchContext,
    extracted: &[ExtractedCredit],
) -> Result<Vec<ResolvedCredit>, sqlx::Error> {
    let mut resolved = Vec::with_capacity(extracted.len());

    for credit in extracted {
        let normalized = normalize_person_name(&credit.name);
        if normalized.is_empty() {
            warn!(name = %credit.name, "Contributor name normalized to nothing, skipping");
            continue;
        }

        let Some(role_id) = ctx.role_id(credit.role.as_str()) else {
            warn!(role = credit.role.as_str(), "Unknown role id, skipping contributor");
            continue;
        };

        let credit_id = match ctx.credit_id(&normalized) {
            Some(id) => id,
            None => {
                match db::credits::get_or_create_credit(
                    pool,
                    &credit.name,
                    &normalized,
                    credit.external_id,
                )
                .await
                {
                    Ok(id) => {
                        ctx.remember_credit(normalized.clone(), id);
                        id
                    }
                    Err(e) => {
                        warn!(name = %credit.name, error = %e, "Failed to resolve contributor, skipping");
                        continue;
                    }
                }
            }
        };

        resolved.push(ResolvedCredit {
            credit_id,
            role_id,
            is_primary: credit.is_primary,
        });
    }

    Ok(resolved)
}

/// Counts from one song's credit persistence
#[derive(Debug, Default, Clone, Copy)]
pub struct CreditCounts {
    pub added: usize,
    pub skipped: usize,
}

/// Link resolved credits to a song inside the caller's transaction
///
/// Links already present in `existing` (or already written this call) are
/// skipped; a store-level uniqueness conflict surfaces the same way.
pub async fn persist_song_credits(
    conn: &mut SqliteConnection,
    song_id: i64,
    resolved: &[ResolvedCredit],
    existing: &HashSet<(i64, i64)>,
    source: &str,
) -> Result<CreditCounts, sqlx::Error> {
    let mut counts = CreditCounts::default();
    let mut written: HashSet<(i64, i64)> = HashSet::new();

    for credit in resolved {
        let key = (credit.credit_id, credit.role_id);
        if existing.contains(&key) || !written.insert(key) {
            counts.skipped += 1;
            continue;
        }

        let added = db::credits::insert_song_credit(
            &mut *conn,
            song_id,
            credit.credit_id,
            credit.role_id,
            credit.is_primary,
            source,
        )
        .await?;

        if added {
            counts.added += 1;
        } else {
            counts.skipped += 1;
        }
    }

    debug!(song_id, added = counts.added, skipped = counts.skipped, "Persisted song credits");
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::genius::ArtistRef;

    fn artist(id: u64, name: &str) -> ArtistRef {
        ArtistRef {
            id: Some(id),
            name: name.to_string(),
        }
    }

    fn song_details() -> SongDetails {
        SongDetails {
            id: 1,
            title: "Test".to_string(),
            url: None,
            release_date: None,
            lyrics_state: None,
            primary_artist: artist(10, "Main Act"),
            featured_artists: vec![artist(11, "Guest")],
            writer_artists: vec![artist(10, "Main Act"), artist(12, "A Writer")],
            producer_artists: vec![artist(13, "A Producer")],
        }
    }

    #[test]
    fn test_role_mapping_covers_canonical_set() {
        assert_eq!(Role::from_raw("producer"), Role::Producer);
        assert_eq!(Role::from_raw("Mastering Engineer"), Role::MasteringEngineer);
        assert_eq!(Role::from_raw("CO-WRITER"), Role::CoWriter);
        // Unknown labels fall back to Writer
        assert_eq!(Role::from_raw("vibes coordinator"), Role::Writer);
    }

    #[test]
    fn test_normalize_person_name() {
        assert_eq!(normalize_person_name("Max Martin"), "max martin");
        assert_eq!(normalize_person_name("Jay-Z feat. Beyonce"), "jay-z");
        assert_eq!(
            normalize_person_name("Simon & Garfunkel"),
            "simon and garfunkel"
        );
        assert_eq!(normalize_person_name("  Dr. Dre  "), "dr. dre");
    }

    #[test]
    fn test_extract_credits_keeps_primary_artist_distinct() {
        let credits = extract_credits(&song_details());

        // Main Act appears twice: once as Writer, once as Artist
        let main_entries: Vec<_> = credits.iter().filter(|c| c.name == "Main Act").collect();
        assert_eq!(main_entries.len(), 2);
        assert!(main_entries.iter().any(|c| c.role == Role::Writer && !c.is_primary));
        assert!(main_entries.iter().any(|c| c.role == Role::Artist && c.is_primary));
    }

    #[test]
    fn test_extract_credits_skips_blank_contributor() {
        let mut details = song_details();
        details.writer_artists.push(ArtistRef {
            id: None,
            name: "   ".to_string(),
        });

        let credits = extract_credits(&details);
        // Blank writer skipped; everyone else still extracted
        assert_eq!(credits.len(), 5);
    }

    #[test]
    fn test_extract_credits_roster_roles() {
        let credits = extract_credits(&song_details());

        assert!(credits
            .iter()
            .any(|c| c.name == "A Producer" && c.role == Role::Producer));
        assert!(credits
            .iter()
            .any(|c| c.name == "Guest" && c.role == Role::FeaturedArtist));
        assert!(credits
            .iter()
            .any(|c| c.name == "A Writer" && c.role == Role::Writer));
    }
}
