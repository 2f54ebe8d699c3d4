//! Subgenre extraction
//!
//! The raw per-source labels from aggregation also carry finer-grained
//! tags worth keeping ("neo soul", "conscious hip hop"). A label survives
//! only if it is not itself a primary genre name and not in the static
//! deny-list of genre-level synonyms. The filter runs here, at creation
//! time; nothing genre-level ever reaches subgenre storage.

use crate::genre::aggregate::{GenreAssignment, SourceVote};
use crate::genre::hierarchy::is_primary_genre;
use std::collections::{HashMap, HashSet};

/// Static deny-list of genre-level terms that must never become subgenres
///
/// Version 1. Extend deliberately: entries are compared case-insensitively
/// against candidate labels.
pub const SUBGENRE_DENY_LIST: &[&str] = &[
    "soul",
    "blues",
    "funk",
    "disco",
    "gospel",
    "reggae",
    "punk",
    "metal",
    "indie",
    "dance",
    "edm",
    "house",
    "techno",
    "trance",
    "dubstep",
    "r&b",
    "rnb",
    "rap",
    "hip hop",
    "hip-hop",
    "country",
    "folk",
    "rock",
    "pop",
    "jazz",
    "classical",
    "latin",
    "electronic",
    "alternative",
    "other",
];

/// Most subgenre tags kept per artist
const MAX_SUBGENRES: usize = 3;

/// A surviving subgenre tag, ready to persist
#[derive(Debug, Clone)]
pub struct SubgenreTag {
    pub label: String,
    pub parent_genre: String,
    /// Reliability weight of the source that produced the label
    pub confidence: f64,
    pub source: &'static str,
}

/// Extract subgenre tags from the raw per-source labels
///
/// `primary_names` is the set of primary genre names known to the store
/// (lowercased); labels matching any of them are discarded alongside the
/// static deny-list. Duplicates are collapsed case-insensitively, keeping
/// the highest-weight source, and the result is ranked by confidence and
/// capped.
pub fn extract_subgenres(
    votes: &[SourceVote],
    assignment: &GenreAssignment,
    primary_names: &HashSet<String>,
) -> Vec<SubgenreTag> {
    let winner = assignment.primary_genre.to_lowercase();
    let mut best: HashMap<String, SubgenreTag> = HashMap::new();

    for vote in votes {
        for label in &vote.labels {
            let lower = label.trim().to_lowercase();
            if lower.is_empty() {
                continue;
            }

            // Never a subgenre: the winning primary itself, any primary
            // genre name (closed set or store-known), or a deny-listed
            // genre-level synonym
            if lower == winner
                || is_primary_genre(&lower)
                || primary_names.contains(&lower)
                || SUBGENRE_DENY_LIST.contains(&lower.as_str())
            {
                continue;
            }

            let confidence = vote.kind.weight();
            match best.get(&lower) {
                Some(existing) if existing.confidence >= confidence => {}
                _ => {
                    best.insert(
                        lower.clone(),
                        SubgenreTag {
                            label: lower,
                            parent_genre: assignment.primary_genre.clone(),
                            confidence,
                            source: vote.source,
                        },
                    );
                }
            }
        }
    }

    let mut tags: Vec<SubgenreTag> = best.into_values().collect();
    tags.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .expect("weights are finite")
            .then_with(|| a.label.cmp(&b.label))
    });
    tags.truncate(MAX_SUBGENRES);
    tags
}
