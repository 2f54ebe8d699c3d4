//! Multi-source weighted genre aggregation
//!
//! Each available source votes with its fixed reliability weight; a
//! source's weight counts once toward a primary genre no matter how many
//! of its raw labels map there. Missing sources simply contribute nothing:
//! the weights of the remaining sources are NOT renormalized to sum to 1,
//! so incomplete data lowers achievable confidence rather than inflating
//! it. That conservative bias is a deliberate, auditable business rule;
//! changing it would silently reinterpret every stored confidence value.

use crate::genre::hierarchy::map_to_primary;
use crate::sources::SourceKind;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Raw labels one source returned for an artist
#[derive(Debug, Clone)]
pub struct SourceVote {
    pub source: &'static str,
    pub kind: SourceKind,
    pub labels: Vec<String>,
}

/// The aggregated classification for one artist
#[derive(Debug, Clone)]
pub struct GenreAssignment {
    pub primary_genre: String,
    /// Literal sum of the weights of sources that voted for the winning
    /// genre; bounded by the weight sum of sources actually queried
    pub confidence: f64,
    /// Sources that contributed to the winning label, priority order
    pub contributing_sources: Vec<&'static str>,
}

struct Tally {
    weight: f64,
    /// (priority, source name) pairs that voted for this genre
    sources: Vec<(u8, &'static str)>,
}

/// Aggregate the votes of the available sources into one assignment
///
/// Ties on accumulated weight break toward the genre supported by the
/// highest-priority source (algorithmic over community over industry over
/// fallback), then by name for determinism.
pub fn aggregate(votes: &[SourceVote]) -> GenreAssignment {
    let mut tallies: BTreeMap<&'static str, Tally> = BTreeMap::new();

    for vote in votes {
        // One vote per source per primary genre, however many labels map there
        let primaries: BTreeSet<&'static str> =
            vote.labels.iter().map(|label| map_to_primary(label)).collect();

        for primary in primaries {
            let tally = tallies.entry(primary).or_insert(Tally {
                weight: 0.0,
                sources: Vec::new(),
            });
            tally.weight += vote.kind.weight();
            tally.sources.push((vote.kind.priority(), vote.source));
        }
    }

    if tallies.is_empty() {
        return GenreAssignment {
            primary_genre: "other".to_string(),
            confidence: 0.0,
            contributing_sources: Vec::new(),
        };
    }

    let mut ranked: Vec<(&'static str, Tally)> = tallies.into_iter().collect();
    for (_, tally) in ranked.iter_mut() {
        tally.sources.sort();
    }
    ranked.sort_by(|(name_a, a), (name_b, b)| {
        b.weight
            .partial_cmp(&a.weight)
            .expect("weights are finite")
            .then_with(|| {
                let best_a = a.sources.first().map(|(p, _)| *p).unwrap_or(u8::MAX);
                let best_b = b.sources.first().map(|(p, _)| *p).unwrap_or(u8::MAX);
                best_a.cmp(&best_b)
            })
            .then_with(|| name_a.cmp(name_b))
    });

    let (winner, tally) = ranked.into_iter().next().expect("tallies not empty");

    debug!(
        primary_genre = winner,
        confidence = tally.weight,
        sources = ?tally.sources,
        "Genre aggregation complete"
    );

    GenreAssignment {
        primary_genre: winner.to_string(),
        confidence: tally.weight,
        contributing_sources: tally.sources.into_iter().map(|(_, name)| name).collect(),
    }
}
