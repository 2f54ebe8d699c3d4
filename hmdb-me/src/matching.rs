//! Fuzzy candidate matching
//!
//! Scores a search candidate against the target title/artist using
//! normalized Levenshtein similarity over the title variants, then applies
//! an adaptive acceptance policy: the closer the title match, the less
//! artist agreement is demanded. A match that only works after stripping a
//! parenthetical subtitle is held to a strict artist bar, since bare
//! subtitle-less titles collide across unrelated artists.

use crate::normalize::TitleVariants;

/// Reject candidates whose best title similarity falls below this floor
pub const TITLE_FLOOR: f64 = 0.70;

/// Artist similarity required when the match relies on parenthetical
/// stripping
pub const PARENTHETICAL_ARTIST_FLOOR: f64 = 0.85;

/// Similarity of two strings in [0, 1], case- and whitespace-insensitive
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    strsim::normalized_levenshtein(&a, &b)
}

/// Artist similarity threshold for a given title similarity
///
/// Near-exact titles tolerate loose artist agreement (handles provider-side
/// artist name decoration); weaker title matches demand more.
pub fn artist_threshold(title_similarity: f64) -> f64 {
    if title_similarity >= 0.95 {
        0.45
    } else if title_similarity >= 0.85 {
        0.60
    } else {
        0.70
    }
}

/// Per-candidate similarity scores
#[derive(Debug, Clone, Copy)]
pub struct MatchScore {
    /// Best title similarity across the comparison variants
    pub title: f64,
    /// Artist similarity against the primary artist
    pub artist: f64,
    /// True when the best title similarity came from the
    /// parenthetical-stripped variant
    pub via_parenthetical: bool,
}

/// Score a candidate against the target
///
/// The parenthetical-stripped similarity is only allowed to become the best
/// title score when the artist similarity clears
/// [`PARENTHETICAL_ARTIST_FLOOR`]; otherwise the candidate falls back to
/// the other variants.
pub fn score_candidate(
    target: &TitleVariants,
    target_primary_artist: &str,
    candidate_title: &str,
    candidate_artist: &str,
) -> MatchScore {
    let candidate = TitleVariants::of(candidate_title);
    let artist = similarity(target_primary_artist, candidate_artist);

    let direct = similarity(&target.clean, &candidate.clean);
    let no_feat = similarity(&target.no_feat, &candidate.no_feat);
    let no_article = similarity(&target.no_article, &candidate.no_article);
    let no_parens = similarity(&target.no_parens, &candidate.no_parens);

    let base_best = direct.max(no_feat).max(no_article);

    if no_parens > base_best && artist >= PARENTHETICAL_ARTIST_FLOOR {
        MatchScore {
            title: no_parens,
            artist,
            via_parenthetical: true,
        }
    } else {
        MatchScore {
            title: base_best,
            artist,
            via_parenthetical: false,
        }
    }
}

/// Apply the acceptance policy to a scored candidate
pub fn accepts(score: &MatchScore, target_primary_artist: &str, candidate_artist: &str) -> bool {
    if score.title < TITLE_FLOOR {
        return false;
    }

    if score.artist >= artist_threshold(score.title) {
        return true;
    }

    // One artist string containing the other also counts as agreement
    // (e.g. "Post Malone" inside "Post Malone & Swae Lee")
    let a = target_primary_artist.trim().to_lowercase();
    let b = candidate_artist.trim().to_lowercase();
    !a.is_empty() && !b.is_empty() && (a.contains(&b) || b.contains(&a))
}

/// Score a candidate and apply the acceptance policy in one step
pub fn evaluate(
    target: &TitleVariants,
    target_primary_artist: &str,
    candidate_title: &str,
    candidate_artist: &str,
) -> Option<MatchScore> {
    let score = score_candidate(target, target_primary_artist, candidate_title, candidate_artist);
    if accepts(&score, target_primary_artist, candidate_artist) {
        Some(score)
    } else {
        None
    }
}
