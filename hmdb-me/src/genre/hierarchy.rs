//! Hierarchical genre mapping
//!
//! A fixed table folds the raw labels providers return ("neo soul",
//! "conscious hip hop", "nu metal") into a closed set of primary genres.
//! Labels with no mapping land in `other` so the closed set is total.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// The closed set of primary genres
pub const PRIMARY_GENRES: [&str; 11] = [
    "pop",
    "hip-hop",
    "rock",
    "alternative",
    "country",
    "electronic",
    "r&b",
    "latin",
    "folk",
    "jazz",
    "other",
];

/// Raw label -> primary genre mapping table
static PRIMARY_GENRE_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let entries = [
        // Pop variants
        ("pop", "pop"),
        ("dance pop", "pop"),
        ("electropop", "pop"),
        ("synth pop", "pop"),
        ("synthpop", "pop"),
        ("teen pop", "pop"),
        ("power pop", "pop"),
        ("art pop", "pop"),
        ("baroque pop", "pop"),
        ("chamber pop", "pop"),
        // Hip-hop variants
        ("rap", "hip-hop"),
        ("hip-hop", "hip-hop"),
        ("hip hop", "hip-hop"),
        ("trap", "hip-hop"),
        ("pop rap", "hip-hop"),
        ("melodic rap", "hip-hop"),
        ("conscious hip hop", "hip-hop"),
        ("old school hip hop", "hip-hop"),
        ("east coast hip hop", "hip-hop"),
        ("west coast hip hop", "hip-hop"),
        ("southern hip hop", "hip-hop"),
        ("drill", "hip-hop"),
        ("grime", "hip-hop"),
        // Rock variants
        ("rock", "rock"),
        ("hard rock", "rock"),
        ("classic rock", "rock"),
        ("progressive rock", "rock"),
        ("psychedelic rock", "rock"),
        ("garage rock", "rock"),
        ("blues rock", "rock"),
        ("folk rock", "rock"),
        ("pop rock", "rock"),
        ("punk rock", "rock"),
        ("metal", "rock"),
        ("heavy metal", "rock"),
        // Alternative variants
        ("alternative", "alternative"),
        ("alternative rock", "alternative"),
        ("indie", "alternative"),
        ("indie rock", "alternative"),
        ("indie pop", "alternative"),
        ("alternative pop", "alternative"),
        ("indie folk", "alternative"),
        ("shoegaze", "alternative"),
        ("post-punk", "alternative"),
        ("post-rock", "alternative"),
        ("emo", "alternative"),
        ("grunge", "alternative"),
        ("new wave", "alternative"),
        ("britpop", "alternative"),
        // Country variants
        ("country", "country"),
        ("country pop", "country"),
        ("new country", "country"),
        ("country rock", "country"),
        ("americana", "country"),
        ("bluegrass", "country"),
        ("country folk", "country"),
        // Electronic variants
        ("electronic", "electronic"),
        ("edm", "electronic"),
        ("house", "electronic"),
        ("techno", "electronic"),
        ("trance", "electronic"),
        ("dubstep", "electronic"),
        ("ambient", "electronic"),
        ("drum and bass", "electronic"),
        ("breakbeat", "electronic"),
        ("garage", "electronic"),
        ("uk garage", "electronic"),
        ("future bass", "electronic"),
        ("synthwave", "electronic"),
        // R&B variants
        ("r&b", "r&b"),
        ("rnb", "r&b"),
        ("rhythm and blues", "r&b"),
        ("soul", "r&b"),
        ("neo soul", "r&b"),
        ("contemporary r&b", "r&b"),
        ("funk", "r&b"),
        ("gospel", "r&b"),
        ("motown", "r&b"),
        // Latin variants
        ("latin", "latin"),
        ("reggaeton", "latin"),
        ("latin pop", "latin"),
        ("latin trap", "latin"),
        ("salsa", "latin"),
        ("bachata", "latin"),
        ("merengue", "latin"),
        ("cumbia", "latin"),
        ("regional mexican", "latin"),
        ("mariachi", "latin"),
        // Folk variants
        ("folk", "folk"),
        ("acoustic", "folk"),
        ("singer-songwriter", "folk"),
        ("contemporary folk", "folk"),
        ("traditional folk", "folk"),
        ("celtic", "folk"),
        ("world music", "folk"),
        ("world", "folk"),
        // Jazz variants
        ("jazz", "jazz"),
        ("smooth jazz", "jazz"),
        ("bebop", "jazz"),
        ("fusion", "jazz"),
        ("acid jazz", "jazz"),
        ("latin jazz", "jazz"),
        ("big band", "jazz"),
        ("swing", "jazz"),
        ("cool jazz", "jazz"),
        ("hard bop", "jazz"),
    ];

    entries.into_iter().collect()
});

/// Map a raw genre label onto the closed primary set
///
/// Direct table lookup first, then substring containment in either
/// direction for unlisted variants ("progressive metal" contains "metal"),
/// falling back to `other`.
pub fn map_to_primary(label: &str) -> &'static str {
    let lower = label.trim().to_lowercase();

    if let Some(primary) = PRIMARY_GENRE_MAP.get(lower.as_str()) {
        return primary;
    }

    for (known, primary) in PRIMARY_GENRE_MAP.iter() {
        if lower.contains(known) || known.contains(lower.as_str()) {
            return primary;
        }
    }

    "other"
}

/// Whether a label is itself a primary genre name (case-insensitive)
pub fn is_primary_genre(label: &str) -> bool {
    let lower = label.trim().to_lowercase();
    PRIMARY_GENRES.iter().any(|g| *g == lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_mapping() {
        assert_eq!(map_to_primary("rap"), "hip-hop");
        assert_eq!(map_to_primary("neo soul"), "r&b");
        assert_eq!(map_to_primary("trap"), "hip-hop");
        assert_eq!(map_to_primary("reggaeton"), "latin");
        assert_eq!(map_to_primary("bluegrass"), "country");
    }

    #[test]
    fn test_mapping_is_case_insensitive() {
        assert_eq!(map_to_primary("RAP"), "hip-hop");
        assert_eq!(map_to_primary("  Neo Soul  "), "r&b");
    }

    #[test]
    fn test_substring_fallback() {
        // Not in the table, but contains a known label
        assert_eq!(map_to_primary("progressive metal"), "rock");
        assert_eq!(map_to_primary("deep house"), "electronic");
    }

    #[test]
    fn test_unknown_label_maps_to_other() {
        assert_eq!(map_to_primary("polka revival wave"), "other");
    }

    #[test]
    fn test_mapped_targets_are_in_closed_set() {
        for primary in PRIMARY_GENRE_MAP.values() {
            assert!(
                PRIMARY_GENRES.contains(primary),
                "'{}' is not in the closed primary set",
                primary
            );
        }
    }

    #[test]
    fn test_is_primary_genre() {
        assert!(is_primary_genre("hip-hop"));
        assert!(is_primary_genre("R&B"));
        assert!(!is_primary_genre("neo soul"));
        assert!(!is_primary_genre("trap"));
    }
}
