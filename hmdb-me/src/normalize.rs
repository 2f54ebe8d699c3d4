//! Title and artist normalization
//!
//! Pure string transforms shared by candidate search and fuzzy matching.
//! Chart titles carry decoration the lyrics provider does not use
//! (featuring clauses, remaster/radio/mix suffixes, censorship marks,
//! descriptive parenthetical subtitles), so matching works on a set of
//! progressively stripped variants rather than the raw title.

use once_cell::sync::Lazy;
use regex::Regex;

/// Suffix and clause patterns removed when cleaning a title for search
static TITLE_SUFFIX_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // Featuring/collaboration clauses
        r"(?i)\s*\(with\s+[^)]+\)",
        r"(?i)\s*\(feat\.?\s+[^)]+\)",
        r"(?i)\s*\(featuring\s+[^)]+\)",
        r"(?i)\s*\(ft\.?\s+[^)]+\)",
        r"(?i)\s*\(f/\s*[^)]+\)",
        r"(?i)\s*\(x\s+[^)]+\)",
        // Version/remaster/radio/mix decorations
        r"(?i)\s*-\s*Remastered[^-]*$",
        r"(?i)\s*\(Remastered[^)]*\)",
        r"(?i)\s*-\s*[^-]*Remaster[^-]*$",
        r"(?i)\s*-\s*[^-]*Version[^-]*$",
        r"(?i)\s*\([^)]*Version[^)]*\)",
        r#"(?i)\s*-\s*From\s+"[^"]+".*$"#,
        r#"(?i)\s*\(From\s+"[^"]+".*\)"#,
        r"(?i)\s*-\s*featured\s+in.*$",
        r"(?i)\s*\(featured\s+in[^)]+\)",
        r"(?i)\s*-\s*From\s+the.*$",
        r"(?i)\s*\(From\s+the[^)]+\)",
        r"(?i)\s*-\s*[^-]*Radio[^-]*$",
        r"(?i)\s*\([^)]*Radio[^)]*\)",
        r"(?i)\s*-\s*[^-]*Mix[^-]*$",
        r"(?i)\s*\([^)]*Mix[^)]*\)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid title suffix pattern"))
    .collect()
});

/// Censorship-mark restorations (chart listings mask profanity that the
/// lyrics provider spells out)
static CENSORSHIP_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"(?i)\bb\*+h\b", "bitch"),
        (r"(?i)\ba\*+\b", "ass"),
        (r"(?i)\bs\*+t\b", "shit"),
        (r"(?i)\bf\*+k\b", "fuck"),
        (r"(?i)\bn\*+a\b", "nigga"),
    ]
    .iter()
    .map(|(p, r)| (Regex::new(p).expect("invalid censorship pattern"), *r))
    .collect()
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("invalid pattern"));

static LEADING_ARTICLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(the|a|an)\s+").expect("invalid pattern"));

static PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\([^)]*\)").expect("invalid pattern"));

static TITLE_FEAT_CLAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*\(?(feat\.|ft\.)\s+[^)]*\)?").expect("invalid pattern"));

static ARTIST_FEAT_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s+(feat\.?|featuring|ft\.?|with|f/)\s+.*$").expect("invalid pattern")
});

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("invalid pattern"));

static ARTIST_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"['\-\.]").expect("invalid pattern"));

/// Collapse runs of whitespace and trim
pub fn normalize_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

/// Clean a title for search: drop decoration suffixes, restore censored
/// words, normalize whitespace. Case is preserved for use in queries.
pub fn clean_title(title: &str) -> String {
    let mut cleaned = title.to_string();

    for pattern in TITLE_SUFFIX_PATTERNS.iter() {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }

    for (pattern, replacement) in CENSORSHIP_PATTERNS.iter() {
        cleaned = pattern.replace_all(&cleaned, *replacement).into_owned();
    }

    normalize_whitespace(&cleaned)
}

/// Remove a leading article ("The X" -> "X")
pub fn strip_leading_article(s: &str) -> String {
    LEADING_ARTICLE.replace(s, "").trim().to_string()
}

/// Remove every parenthetical ("Young'n (Holla Back)" -> "Young'n")
pub fn strip_parentheticals(s: &str) -> String {
    normalize_whitespace(&PARENTHETICAL.replace_all(s, ""))
}

/// Remove featuring clauses from a title
pub fn strip_featuring(s: &str) -> String {
    normalize_whitespace(&TITLE_FEAT_CLAUSE.replace_all(s, ""))
}

/// Replace punctuation with spaces ("Anti-Hero" -> "Anti Hero")
pub fn strip_punctuation(s: &str) -> String {
    normalize_whitespace(&NON_WORD.replace_all(s, " "))
}

/// Drop apostrophes, hyphens, and periods from an artist name
/// ("Cam'ron" -> "Camron")
pub fn strip_artist_punctuation(s: &str) -> String {
    normalize_whitespace(&ARTIST_PUNCTUATION.replace_all(s, ""))
}

/// Extract the primary artist from a possibly collaborative artist string:
/// the text before the first comma, ampersand, or featuring-style separator.
pub fn primary_artist(artist: &str) -> String {
    let first = artist.split(',').next().unwrap_or(artist);
    let first = first.split('&').next().unwrap_or(first);
    ARTIST_FEAT_CLAUSE.replace(first, "").trim().to_string()
}

/// Lowercased comparison variants of one title
///
/// Downstream matching scores a candidate against each variant: the
/// parenthetical-stripped variant is held to a stricter artist bar because
/// subtitle-less titles are generic enough to collide across artists.
#[derive(Debug, Clone)]
pub struct TitleVariants {
    /// Cleaned title (decoration suffixes removed, censorship restored)
    pub clean: String,
    /// Cleaned title with featuring clauses removed
    pub no_feat: String,
    /// Cleaned title with a leading article removed
    pub no_article: String,
    /// Cleaned title with all parentheticals removed
    pub no_parens: String,
}

impl TitleVariants {
    pub fn of(title: &str) -> Self {
        let clean = clean_title(title).to_lowercase();
        Self {
            no_feat: strip_featuring(&clean),
            no_article: strip_leading_article(&clean),
            no_parens: strip_parentheticals(&clean),
            clean,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_title_removes_featuring_parenthetical() {
        assert_eq!(clean_title("Shape of You (feat. Artist)"), "Shape of You");
        assert_eq!(clean_title("Sicko Mode (with Drake)"), "Sicko Mode");
    }

    #[test]
    fn test_clean_title_removes_version_suffixes() {
        assert_eq!(clean_title("Anti-Hero - Radio Edit"), "Anti-Hero");
        assert_eq!(clean_title("Blinding Lights - 2020 Remaster"), "Blinding Lights");
        assert_eq!(clean_title("One More Time (Club Mix)"), "One More Time");
    }

    #[test]
    fn test_clean_title_restores_censored_words() {
        assert_eq!(clean_title("Bad B***h Anthem"), "Bad bitch Anthem");
        assert_eq!(clean_title("That S**t Crazy"), "That shit Crazy");
    }

    #[test]
    fn test_clean_title_plain_title_unchanged() {
        assert_eq!(clean_title("As It Was"), "As It Was");
    }

    #[test]
    fn test_strip_leading_article() {
        assert_eq!(strip_leading_article("The One"), "One");
        assert_eq!(strip_leading_article("A Thousand Miles"), "Thousand Miles");
        assert_eq!(strip_leading_article("An Innocent Man"), "Innocent Man");
        // Article mid-title stays
        assert_eq!(strip_leading_article("Over The Rainbow"), "Over The Rainbow");
    }

    #[test]
    fn test_strip_parentheticals() {
        assert_eq!(strip_parentheticals("Young'n (Holla Back)"), "Young'n");
        assert_eq!(strip_parentheticals("No Parens Here"), "No Parens Here");
    }

    #[test]
    fn test_strip_punctuation() {
        assert_eq!(strip_punctuation("Anti-Hero"), "Anti Hero");
        assert_eq!(strip_punctuation("P.I.M.P."), "P I M P");
    }

    #[test]
    fn test_strip_artist_punctuation() {
        assert_eq!(strip_artist_punctuation("Cam'ron"), "Camron");
        assert_eq!(strip_artist_punctuation("Jay-Z"), "JayZ");
    }

    #[test]
    fn test_primary_artist() {
        assert_eq!(primary_artist("Post Malone & Swae Lee"), "Post Malone");
        assert_eq!(primary_artist("Mariah Carey feat. Jay-Z"), "Mariah Carey");
        assert_eq!(primary_artist("Drake ft. Lil Wayne"), "Drake");
        assert_eq!(primary_artist("Beyonce featuring Jay-Z"), "Beyonce");
        assert_eq!(primary_artist("Santana, Rob Thomas"), "Santana");
        assert_eq!(primary_artist("Eminem"), "Eminem");
    }

    #[test]
    fn test_title_variants() {
        let variants = TitleVariants::of("The Young'n (Holla Back)");
        assert_eq!(variants.clean, "the young'n (holla back)");
        assert_eq!(variants.no_article, "young'n (holla back)");
        assert_eq!(variants.no_parens, "the young'n");
    }

    #[test]
    fn test_variants_strip_article_after_cleaning() {
        // Per the contract: the stripped variant equals the title minus the article
        let variants = TitleVariants::of("The One");
        assert_eq!(variants.no_article, "one");
    }
}
