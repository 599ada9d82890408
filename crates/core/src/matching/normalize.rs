//! Text normalization for track comparison.

use once_cell::sync::Lazy;
use regex_lite::Regex;

/// Markers distinguishing track variants (remixes, live cuts, ...).
///
/// Order matters: multi-word markers come before their substrings so the
/// first word-boundary hit is the most specific one.
const VERSION_MARKERS: &[&str] = &[
    "radio edit",
    "remix",
    "mix",
    "edit",
    "version",
    "acoustic",
    "live",
    "instrumental",
    "extended",
    "demo",
    "remaster",
    "cover",
    "vip",
    "bootleg",
    "mashup",
];

static FEATURED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+(?:feat\.?|ft\.?|featuring)\s+.*$").unwrap());

static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*[\[(][^\])]*[\])]").unwrap());

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());

static MARKER_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    VERSION_MARKERS
        .iter()
        .map(|marker| {
            let escaped = marker.replace(' ', r"\s+");
            (*marker, Regex::new(&format!(r"\b{escaped}\b")).unwrap())
        })
        .collect()
});

/// Remove a trailing featured-artist clause ("feat. X", "ft X", "featuring X").
pub fn strip_featured(text: &str) -> String {
    FEATURED.replace(text, "").trim().to_string()
}

/// Normalize a name for comparison: features stripped, optionally brackets
/// stripped, punctuation collapsed to spaces, lowercased, whitespace folded.
///
/// `preserve_version` keeps bracketed content so "(Remix)" style qualifiers
/// survive into the comparison.
pub fn normalize(text: &str, preserve_version: bool) -> String {
    let mut text = strip_featured(text);
    if !preserve_version {
        text = BRACKETED.replace_all(&text, "").to_string();
    }
    let text = NON_WORD.replace_all(&text, " ");
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Detect the first version marker in a title, if any.
///
/// Word-boundary matching keeps "remixed by" from matching "mix" and
/// "alive" from matching "live".
pub fn version_marker(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    MARKER_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(&lower))
        .map(|(marker, _)| *marker)
}

/// Coarse per-run identity for duplicate suppression.
///
/// Deliberately coarser than [`normalize`]: no feature or version
/// stripping, so "Song" and "Song (Remix)" are distinct keys.
pub fn dedup_key(artist: &str, title: &str) -> (String, String) {
    (
        artist.trim().to_lowercase(),
        title.trim().to_lowercase(),
    )
}
