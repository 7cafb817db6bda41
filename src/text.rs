//! Bangladesh-aware text normalization for English, বাংলা, and romanized
//! phonetic Bengali ("Banglish") content.
//!
//! Every matcher and lexicon in this crate operates on the output of
//! [`normalize_text`], so the normalizer must be idempotent.

use regex::Regex;
use std::sync::LazyLock;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)https?://\S+|www\.\S+").unwrap());
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[\w.-]+@[\w.-]+\.\w+\b").unwrap());
// Keep Bangla letters, Latin letters, digits, and a small set of symbols
// useful in finance (৳, %, +, -, .).
static CLEAN_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9A-Za-z\x{0980}-\x{09FF}\s৳%+.-]").unwrap());
static MULTI_SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static NON_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w]+").unwrap());
static UNDERSCORE_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_+").unwrap());

/// Normalizes mixed English/Bengali/Banglish text for matching.
///
/// - Lowercases Latin text
/// - Strips URLs and emails
/// - Folds Bengali digits (০–৯) to ASCII
/// - Canonicalizes decomposed nukta letter forms (য়, ড়, ঢ়)
/// - Replaces noisy punctuation with spaces, keeping finance symbols
/// - Collapses whitespace
pub fn normalize_text(text: &str) -> String {
    let t = URL_RE.replace_all(text, " ");
    let t = EMAIL_RE.replace_all(&t, " ");
    let t = fold_bengali_digits(&t);
    let t = canonicalize_bengali(&t);
    let t = t.to_lowercase();
    let t = CLEAN_CHARS_RE.replace_all(&t, " ");
    MULTI_SPACE_RE.replace_all(&t, " ").trim().to_string()
}

/// [`normalize_text`] over an optional field; missing values become `""`.
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize_text).unwrap_or_default()
}

/// Returns `true` if the text contains any character in the Bengali
/// Unicode block (U+0980–U+09FF).
pub fn contains_bengali(text: &str) -> bool {
    text.chars().any(|c| ('\u{0980}'..='\u{09FF}').contains(&c))
}

/// Builds a column-safe slug from a taxonomy value. Empty input slugs to `"na"`.
pub fn slugify(name: &str) -> String {
    let n = normalize_text(name);
    let n = NON_WORD_RE.replace_all(&n, "_");
    let n = UNDERSCORE_RUN_RE.replace_all(&n, "_");
    let n = n.trim_matches('_');
    if n.is_empty() { "na".to_string() } else { n.to_string() }
}

fn fold_bengali_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '০' => '0',
            '১' => '1',
            '২' => '2',
            '৩' => '3',
            '৪' => '4',
            '৫' => '5',
            '৬' => '6',
            '৭' => '7',
            '৮' => '8',
            '৯' => '9',
            other => other,
        })
        .collect()
}

// Facebook exports mix composed and decomposed forms of the nukta letters;
// fold the decomposed base+nukta pairs into the composed code points so
// phrase matching sees one spelling.
fn canonicalize_bengali(text: &str) -> String {
    text.replace("\u{09AF}\u{09BC}", "\u{09DF}") // য় -> য়
        .replace("\u{09A1}\u{09BC}", "\u{09DC}") // ড় -> ড়
        .replace("\u{09A2}\u{09BC}", "\u{09DD}") // ঢ় -> ঢ়
}

/// Whether `phrase` occurs in `text` delimited by whitespace (or the
/// string edges). Both arguments are expected to be normalized already.
pub fn word_boundary_contains(text: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return false;
    }
    let mut start = 0;
    while let Some(pos) = text[start..].find(phrase) {
        let begin = start + pos;
        let end = begin + phrase.len();
        let ok_before = begin == 0
            || text[..begin].chars().next_back().is_some_and(|c| c.is_whitespace());
        let ok_after =
            end == text.len() || text[end..].chars().next().is_some_and(|c| c.is_whitespace());
        if ok_before && ok_after {
            return true;
        }
        // Advance past this occurrence on a char boundary.
        start = begin + phrase.chars().next().map_or(1, |c| c.len_utf8());
        if start >= text.len() {
            break;
        }
    }
    false
}
