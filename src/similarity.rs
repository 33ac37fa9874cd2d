//! String-similarity primitives shared by the pattern matcher and the
//! element resolver.
//!
//! Everything here operates on lower-cased, punctuation-stripped token
//! forms. Three signals are built on top of that normalization: token-set
//! overlap, token-order preservation (longest common subsequence of token
//! sequences), and whole-string edit-distance similarity via `strsim`.

/// Lower-case a name, strip punctuation, and split into tokens.
///
/// Hyphens and underscores count as separators so "first-name" and
/// "first name" tokenize identically.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .map(|t| {
            t.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
        })
        .filter(|t| !t.is_empty())
        .collect()
}

/// Canonical comparison form: normalized tokens re-joined with single spaces.
#[must_use]
pub fn normalize(text: &str) -> String {
    tokenize(text).join(" ")
}

/// Token-set overlap: shared tokens divided by the size of the union.
///
/// Returns a value in `[0, 1]`; 0 when either side has no tokens.
#[must_use]
pub fn token_overlap(a: &[String], b: &[String]) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.iter().filter(|t| b.contains(t)).count();
    let union = a.len() + b.len() - shared;
    if union == 0 {
        return 0.0;
    }
    shared as f32 / union as f32
}

/// Length of the longest common subsequence of two token sequences.
///
/// Order-sensitive: measures how much of one name appears in the other in
/// the same order, regardless of insertions.
#[must_use]
pub fn lcs_len(a: &[String], b: &[String]) -> usize {
    let (n, m) = (a.len(), b.len());
    if n == 0 || m == 0 {
        return 0;
    }
    // Single-row DP over the shorter dimension.
    let mut prev = vec![0usize; m + 1];
    let mut curr = vec![0usize; m + 1];
    for i in 1..=n {
        for j in 1..=m {
            curr[j] = if a[i - 1] == b[j - 1] {
                prev[j - 1] + 1
            } else {
                prev[j].max(curr[j - 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
        curr.fill(0);
    }
    prev[m]
}

/// Token-order similarity: LCS length normalized by the longer sequence.
#[must_use]
pub fn token_order_similarity(a: &[String], b: &[String]) -> f32 {
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 0.0;
    }
    lcs_len(a, b) as f32 / longest as f32
}

/// Whole-string edit-distance similarity in `[0, 1]`.
#[must_use]
pub fn edit_similarity(a: &str, b: &str) -> f32 {
    strsim::normalized_levenshtein(a, b) as f32
}

/// Per-token rating used by the fuzzy keyword scan.
///
/// Jaro-Winkler weights shared prefixes, which suits transcription noise:
/// STT tends to get the start of a word right and mangle the tail.
#[must_use]
pub fn token_rating(a: &str, b: &str) -> f32 {
    strsim::jaro_winkler(a, b) as f32
}

/// Bigram rating used when rewriting input words toward the registry
/// vocabulary. Sørensen-Dice stays near zero for words that merely share a
/// first letter, so entity words are not dragged into keywords.
#[must_use]
pub fn bigram_rating(a: &str, b: &str) -> f32 {
    strsim::sorensen_dice(a, b) as f32
}

/// Whether `needle`'s tokens occur as a contiguous run inside `haystack`'s
/// tokens (whole-token-bounded containment).
#[must_use]
pub fn contains_token_phrase(haystack: &[String], needle: &[String]) -> bool {
    if needle.is_empty() || needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}
