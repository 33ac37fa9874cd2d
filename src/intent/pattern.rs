//! Rule-based intent recognition.
//!
//! Patterns are utterance templates with `(entity)` placeholders. Matching
//! runs in two stages: a structural *exact* pass that anchors the pattern's
//! literal context in the input and reads entities out of the spans between
//! them, and an independent *fuzzy* pass that rates the pattern's keywords
//! against the input tokens in order. When no pattern matches exactly but
//! one scores well fuzzily, the input is corrected toward the registry
//! vocabulary and re-matched.

use crate::config::RecognitionConfig;
use crate::intent::registry::{CommandRegistry, CommandTemplate};
use crate::intent::{EntityValue, IntentResult};
use crate::similarity::{bigram_rating, token_rating, tokenize};
use std::collections::BTreeMap;
use tracing::debug;

/// Exact confidence is coverage scaled into [0, 0.9] plus a specificity
/// bonus, so a pattern with more literal context outranks a looser one that
/// covers the same text.
const COVERAGE_WEIGHT: f32 = 0.9;
const SPECIFICITY_BONUS_PER_KEYWORD: f32 = 0.03;
const SPECIFICITY_BONUS_CAP: f32 = 0.1;

/// A parsed pattern piece.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// Split a pattern into literal and placeholder segments.
/// Unbalanced parentheses are treated as literal text.
fn parse_segments(pattern: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut rest = pattern;
    while let Some(open) = rest.find('(') {
        if let Some(close) = rest[open..].find(')') {
            let literal = rest[..open].trim();
            if !literal.is_empty() {
                segments.push(Segment::Literal(literal.to_lowercase()));
            }
            let name = rest[open + 1..open + close].trim();
            if !name.is_empty() {
                segments.push(Segment::Placeholder(name.to_owned()));
            }
            rest = &rest[open + close + 1..];
        } else {
            break;
        }
    }
    let tail = rest.trim();
    if !tail.is_empty() {
        segments.push(Segment::Literal(tail.to_lowercase()));
    }
    segments
}

/// Literal (non-placeholder) keywords of a pattern, lower-cased tokens.
pub(crate) fn pattern_keywords(pattern: &str) -> Vec<String> {
    parse_segments(pattern)
        .iter()
        .filter_map(|s| match s {
            Segment::Literal(text) => Some(tokenize(text)),
            Segment::Placeholder(_) => None,
        })
        .flatten()
        .collect()
}

/// Lower-case, drop characters that carry no spoken content, collapse
/// whitespace. Keeps `@ . - '` so spoken values survive intact.
fn normalize_input(text: &str) -> String {
    let filtered: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() || matches!(c, '@' | '.' | '-' | '\'') {
                c
            } else {
                ' '
            }
        })
        .collect();
    let collapsed = filtered.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.trim_end_matches(['.', ',']).trim().to_owned()
}

/// Find `needle` in `text` at or after `from`, requiring token boundaries
/// on both sides. Returns byte range.
fn find_token_bounded(text: &str, needle: &str, from: usize) -> Option<(usize, usize)> {
    let mut search = from;
    while search <= text.len() {
        let rel = text.get(search..)?.find(needle)?;
        let start = search + rel;
        let end = start + needle.len();
        let before_ok = start == 0
            || !text[..start]
                .chars()
                .next_back()
                .is_some_and(char::is_alphanumeric);
        let after_ok = end == text.len()
            || !text[end..].chars().next().is_some_and(char::is_alphanumeric);
        if before_ok && after_ok {
            return Some((start, end));
        }
        search = end.max(start + 1);
    }
    None
}

fn value_allowed(template: &CommandTemplate, entity: &str, captured: &str) -> bool {
    template
        .allowed_values(entity)
        .is_none_or(|allowed| allowed.iter().any(|v| v == captured))
}

/// A successful structural match of one pattern against the input.
#[derive(Debug)]
struct ExactMatch {
    entities: BTreeMap<String, String>,
    confidence: f32,
}

/// Structurally match one pattern against normalized input.
///
/// Literals must appear in order with token boundaries; a placeholder
/// captures the trimmed span framed by its neighboring literals (or the
/// input edge). A trailing remainder is absorbed into the pattern's last
/// placeholder when that entity is flagged raw, and otherwise reduces
/// coverage.
fn match_exact(template: &CommandTemplate, pattern: &str, text: &str) -> Option<ExactMatch> {
    let segments = parse_segments(pattern);
    if segments.is_empty() || text.is_empty() {
        return None;
    }

    let mut entities: BTreeMap<String, String> = BTreeMap::new();
    let mut pos = 0usize;
    let mut covered_end = 0usize;
    let mut pending: Option<&str> = None;
    let mut last_placeholder: Option<&str> = None;
    let mut keyword_count = 0usize;

    for segment in &segments {
        match segment {
            Segment::Literal(literal) => {
                keyword_count += tokenize(literal).len();
                let (start, end) = find_token_bounded(text, literal, pos)?;
                match pending.take() {
                    Some(name) => {
                        let captured = text[pos..start].trim();
                        if captured.is_empty() || !value_allowed(template, name, captured) {
                            return None;
                        }
                        entities.insert(name.to_owned(), captured.to_owned());
                    }
                    None => {
                        // Without a placeholder in between, the literal must
                        // be adjacent (whitespace only) to the previous one,
                        // and anchored at the start for the first segment.
                        if !text[pos..start].trim().is_empty() {
                            return None;
                        }
                    }
                }
                pos = end;
                covered_end = end;
            }
            Segment::Placeholder(name) => {
                pending = Some(name);
                last_placeholder = Some(name);
            }
        }
    }

    if let Some(name) = pending {
        let captured = text[pos..].trim();
        if captured.is_empty() || !value_allowed(template, name, captured) {
            return None;
        }
        entities.insert(name.to_owned(), captured.to_owned());
        covered_end = text.len();
    }

    // Trailing free text beyond the matched segment.
    let trailing = text[covered_end..].trim();
    if !trailing.is_empty()
        && let Some(name) = last_placeholder
        && template.is_raw(name)
        && let Some(value) = entities.get_mut(name)
    {
        value.push(' ');
        value.push_str(trailing);
        covered_end = text.len();
    }

    let coverage = covered_end as f32 / text.len() as f32;
    let bonus =
        (keyword_count as f32 * SPECIFICITY_BONUS_PER_KEYWORD).min(SPECIFICITY_BONUS_CAP);
    let confidence = (coverage * COVERAGE_WEIGHT + bonus).min(1.0);

    Some(ExactMatch { entities, confidence })
}

/// Rule-based intent matcher over a command registry.
pub struct PatternMatcher {
    registry: CommandRegistry,
    config: RecognitionConfig,
}

impl PatternMatcher {
    #[must_use]
    pub fn new(registry: CommandRegistry, config: RecognitionConfig) -> Self {
        Self { registry, config }
    }

    #[must_use]
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Detect the intent expressed by `text`.
    ///
    /// Returns exactly one result: the best exact match above the exact
    /// threshold, else a corrected-input re-match when fuzzy scoring clears
    /// its threshold, else the unknown result.
    #[must_use]
    pub fn detect_intent(&self, text: &str) -> Vec<IntentResult> {
        let normalized = normalize_input(text);
        if normalized.is_empty() {
            return vec![IntentResult::unknown()];
        }

        if let Some(best) = self.best_exact(&normalized)
            && best.confidence >= self.config.exact_threshold
        {
            debug!(intent = %best.intent, confidence = best.confidence, "exact match");
            return vec![best];
        }

        let fuzzy = self.best_fuzzy(&normalized);
        if fuzzy > self.config.fuzzy_threshold {
            let corrected = self.correct_input(&normalized);
            if corrected != normalized
                && let Some(mut best) = self.best_exact(&corrected)
                && best.confidence >= self.config.exact_threshold
            {
                debug!(
                    intent = %best.intent,
                    fuzzy,
                    original = %normalized,
                    corrected = %corrected,
                    "corrected match"
                );
                // Correction introduces uncertainty: scale by the fuzzy
                // score instead of reporting the exact-pass confidence.
                best.confidence *= fuzzy;
                return vec![best];
            }
        }

        vec![IntentResult::unknown()]
    }

    /// Best exact match across all templates and patterns at this input.
    /// Ties resolve to the first template/pattern encountered.
    fn best_exact(&self, text: &str) -> Option<IntentResult> {
        let mut best: Option<IntentResult> = None;
        for template in self.registry.templates() {
            for pattern in &template.utterance_patterns {
                if let Some(m) = match_exact(template, pattern, text) {
                    let better = best
                        .as_ref()
                        .is_none_or(|b| m.confidence > b.confidence);
                    if better {
                        best = Some(IntentResult {
                            intent: template.intent.clone(),
                            confidence: m.confidence,
                            entities: m
                                .entities
                                .into_iter()
                                .map(|(k, v)| (k, EntityValue::Plain(v)))
                                .collect(),
                        });
                    }
                }
            }
        }
        best
    }

    /// Best fuzzy keyword score across all patterns.
    fn best_fuzzy(&self, text: &str) -> f32 {
        let mut best = 0.0f32;
        for template in self.registry.templates() {
            for pattern in &template.utterance_patterns {
                let s = self.fuzzy_score(pattern, text);
                if s > best {
                    best = s;
                }
            }
        }
        best
    }

    /// Average per-keyword rating for one pattern.
    ///
    /// Keywords are rated against the input tokens walking strictly forward,
    /// each keyword consuming its best-rated token. Any keyword below the
    /// floor zeroes the whole pattern.
    fn fuzzy_score(&self, pattern: &str, text: &str) -> f32 {
        let keywords = pattern_keywords(pattern);
        if keywords.is_empty() {
            return 0.0;
        }
        let input = tokenize(text);
        let mut position = 0usize;
        let mut total = 0.0f32;

        for keyword in &keywords {
            let mut best = 0.0f32;
            let mut best_index = position;
            for (i, token) in input.iter().enumerate().skip(position) {
                let rating = token_rating(keyword, token);
                if rating > best {
                    best = rating;
                    best_index = i;
                }
            }
            if best < self.config.keyword_floor {
                return 0.0;
            }
            total += best;
            position = best_index + 1;
        }

        total / keywords.len() as f32
    }

    /// Replace input words with their nearest registry keyword when the
    /// similarity clears the fuzzy threshold, leaving other words alone.
    ///
    /// Replacement rates with bigrams, not Jaro-Winkler: a word that merely
    /// starts like a keyword ("submit" / "select") must survive untouched.
    fn correct_input(&self, text: &str) -> String {
        let keywords = self.registry.keywords();
        tokenize(text)
            .into_iter()
            .map(|token| {
                if keywords.contains(&token) {
                    return token;
                }
                let mut best = 0.0f32;
                let mut best_keyword: Option<&String> = None;
                for keyword in &keywords {
                    let rating = bigram_rating(&token, keyword);
                    if rating > best {
                        best = rating;
                        best_keyword = Some(keyword);
                    }
                }
                match best_keyword {
                    Some(keyword) if best > self.config.fuzzy_threshold => keyword.clone(),
                    _ => token,
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
