//! Spoken-value normalization.
//!
//! Converts what the user said into the literal a control accepts: spoken
//! email punctuation into symbols, relative and natural dates into
//! `YYYY-MM-DD`, times into `HH:MM`, noisy numbers into a bare literal.
//! Normalizers never fail: anything unparseable passes through unchanged
//! and the control rejects or accepts it on its own terms.

use crate::surface::{Control, ControlKind, InputKind};
use chrono::{Datelike, Duration, Local, NaiveDate, NaiveTime};

/// A value normalizer for one family of controls.
pub trait ValueNormalizer: Sync {
    /// Whether this normalizer applies to the control and raw value.
    fn can_normalize(&self, control: &Control, raw: &str) -> bool;
    /// Produce the control-appropriate literal. Falls back to `raw`.
    fn normalize(&self, control: &Control, raw: &str) -> String;
}

fn input_kind(control: &Control) -> Option<InputKind> {
    match &control.kind {
        ControlKind::TextInput { input, .. } => Some(*input),
        _ => None,
    }
}

fn declared_bounds(control: &Control) -> (Option<&str>, Option<&str>) {
    match &control.kind {
        ControlKind::TextInput { min, max, .. } => (min.as_deref(), max.as_deref()),
        _ => (None, None),
    }
}

// ── Email ───────────────────────────────────────────────────────────

pub struct EmailNormalizer;

impl ValueNormalizer for EmailNormalizer {
    fn can_normalize(&self, control: &Control, _raw: &str) -> bool {
        input_kind(control) == Some(InputKind::Email)
    }

    fn normalize(&self, _control: &Control, raw: &str) -> String {
        raw.split_whitespace()
            .map(|word| match word.to_lowercase().as_str() {
                "at" => "@",
                "dot" => ".",
                "underscore" => "_",
                "dash" => "-",
                "plus" => "+",
                _ => word,
            })
            .collect::<Vec<_>>()
            .concat()
    }
}

// ── Date ────────────────────────────────────────────────────────────

pub struct DateNormalizer;

const MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

/// Parse a natural-language date: relative words, ISO, or "<month> <day>
/// [<year>]" with ordinal suffixes and filler words tolerated.
fn parse_natural_date(raw: &str, today: NaiveDate) -> Option<NaiveDate> {
    let lower = raw.trim().to_lowercase();
    match lower.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        _ => {}
    }

    if let Ok(date) = NaiveDate::parse_from_str(&lower, "%Y-%m-%d") {
        return Some(date);
    }

    // "march 5", "5th of march", "march 5 2027". Day and year must be
    // digits; spelled-out numbers are left to the LLM path.
    let mut month: Option<u32> = None;
    let mut day: Option<u32> = None;
    let mut year: Option<i32> = None;
    for word in lower.split_whitespace() {
        if matches!(word, "of" | "the" | "on") {
            continue;
        }
        if let Some(m) = MONTHS.iter().position(|name| *name == word) {
            month = month.or(Some(m as u32 + 1));
            continue;
        }
        let digits: String = word
            .trim_end_matches("st")
            .trim_end_matches("nd")
            .trim_end_matches("rd")
            .trim_end_matches("th")
            .trim_end_matches(',')
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        if digits.is_empty() {
            return None;
        }
        let n: i64 = digits.parse().ok()?;
        if n >= 1000 {
            year = year.or(Some(n as i32));
        } else if (1..=31).contains(&n) {
            day = day.or(Some(n as u32));
        } else {
            return None;
        }
    }

    NaiveDate::from_ymd_opt(year.unwrap_or(today.year()), month?, day?)
}

fn clamp_date(date: NaiveDate, min: Option<&str>, max: Option<&str>) -> NaiveDate {
    let parse = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();
    let mut clamped = date;
    if let Some(lo) = min.and_then(parse)
        && clamped < lo
    {
        clamped = lo;
    }
    if let Some(hi) = max.and_then(parse)
        && clamped > hi
    {
        clamped = hi;
    }
    clamped
}

impl DateNormalizer {
    fn normalize_at(control: &Control, raw: &str, today: NaiveDate) -> String {
        match parse_natural_date(raw, today) {
            Some(date) => {
                let (min, max) = declared_bounds(control);
                clamp_date(date, min, max).format("%Y-%m-%d").to_string()
            }
            None => raw.to_owned(),
        }
    }
}

impl ValueNormalizer for DateNormalizer {
    fn can_normalize(&self, control: &Control, _raw: &str) -> bool {
        input_kind(control) == Some(InputKind::Date)
    }

    fn normalize(&self, control: &Control, raw: &str) -> String {
        Self::normalize_at(control, raw, Local::now().date_naive())
    }
}

// ── Time ────────────────────────────────────────────────────────────

pub struct TimeNormalizer;

fn parse_spoken_time(raw: &str) -> Option<NaiveTime> {
    let cleaned = raw
        .trim()
        .to_lowercase()
        .replace("o'clock", "")
        .replace("oclock", "");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    for format in ["%H:%M", "%I:%M %p", "%I %p", "%H:%M:%S"] {
        if let Ok(t) = NaiveTime::parse_from_str(&cleaned, format) {
            return Some(t);
        }
    }
    // Bare hour ("15", "7").
    if let Ok(hour) = cleaned.parse::<u32>() {
        return NaiveTime::from_hms_opt(hour, 0, 0);
    }
    None
}

fn clamp_time(time: NaiveTime, min: Option<&str>, max: Option<&str>) -> NaiveTime {
    let parse = |s: &str| NaiveTime::parse_from_str(s, "%H:%M").ok();
    let mut clamped = time;
    if let Some(lo) = min.and_then(parse)
        && clamped < lo
    {
        clamped = lo;
    }
    if let Some(hi) = max.and_then(parse)
        && clamped > hi
    {
        clamped = hi;
    }
    clamped
}

impl TimeNormalizer {
    fn normalize_at(control: &Control, raw: &str, now: NaiveTime) -> String {
        let parsed = if raw.trim().eq_ignore_ascii_case("now") {
            Some(now)
        } else {
            parse_spoken_time(raw)
        };
        match parsed {
            Some(time) => {
                let (min, max) = declared_bounds(control);
                clamp_time(time, min, max).format("%H:%M").to_string()
            }
            None => raw.to_owned(),
        }
    }
}

impl ValueNormalizer for TimeNormalizer {
    fn can_normalize(&self, control: &Control, _raw: &str) -> bool {
        input_kind(control) == Some(InputKind::Time)
    }

    fn normalize(&self, control: &Control, raw: &str) -> String {
        Self::normalize_at(control, raw, Local::now().time())
    }
}

// ── Numeric ─────────────────────────────────────────────────────────

pub struct NumericNormalizer;

/// First numeric literal in the cleaned text, or `None`.
fn extract_numeric_literal(raw: &str) -> Option<String> {
    // Thousands separators and the filler word "and" are noise.
    let cleaned = raw.replace(',', "");
    for word in cleaned.split_whitespace() {
        if word.eq_ignore_ascii_case("and") {
            continue;
        }
        let candidate: String = word
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
            .collect();
        let trimmed = candidate.trim_end_matches('.').trim_start_matches('.');
        if trimmed.chars().any(|c| c.is_ascii_digit()) && trimmed.parse::<f64>().is_ok() {
            return Some(trimmed.to_owned());
        }
    }
    None
}

impl ValueNormalizer for NumericNormalizer {
    fn can_normalize(&self, control: &Control, _raw: &str) -> bool {
        input_kind(control) == Some(InputKind::Number)
    }

    fn normalize(&self, _control: &Control, raw: &str) -> String {
        extract_numeric_literal(raw).unwrap_or_else(|| raw.to_owned())
    }
}

// ── Selection ───────────────────────────────────────────────────────

static NORMALIZERS: [&(dyn ValueNormalizer); 4] = [
    &EmailNormalizer,
    &DateNormalizer,
    &TimeNormalizer,
    &NumericNormalizer,
];

/// Apply the single matching normalizer, or pass the value through.
#[must_use]
pub fn normalize_value(control: &Control, raw: &str) -> String {
    for normalizer in NORMALIZERS {
        if normalizer.can_normalize(control, raw) {
            return normalizer.normalize(control, raw);
        }
    }
    raw.to_owned()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::surface::{ControlId, ControlKind};

    fn input(kind: InputKind, min: Option<&str>, max: Option<&str>) -> Control {
        Control {
            id: ControlId(0),
            voice_name: "field".into(),
            group: None,
            kind: ControlKind::TextInput {
                input: kind,
                value: String::new(),
                min: min.map(str::to_owned),
                max: max.map(str::to_owned),
            },
            in_viewport: true,
        }
    }

    #[test]
    fn email_spoken_symbols() {
        let c = input(InputKind::Email, None, None);
        assert_eq!(
            normalize_value(&c, "john at example dot com"),
            "john@example.com"
        );
        assert_eq!(
            normalize_value(&c, "jane dot doe plus news at mail dot org"),
            "jane.doe+news@mail.org"
        );
    }

    #[test]
    fn email_normalizer_only_for_email_inputs() {
        let c = input(InputKind::Text, None, None);
        assert_eq!(normalize_value(&c, "john at example dot com"), "john at example dot com");
    }

    #[test]
    fn date_relative_words() {
        let c = input(InputKind::Date, None, None);
        let today = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        assert_eq!(DateNormalizer::normalize_at(&c, "today", today), "2026-08-30");
        assert_eq!(DateNormalizer::normalize_at(&c, "tomorrow", today), "2026-08-31");
        assert_eq!(DateNormalizer::normalize_at(&c, "Yesterday", today), "2026-08-29");
    }

    #[test]
    fn date_today_uses_current_date() {
        let c = input(InputKind::Date, None, None);
        let expected = Local::now().date_naive().format("%Y-%m-%d").to_string();
        assert_eq!(normalize_value(&c, "today"), expected);
    }

    #[test]
    fn date_natural_forms() {
        let c = input(InputKind::Date, None, None);
        let today = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        assert_eq!(DateNormalizer::normalize_at(&c, "march 5", today), "2026-03-05");
        assert_eq!(DateNormalizer::normalize_at(&c, "5th of March", today), "2026-03-05");
        assert_eq!(DateNormalizer::normalize_at(&c, "March 5 2027", today), "2027-03-05");
        assert_eq!(DateNormalizer::normalize_at(&c, "2025-12-24", today), "2025-12-24");
    }

    #[test]
    fn date_clamped_to_bounds() {
        let c = input(InputKind::Date, Some("2026-01-01"), Some("2026-12-31"));
        let today = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        assert_eq!(DateNormalizer::normalize_at(&c, "march 5 2025", today), "2026-01-01");
        assert_eq!(DateNormalizer::normalize_at(&c, "march 5 2027", today), "2026-12-31");
    }

    #[test]
    fn date_unparseable_passes_through() {
        let c = input(InputKind::Date, None, None);
        let today = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        assert_eq!(DateNormalizer::normalize_at(&c, "someday maybe", today), "someday maybe");
    }

    #[test]
    fn time_forms() {
        let c = input(InputKind::Time, None, None);
        let now = NaiveTime::from_hms_opt(9, 41, 0).unwrap();
        assert_eq!(TimeNormalizer::normalize_at(&c, "now", now), "09:41");
        assert_eq!(TimeNormalizer::normalize_at(&c, "15:45", now), "15:45");
        assert_eq!(TimeNormalizer::normalize_at(&c, "3:30 pm", now), "15:30");
        assert_eq!(TimeNormalizer::normalize_at(&c, "7 am", now), "07:00");
    }

    #[test]
    fn time_clamped_and_fallback() {
        let c = input(InputKind::Time, Some("09:00"), Some("17:00"));
        let now = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        assert_eq!(TimeNormalizer::normalize_at(&c, "7 am", now), "09:00");
        assert_eq!(TimeNormalizer::normalize_at(&c, "11 pm", now), "17:00");
        assert_eq!(TimeNormalizer::normalize_at(&c, "whenever", now), "whenever");
    }

    #[test]
    fn numeric_extraction() {
        let c = input(InputKind::Number, None, None);
        assert_eq!(normalize_value(&c, "1,234,567"), "1234567");
        assert_eq!(normalize_value(&c, "about 3.14 roughly"), "3.14");
        assert_eq!(normalize_value(&c, "one hundred and 42"), "42");
        assert_eq!(normalize_value(&c, "minus -7 degrees"), "-7");
    }

    #[test]
    fn numeric_without_literal_passes_through() {
        let c = input(InputKind::Number, None, None);
        assert_eq!(normalize_value(&c, "a few"), "a few");
    }

    #[test]
    fn non_input_controls_pass_through() {
        let c = Control {
            id: ControlId(1),
            voice_name: "Submit".into(),
            group: None,
            kind: ControlKind::Button,
            in_viewport: true,
        };
        assert_eq!(normalize_value(&c, "today"), "today");
    }
}
