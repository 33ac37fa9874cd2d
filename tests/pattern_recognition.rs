//! Recognition properties over the built-in command vocabulary.
//!
//! Exercises the pattern matcher through the public API: exact pattern
//! substitution, fuzzy degradation, correction, and the unknown guarantee.

use voxact::config::RecognitionConfig;
use voxact::intent::{CommandRegistry, CommandTemplate, PatternMatcher, intents};

fn matcher() -> PatternMatcher {
    PatternMatcher::new(CommandRegistry::with_defaults(), RecognitionConfig::default())
}

/// For every default template, substituting literal values into each pattern
/// must detect that template's intent at or above the exact threshold, with
/// entities equal to the substituted values.
#[test]
fn exact_substitution_detects_every_template() {
    let registry = CommandRegistry::with_defaults();
    let m = matcher();
    let threshold = RecognitionConfig::default().exact_threshold;

    for template in registry.templates() {
        for pattern in &template.utterance_patterns {
            // Substitute a distinctive literal per placeholder.
            let mut text = pattern.clone();
            for entity in &template.expected_entities {
                text = text.replace(&format!("({entity})"), substitute_for(entity));
            }
            if text.contains('(') {
                continue;
            }

            let results = m.detect_intent(&text);
            assert_eq!(results.len(), 1, "pattern {pattern:?}");
            let r = &results[0];
            assert_eq!(r.intent, template.intent, "input {text:?}");
            assert!(
                r.confidence >= threshold,
                "input {text:?} confidence {}",
                r.confidence
            );
            for entity in r.entities.keys() {
                assert_eq!(
                    r.entity(entity),
                    Some(substitute_for(entity)),
                    "input {text:?} entity {entity:?}"
                );
            }
        }
    }
}

fn substitute_for(entity: &str) -> &'static str {
    match entity {
        "direction" => "down",
        "value" => "hello world",
        "group" => "payment",
        _ => "newsletter",
    }
}

#[test]
fn click_submit_button_extracts_target() {
    let results = matcher().detect_intent("click submit button");
    assert_eq!(results[0].intent, intents::CLICK_ELEMENT);
    assert!(results[0].confidence >= 0.8);
    assert_eq!(results[0].entity("target"), Some("submit button"));
}

#[test]
fn fill_email_extracts_target_and_value() {
    let results = matcher().detect_intent("fill email as john at example dot com");
    assert_eq!(results[0].intent, intents::FILL_INPUT);
    assert_eq!(results[0].entity("target"), Some("email"));
    assert_eq!(results[0].entity("value"), Some("john at example dot com"));
}

#[test]
fn unrelated_sentences_always_unknown() {
    let m = matcher();
    for text in [
        "the quick brown fox jumps over a lazy dog",
        "yesterday it rained for hours in edinburgh",
        "quantum flux harmonics resonate beautifully",
    ] {
        let results = m.detect_intent(text);
        assert_eq!(results.len(), 1, "input {text:?}");
        assert!(results[0].is_unknown(), "input {text:?}");
        assert_eq!(results[0].confidence, 0.0);
        assert!(results[0].entities.is_empty());
    }
}

#[test]
fn thresholds_are_configuration_not_law() {
    // A stricter exact threshold pushes a borderline match to unknown.
    let strict = RecognitionConfig {
        exact_threshold: 0.99,
        ..Default::default()
    };
    let m = PatternMatcher::new(CommandRegistry::with_defaults(), strict);
    // Full coverage with one keyword scores 0.93, below the raised bar.
    assert!(m.detect_intent("click submit button")[0].is_unknown());
}

#[test]
fn registered_template_participates_immediately() {
    let mut registry = CommandRegistry::with_defaults();
    registry.register(CommandTemplate::new(
        "set_volume",
        &["set volume to (level)"],
        &["level"],
    ));
    let m = PatternMatcher::new(registry, RecognitionConfig::default());
    let results = m.detect_intent("set volume to eleven");
    assert_eq!(results[0].intent, "set_volume");
    assert_eq!(results[0].entity("level"), Some("eleven"));
}
