//! Intent recognition: data model, pattern matcher, LLM classifier, and the
//! facade that selects between them per configuration.

pub mod llm;
pub mod pattern;
pub mod registry;

pub use llm::LlmClassifier;
pub use pattern::PatternMatcher;
pub use registry::{CommandRegistry, CommandTemplate, intents};

use crate::config::{RecognizerProvider, VoiceControlConfig};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// An entity value extracted from an utterance.
///
/// Values produced by the LLM classifier under a non-default language carry
/// both the canonical English form (used for resolution and normalization)
/// and the form the user actually spoke (used for display).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityValue {
    Plain(String),
    Spoken {
        english: String,
        #[serde(rename = "spokenForm")]
        spoken_form: String,
    },
}

impl EntityValue {
    /// The canonical English form, used by the resolver and normalizers.
    #[must_use]
    pub fn english(&self) -> &str {
        match self {
            Self::Plain(s) => s,
            Self::Spoken { english, .. } => english,
        }
    }

    /// The form to show the user.
    #[must_use]
    pub fn display(&self) -> &str {
        match self {
            Self::Plain(s) => s,
            Self::Spoken { spoken_form, .. } => spoken_form,
        }
    }
}

impl From<&str> for EntityValue {
    fn from(s: &str) -> Self {
        Self::Plain(s.to_owned())
    }
}

/// A recognized intent with its confidence and extracted entities.
/// Produced fresh per utterance; immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    pub intent: String,
    pub confidence: f32,
    #[serde(default)]
    pub entities: BTreeMap<String, EntityValue>,
}

impl IntentResult {
    /// The "nothing recognized" result: unknown intent, confidence 0,
    /// no entities.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            intent: intents::UNKNOWN.to_owned(),
            confidence: 0.0,
            entities: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.intent == intents::UNKNOWN
    }

    /// Look up an entity's canonical English value.
    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&str> {
        self.entities.get(name).map(EntityValue::english)
    }
}

/// Recognition facade: pattern matcher with optional LLM fallback.
///
/// Built by [`build_recognizer`]; the provider choice is an explicit enum in
/// configuration, not a runtime string tag.
pub struct IntentRecognizer {
    pattern: Option<PatternMatcher>,
    llm: Option<LlmClassifier>,
}

impl IntentRecognizer {
    /// Recognize intents in a transcript.
    ///
    /// Never fails: recognizer-level errors degrade to a single unknown
    /// result. In hybrid mode the LLM runs only when the pattern matcher
    /// produced nothing but unknown.
    pub async fn recognize(&self, text: &str) -> Vec<IntentResult> {
        if let Some(pattern) = &self.pattern {
            let results = pattern.detect_intent(text);
            if results.iter().any(|r| !r.is_unknown()) {
                return results;
            }
            debug!("pattern matcher found nothing, falling back");
        }

        if let Some(llm) = &self.llm {
            return llm.identify_intent(text).await;
        }

        vec![IntentResult::unknown()]
    }
}

/// Build the recognizer selected by configuration.
///
/// # Errors
///
/// Returns an error when the LLM provider is selected but its connection
/// settings are incomplete.
pub fn build_recognizer(
    config: &VoiceControlConfig,
    registry: CommandRegistry,
) -> Result<IntentRecognizer> {
    let recognizer = match config.recognition.provider {
        RecognizerProvider::Pattern => IntentRecognizer {
            pattern: Some(PatternMatcher::new(registry, config.recognition.clone())),
            llm: None,
        },
        RecognizerProvider::Llm => IntentRecognizer {
            pattern: None,
            llm: Some(LlmClassifier::new(&registry, &config.llm, &config.language)?),
        },
        RecognizerProvider::Hybrid => {
            let llm = match LlmClassifier::new(&registry, &config.llm, &config.language) {
                Ok(llm) => Some(llm),
                Err(e) => {
                    // Hybrid still works pattern-only; degraded, not fatal.
                    warn!("LLM fallback unavailable: {e}");
                    None
                }
            };
            IntentRecognizer {
                pattern: Some(PatternMatcher::new(registry, config.recognition.clone())),
                llm,
            }
        }
    };
    Ok(recognizer)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn unknown_result_shape() {
        let u = IntentResult::unknown();
        assert!(u.is_unknown());
        assert_eq!(u.confidence, 0.0);
        assert!(u.entities.is_empty());
    }

    #[test]
    fn entity_value_forms() {
        let plain = EntityValue::from("submit");
        assert_eq!(plain.english(), "submit");
        assert_eq!(plain.display(), "submit");

        let spoken = EntityValue::Spoken {
            english: "north".into(),
            spoken_form: "norden".into(),
        };
        assert_eq!(spoken.english(), "north");
        assert_eq!(spoken.display(), "norden");
    }

    #[test]
    fn entity_value_deserializes_both_shapes() {
        let plain: EntityValue = serde_json::from_str(r#""submit""#).unwrap();
        assert_eq!(plain, EntityValue::Plain("submit".into()));

        let spoken: EntityValue =
            serde_json::from_str(r#"{"english": "north", "spokenForm": "norden"}"#).unwrap();
        assert_eq!(spoken.english(), "north");
    }

    #[tokio::test]
    async fn pattern_only_recognizer_degrades_to_unknown() {
        let config = VoiceControlConfig {
            recognition: crate::config::RecognitionConfig {
                provider: RecognizerProvider::Pattern,
                ..Default::default()
            },
            ..Default::default()
        };
        let r = build_recognizer(&config, CommandRegistry::with_defaults()).unwrap();
        let results = r.recognize("the weather is nice in lisbon").await;
        assert_eq!(results.len(), 1);
        assert!(results[0].is_unknown());
    }
}
