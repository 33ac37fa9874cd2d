//! Configuration types for the voice-control pipeline.

use crate::error::{Result, VoxError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration for a voice-control session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceControlConfig {
    /// BCP-47-ish language code for recognition ("en", "de", "fr", ...).
    pub language: LanguageConfig,
    /// Intent recognition settings (provider selection + thresholds).
    pub recognition: RecognitionConfig,
    /// Remote LLM classifier connection settings.
    pub llm: LlmConfig,
    /// Actuator settings (settle delay, group matching floor).
    pub actuator: ActuatorConfig,
    /// Session state machine settings.
    pub session: SessionConfig,
    /// UI collaborator hints (placement, size, theme).
    pub ui: UiConfig,
}

/// Language selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Active language code. Entity values are canonicalized to English
    /// regardless of this setting; see the LLM classifier prompt rules.
    pub code: String,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self { code: "en".to_owned() }
    }
}

impl LanguageConfig {
    /// Whether the configured language is the default (English).
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.code == "en" || self.code.starts_with("en-")
    }
}

/// Which intent recognition provider to use.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognizerProvider {
    /// Rule-based pattern matching only.
    Pattern,
    /// Remote LLM classification only.
    Llm,
    /// Pattern matching first, LLM fallback when the pattern matcher
    /// returns only the unknown intent.
    #[default]
    Hybrid,
}

/// Intent recognition configuration.
///
/// The thresholds here are tunable, not load-bearing constants: the defaults
/// reproduce the behavior the test suite pins down, but embedders may adjust
/// them per deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Recognition provider selection.
    pub provider: RecognizerProvider,
    /// Minimum exact-match confidence to short-circuit fuzzy matching.
    pub exact_threshold: f32,
    /// Minimum average fuzzy score to attempt input correction.
    pub fuzzy_threshold: f32,
    /// Per-keyword similarity floor; a pattern with any keyword rating
    /// below this scores 0 overall.
    pub keyword_floor: f32,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            provider: RecognizerProvider::default(),
            exact_threshold: 0.9,
            fuzzy_threshold: 0.5,
            keyword_floor: 0.6,
        }
    }
}

/// Remote LLM classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL including `/v1` (e.g. `https://api.openai.com/v1`).
    pub api_url: String,
    /// Bearer token. Empty means unauthenticated (local servers).
    pub api_key: String,
    /// Model identifier sent in requests.
    pub api_model: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Sampling temperature. Low by default: classification should be
    /// deterministic, not creative.
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1".to_owned(),
            api_key: String::new(),
            api_model: "gpt-4o-mini".to_owned(),
            timeout_ms: 10_000,
            temperature: 0.1,
        }
    }
}

/// Actuator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    /// Pause between successive automated actions, in milliseconds.
    /// Gives the host view time to reflow between writes.
    pub settle_delay_ms: u64,
    /// Minimum resolver score for a within-group candidate (dropdown
    /// options, same-group radios) to be accepted.
    pub group_score_floor: f32,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 300,
            group_score_floor: 50.0,
        }
    }
}

/// Session state machine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long the session stays in `Error` before auto-recovering to
    /// `Listening` (active session) or `Idle`, in milliseconds.
    pub error_cooldown_ms: u64,
    /// Wake words that start an active session from passive spotting.
    pub wake_words: Vec<String>,
    /// Stop words that end the active session when spoken.
    pub stop_words: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            error_cooldown_ms: 3_000,
            wake_words: vec!["hey assistant".to_owned()],
            stop_words: vec!["stop listening".to_owned()],
        }
    }
}

/// Where the host view should place the voice-control widget.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UiPlacement {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

/// UI collaborator hints. The core never renders; these are passed through
/// to the UI handler's `init`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Widget placement within the host view.
    pub placement: UiPlacement,
    /// Widget size in logical pixels.
    pub size: u32,
    /// Theme name understood by the host ("light", "dark", ...).
    pub theme: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            placement: UiPlacement::default(),
            size: 56,
            theme: "dark".to_owned(),
        }
    }
}

impl VoiceControlConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text)
            .map_err(|e| VoxError::Config(format!("cannot parse {}: {e}", path.display())))
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(self)
            .map_err(|e| VoxError::Config(format!("cannot serialize config: {e}")))?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Validate threshold ranges.
    ///
    /// # Errors
    ///
    /// Returns an error when a threshold is outside its valid range.
    pub fn validate(&self) -> Result<()> {
        let r = &self.recognition;
        for (name, v) in [
            ("exact_threshold", r.exact_threshold),
            ("fuzzy_threshold", r.fuzzy_threshold),
            ("keyword_floor", r.keyword_floor),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(VoxError::Config(format!(
                    "recognition.{name} must be in [0, 1], got {v}"
                )));
            }
        }
        if self.actuator.group_score_floor < 0.0 {
            return Err(VoxError::Config(format!(
                "actuator.group_score_floor must be non-negative, got {}",
                self.actuator.group_score_floor
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn default_config_is_valid() {
        VoiceControlConfig::default().validate().unwrap();
    }

    #[test]
    fn default_thresholds() {
        let c = RecognitionConfig::default();
        assert!((c.exact_threshold - 0.9).abs() < f32::EPSILON);
        assert!((c.fuzzy_threshold - 0.5).abs() < f32::EPSILON);
        assert!((c.keyword_floor - 0.6).abs() < f32::EPSILON);
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let mut c = VoiceControlConfig::default();
        c.recognition.exact_threshold = 1.5;
        assert!(c.validate().is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let c: VoiceControlConfig = toml::from_str(
            r#"
            [language]
            code = "de"

            [recognition]
            provider = "pattern"
            "#,
        )
        .unwrap();
        assert_eq!(c.language.code, "de");
        assert_eq!(c.recognition.provider, RecognizerProvider::Pattern);
        assert!((c.recognition.exact_threshold - 0.9).abs() < f32::EPSILON);
        assert_eq!(c.actuator.settle_delay_ms, 300);
    }

    #[test]
    fn language_default_detection() {
        assert!(LanguageConfig { code: "en".into() }.is_default());
        assert!(LanguageConfig { code: "en-GB".into() }.is_default());
        assert!(!LanguageConfig { code: "de".into() }.is_default());
    }
}
