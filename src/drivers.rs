//! Collaborator contracts consumed by the session core.
//!
//! Audio capture, transcription, wake-word spotting, and UI rendering are
//! external concerns; the core drives them through these narrow traits and
//! owns nothing of their internals. All of them are object-safe so the core
//! can hold boxed implementations chosen by the host.

use crate::config::UiConfig;
use crate::error::Result;
use crate::session::SessionState;
use async_trait::async_trait;

/// One captured utterance, opaque to the core.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    /// Container/mime tag the transcription provider expects ("audio/wav").
    pub mime_type: String,
}

/// Microphone capture.
///
/// The microphone is an exclusive resource: implementations must hold it
/// only between `start_recording` and `stop_recording`/`release`, and
/// `release` must be safe to call repeatedly; the core calls it on every
/// session stop and on every error.
#[async_trait]
pub trait AudioCapturer: Send {
    /// Acquire the microphone and start capturing.
    async fn start_recording(&mut self) -> Result<()>;
    /// Stop capturing and hand back the recorded utterance.
    async fn stop_recording(&mut self) -> Result<AudioClip>;
    /// Drop the microphone without producing a clip.
    fn release(&mut self);
}

/// Speech-to-text provider.
#[async_trait]
pub trait TranscriptionDriver: Send {
    /// Prepare the driver for a language.
    async fn init(&mut self, language: &str) -> Result<()>;
    /// Transcribe one utterance. Failure surfaces as an error.
    async fn transcribe(&self, clip: &AudioClip) -> Result<String>;
    /// Language codes this provider supports.
    fn available_languages(&self) -> Vec<String>;
}

/// Passive wake-word spotting plus stop-word checks on transcripts.
pub trait WakeWordDetector: Send {
    /// Configure the word lists.
    fn init(&mut self, wake_words: &[String], stop_words: &[String]);
    /// Resume passive spotting.
    fn start(&mut self);
    /// Suspend passive spotting (active capture owns the microphone).
    fn stop(&mut self);
    /// Whether a transcript contains a configured stop word.
    fn check_for_stop_word(&self, text: &str) -> bool;
}

/// Pure renderer for session status. Never mutates session state.
pub trait UiHandler: Send {
    fn init(&mut self, config: &UiConfig);
    fn update_from_state(&mut self, state: SessionState);
    fn set_transcription(&mut self, text: &str);
}

/// Stop-word matching over word boundaries, shared by detector
/// implementations.
#[must_use]
pub fn contains_stop_word(text: &str, stop_words: &[String]) -> bool {
    let normalized = crate::similarity::normalize(text);
    stop_words.iter().any(|w| {
        let w = crate::similarity::normalize(w);
        !w.is_empty()
            && (normalized == w
                || normalized.starts_with(&format!("{w} "))
                || normalized.ends_with(&format!(" {w}"))
                || normalized.contains(&format!(" {w} ")))
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn stop_word_matches_on_word_boundaries() {
        let words = vec!["stop listening".to_owned()];
        assert!(contains_stop_word("stop listening", &words));
        assert!(contains_stop_word("ok stop listening now", &words));
        assert!(contains_stop_word("Stop Listening!", &words));
        assert!(!contains_stop_word("nonstop listening party", &words));
        assert!(!contains_stop_word("keep going", &words));
    }

    #[test]
    fn empty_stop_word_never_matches() {
        assert!(!contains_stop_word("anything", &[String::new()]));
    }
}
