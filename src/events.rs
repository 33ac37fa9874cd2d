//! Session event bus.
//!
//! All pipeline stages publish to one dependency-injected broadcast channel
//! instead of a global emitter. The session core subscribes to drive state
//! transitions; the UI handler and tests subscribe to observe outcomes.

use crate::intent::IntentResult;
use crate::session::SessionState;
use tokio::sync::broadcast;

/// Default bus capacity. Outcome events are small and consumed quickly;
/// lagging subscribers drop the oldest events rather than blocking stages.
const BUS_CAPACITY: usize = 64;

/// Events flowing between the audio/recognition collaborators, the actuator,
/// and the session core.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// User pressed the record button (or equivalent host gesture).
    RecordPressed,
    /// User pressed the stop button.
    StopPressed,
    /// Passive spotter heard a wake word.
    WakeWordDetected { word: String },
    /// Microphone capture actually started.
    CaptureStarted,
    /// Microphone capture stopped; audio is on its way to transcription.
    CaptureStopped,
    /// Transcription completed for the current utterance.
    TranscriptionReady { text: String },
    /// Intent recognition completed for the current utterance.
    RecognitionCompleted { intents: Vec<IntentResult> },
    /// An action executed successfully.
    ActionPerformed {
        intent: String,
        entities: Vec<(String, String)>,
    },
    /// An action could not be executed; the batch continues.
    ActionPaused { intent: String, reason: String },
    /// The session state changed; the UI handler re-renders from this.
    StateChanged { state: SessionState },
    /// A session-level error occurred. `message` is user-presentable; the
    /// raw error never leaves the logs.
    ErrorOccurred { message: String },
}

/// Cloneable handle to the session event bus.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// Create a bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    /// Publish an event. Returns silently when nobody is subscribed;
    /// stages must not fail because observation is optional.
    pub fn publish(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }

    /// Subscribe to all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
