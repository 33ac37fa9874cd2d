//! Session state machine.
//!
//! Owns the listening/recording/processing/executing lifecycle, drives the
//! audio and transcription collaborators, and hands recognized intents to
//! the actuator. One logical session per core; events from audio, network
//! calls, and UI gestures all funnel through the command channel, and a
//! cancellation token tied to the session supersedes in-flight cycles so a
//! late completion from a stopped session cannot transition state.

use crate::actuate::Actuator;
use crate::config::VoiceControlConfig;
use crate::drivers::{AudioCapturer, TranscriptionDriver, UiHandler, WakeWordDetector};
use crate::error::VoxError;
use crate::events::{EventBus, SessionEvent};
use crate::intent::IntentRecognizer;
use crate::surface::ControlSurface;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No active session; passive wake-word spotting only.
    #[default]
    Idle,
    /// Session active, waiting for speech.
    Listening,
    /// Microphone capture in progress.
    Recording,
    /// Transcription or recognition in flight.
    Processing,
    /// Actuator dispatching recognized intents.
    Executing,
    /// Recovering from an error; auto-transitions after a cooldown.
    Error,
}

/// Commands delivered to the running core by the host and its collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Record button pressed.
    RecordPressed,
    /// Stop button pressed.
    StopPressed,
    /// Passive spotter heard a wake word.
    WakeWordDetected(String),
    /// The capture layer detected end-of-utterance; process it.
    UtteranceEnded,
    /// Shut the core down.
    Shutdown,
}

/// The session core. Construct with [`SessionCore::new`], then drive it
/// with [`run`](Self::run) on a command channel.
pub struct SessionCore {
    state: SessionState,
    session_active: bool,
    config: VoiceControlConfig,
    capturer: Box<dyn AudioCapturer>,
    transcriber: Box<dyn TranscriptionDriver>,
    wakeword: Box<dyn WakeWordDetector>,
    ui: Box<dyn UiHandler>,
    recognizer: IntentRecognizer,
    actuator: Actuator,
    surface: Arc<Mutex<ControlSurface>>,
    bus: EventBus,
    /// Cancelled when the session stops; in-flight cycle stages race it.
    cancel: CancellationToken,
    /// Deadline for leaving the `Error` state, when set.
    recover_at: Option<Instant>,
}

impl SessionCore {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: VoiceControlConfig,
        capturer: Box<dyn AudioCapturer>,
        transcriber: Box<dyn TranscriptionDriver>,
        mut wakeword: Box<dyn WakeWordDetector>,
        mut ui: Box<dyn UiHandler>,
        recognizer: IntentRecognizer,
        actuator: Actuator,
        surface: Arc<Mutex<ControlSurface>>,
        bus: EventBus,
    ) -> Self {
        wakeword.init(&config.session.wake_words, &config.session.stop_words);
        wakeword.start();
        ui.init(&config.ui);
        ui.update_from_state(SessionState::Idle);
        Self {
            state: SessionState::Idle,
            session_active: false,
            config,
            capturer,
            transcriber,
            wakeword,
            ui,
            recognizer,
            actuator,
            surface,
            bus,
            cancel: CancellationToken::new(),
            recover_at: None,
        }
    }

    /// Current state, for embedders polling instead of subscribing.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session_active
    }

    /// Token the host can cancel to stop the session out-of-band
    /// (equivalent to a stop press racing an in-flight cycle).
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Drive the core until the channel closes or `Shutdown` arrives.
    ///
    /// `StopPressed` and `Shutdown` preempt an in-flight utterance cycle;
    /// every other command received mid-cycle is dropped (a session is
    /// already active, so starting another would be a no-op anyway).
    pub async fn run(mut self, mut commands: mpsc::Receiver<SessionCommand>) {
        loop {
            let recover_at = self.recover_at;
            let recovery = async move {
                match recover_at {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };
            tokio::select! {
                command = commands.recv() => match command {
                    Some(SessionCommand::RecordPressed) => {
                        self.bus.publish(SessionEvent::RecordPressed);
                        self.start_session().await;
                    }
                    Some(SessionCommand::WakeWordDetected(word)) => {
                        self.bus.publish(SessionEvent::WakeWordDetected { word });
                        self.start_session().await;
                    }
                    Some(SessionCommand::StopPressed) => {
                        self.bus.publish(SessionEvent::StopPressed);
                        self.stop_session();
                    }
                    Some(SessionCommand::UtteranceEnded) => {
                        // Biased so a finished cycle wins the race before a
                        // queued follow-up command is consumed here.
                        let preempted = tokio::select! {
                            biased;
                            () = self.run_cycle() => None,
                            cmd = Self::next_preempting(&mut commands) => Some(cmd),
                        };
                        match preempted {
                            Some(Some(SessionCommand::StopPressed)) => {
                                self.bus.publish(SessionEvent::StopPressed);
                                self.stop_session();
                            }
                            Some(_) => {
                                // Shutdown, or the channel closed.
                                self.stop_session();
                                break;
                            }
                            None => {}
                        }
                    }
                    Some(SessionCommand::Shutdown) | None => {
                        self.stop_session();
                        break;
                    }
                },
                () = recovery => self.finish_error_recovery().await,
            }
        }
    }

    /// Wait for a command that should preempt an in-flight cycle. A closed
    /// channel counts (the core must wind down).
    async fn next_preempting(
        commands: &mut mpsc::Receiver<SessionCommand>,
    ) -> Option<SessionCommand> {
        loop {
            match commands.recv().await {
                Some(SessionCommand::StopPressed) => return Some(SessionCommand::StopPressed),
                Some(SessionCommand::Shutdown) => return Some(SessionCommand::Shutdown),
                None => return None,
                Some(other) => warn!(?other, "command ignored during utterance cycle"),
            }
        }
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            info!(?state, "session state");
            self.state = state;
            self.ui.update_from_state(state);
            self.bus.publish(SessionEvent::StateChanged { state });
        }
    }

    /// Record press or wake word: suspend passive spotting, open the
    /// microphone, start listening.
    async fn start_session(&mut self) {
        if self.session_active {
            return;
        }
        self.session_active = true;
        self.cancel = CancellationToken::new();
        self.recover_at = None;
        self.wakeword.stop();
        self.begin_capture().await;
    }

    /// Open the microphone and move `Listening` → `Recording`, entering
    /// `Error` when the host denies access.
    async fn begin_capture(&mut self) {
        self.set_state(SessionState::Listening);
        match self.capturer.start_recording().await {
            Ok(()) => {
                self.bus.publish(SessionEvent::CaptureStarted);
                self.set_state(SessionState::Recording);
            }
            Err(e) => self.enter_error(VoxError::MicrophoneAccess(e.to_string())),
        }
    }

    /// Stop press, stop word, or shutdown: release the microphone, resume
    /// passive spotting, supersede any in-flight cycle.
    fn stop_session(&mut self) {
        self.cancel.cancel();
        self.capturer.release();
        if self.session_active {
            self.session_active = false;
            self.wakeword.start();
        }
        self.recover_at = None;
        self.set_state(SessionState::Idle);
    }

    /// One utterance cycle: capture → transcribe → recognize → actuate.
    /// Transcription strictly precedes recognition, which strictly precedes
    /// actuation; a cancelled session abandons the cycle between stages.
    async fn run_cycle(&mut self) {
        if !self.session_active {
            // Stale end-of-utterance from a stopped session.
            warn!("ignoring utterance from inactive session");
            return;
        }
        let cycle = Uuid::new_v4();
        let token = self.cancel.clone();
        info!(%cycle, "utterance cycle started");

        let clip = tokio::select! {
            result = self.capturer.stop_recording() => match result {
                Ok(clip) => clip,
                Err(e) => {
                    self.enter_error(VoxError::MicrophoneAccess(e.to_string()));
                    return;
                }
            },
            () = token.cancelled() => return,
        };
        self.bus.publish(SessionEvent::CaptureStopped);
        self.set_state(SessionState::Processing);

        let text = tokio::select! {
            result = self.transcriber.transcribe(&clip) => match result {
                Ok(text) => text,
                Err(e) => {
                    self.enter_error(VoxError::Transcription(e.to_string()));
                    return;
                }
            },
            () = token.cancelled() => return,
        };
        self.ui.set_transcription(&text);
        self.bus
            .publish(SessionEvent::TranscriptionReady { text: text.clone() });

        // The stop word may arrive as ordinary utterance content.
        if self.wakeword.check_for_stop_word(&text) {
            info!(%cycle, "stop word in transcript");
            self.stop_session();
            return;
        }

        let intents = tokio::select! {
            intents = self.recognizer.recognize(&text) => intents,
            () = token.cancelled() => return,
        };
        self.bus.publish(SessionEvent::RecognitionCompleted {
            intents: intents.clone(),
        });
        self.set_state(SessionState::Executing);

        let all_succeeded = {
            let mut surface = self.surface.lock().await;
            tokio::select! {
                ok = self.actuator.perform_actions(&mut surface, &intents) => ok,
                () = token.cancelled() => return,
            }
        };
        info!(%cycle, all_succeeded, "utterance cycle finished");

        // A stop word handled inside the cycle already set the final state.
        if self.session_active {
            self.begin_capture().await;
        }
    }

    /// Enter `Error`: release the microphone, surface a generic message,
    /// log the raw error, and schedule auto-recovery.
    fn enter_error(&mut self, err: VoxError) {
        error!("session error: {err}");
        self.capturer.release();
        self.set_state(SessionState::Error);
        self.bus.publish(SessionEvent::ErrorOccurred {
            message: err.user_message().to_owned(),
        });
        self.recover_at = Some(
            Instant::now() + std::time::Duration::from_millis(self.config.session.error_cooldown_ms),
        );
    }

    /// Leave `Error` once the cooldown elapses. An active session re-opens
    /// the microphone and resumes capture without another record press; a
    /// repeated denial re-enters `Error` and schedules another attempt.
    async fn finish_error_recovery(&mut self) {
        self.recover_at = None;
        if self.session_active {
            self.begin_capture().await;
        } else {
            self.set_state(SessionState::Idle);
        }
    }
}
