//! Voxact: voice command recognition and on-screen control actuation.
//!
//! Spoken utterances are transcribed by an external STT collaborator,
//! classified into a closed set of structured commands, and translated into
//! direct manipulation of the host view's controls.
//!
//! # Architecture
//!
//! The pipeline is built from independent stages wired through an injected
//! event bus:
//! - **Session core**: state machine over idle/listening/recording/
//!   processing/executing, driving the collaborators
//! - **Intent recognition**: weighted fuzzy pattern matching over a command
//!   registry, with a remote LLM fallback for free-form utterances
//! - **Element resolution**: multi-factor fuzzy scoring of spoken names
//!   against the declared voice-names on the control surface
//! - **Value normalization**: spoken emails, dates, times, and numbers into
//!   control-appropriate literals
//! - **Actuation**: a per-intent executor table dispatched strictly
//!   sequentially with a settle delay between actions

pub mod actuate;
pub mod config;
pub mod drivers;
pub mod error;
pub mod events;
pub mod intent;
pub mod session;
pub mod similarity;
pub mod surface;

pub use actuate::{Actuator, ProcessedEntities};
pub use config::VoiceControlConfig;
pub use error::{Result, VoxError};
pub use events::{EventBus, SessionEvent};
pub use intent::{CommandRegistry, CommandTemplate, IntentRecognizer, IntentResult, build_recognizer};
pub use session::{SessionCommand, SessionCore, SessionState};
pub use surface::{Control, ControlKind, ControlSurface, ElementResolver};
