//! Error types for the voxact pipeline.

/// Top-level error type for the voice-control system.
#[derive(Debug, thiserror::Error)]
pub enum VoxError {
    /// Microphone acquisition or capture error.
    #[error("microphone error: {0}")]
    MicrophoneAccess(String),

    /// Speech-to-text transcription error.
    #[error("transcription error: {0}")]
    Transcription(String),

    /// Remote classification transport error.
    #[error("network error: {0}")]
    Network(String),

    /// Intent recognition error.
    #[error("recognition error: {0}")]
    Recognition(String),

    /// Control resolution or action execution error.
    #[error("actuation error: {0}")]
    Actuation(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Channel send/receive error.
    #[error("channel error: {0}")]
    Channel(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything that does not fit the kinds above.
    #[error("error: {0}")]
    Unknown(String),
}

impl VoxError {
    /// A short user-presentable message for this error kind.
    ///
    /// Raw provider/system error text stays in the logs; the UI only ever
    /// sees one of these generic messages.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MicrophoneAccess(_) => "Could not access the microphone",
            Self::Transcription(_) => "Could not understand the audio",
            Self::Network(_) => "A network request failed",
            Self::Recognition(_) => "Could not interpret the command",
            Self::Actuation(_) => "Could not perform the action",
            Self::Config(_) => "The voice control configuration is invalid",
            Self::Channel(_) | Self::Io(_) | Self::Unknown(_) => "Something went wrong",
        }
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, VoxError>;
