//! Session errors

use thiserror::Error;

use crate::application::ports::{LibraryError, PlaybackError, RecordingError};

/// Errors reported by the session controller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Audio focus denied by another application")]
    FocusDenied,

    #[error("Audio hardware unavailable: {0}")]
    HardwareUnavailable(String),

    #[error("Not recording")]
    NotRecording,

    #[error("Not playing")]
    NotPlaying,

    #[error("File error: {0}")]
    FileIo(String),

    #[error("Microphone permission denied")]
    PermissionDenied,

    #[error("No recordings to play")]
    NoRecordings,

    #[error("Session controller is not running")]
    ControllerClosed,
}

impl From<RecordingError> for SessionError {
    fn from(err: RecordingError) -> Self {
        match err {
            RecordingError::NotRecording => Self::NotRecording,
            RecordingError::NoAudioDevice
            | RecordingError::StartFailed(_)
            | RecordingError::NoAudioCaptured => Self::HardwareUnavailable(err.to_string()),
            RecordingError::EncodingFailed(_) | RecordingError::WriteFailed(_) => {
                Self::FileIo(err.to_string())
            }
        }
    }
}

impl From<PlaybackError> for SessionError {
    fn from(err: PlaybackError) -> Self {
        match err {
            PlaybackError::NotPlaying => Self::NotPlaying,
            PlaybackError::OpenFailed(_) | PlaybackError::DecodeFailed(_) => {
                Self::FileIo(err.to_string())
            }
            PlaybackError::OutputUnavailable(_) | PlaybackError::EngineGone => {
                Self::HardwareUnavailable(err.to_string())
            }
        }
    }
}

impl From<LibraryError> for SessionError {
    fn from(err: LibraryError) -> Self {
        Self::FileIo(err.to_string())
    }
}
